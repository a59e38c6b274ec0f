use godot::prelude::*;

pub mod brush;
pub mod config;
pub mod debug_log;
pub mod editor;
mod editor_plugin;
pub mod error;
pub mod input;
mod mesh_builder;
pub mod noise_field;
pub mod ray;
pub mod sampler;
pub mod seam;
mod terrain;
pub mod tile;
pub mod tile_map;
pub mod tools;

struct TileSculptExtension;

#[gdextension]
unsafe impl ExtensionLibrary for TileSculptExtension {}
