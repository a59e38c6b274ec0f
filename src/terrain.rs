use std::collections::HashMap;
use std::path::Path;

use godot::classes::{Engine, INode3D, Material, MeshInstance3D, Node3D, ProjectSettings};
use godot::prelude::*;

use crate::brush::BrushTool;
use crate::config::{BrushConfig, NoiseConfig, SculptConfig, TileLayoutConfig};
use crate::debug_log;
use crate::editor::{FrameReport, Sculptor};
use crate::input::{EditorButton, FrameInput, InputDisable};
use crate::mesh_builder;
use crate::ray::Ray;
use crate::tile::{HeightTile, TerrainTile, TileCoord, TileIndex};
use crate::tile_map::TileMap;

/// Multi-tile heightmap terrain that can be sculpted in the editor.
/// Input arrives from `SculptTerrainPlugin`; every frame runs one brush pass.
#[derive(GodotClass)]
#[class(base=Node3D, init, tool)]
pub struct SculptTerrain {
    base: Base<Node3D>,

    // ═══════════════════════════════════════════
    // Tile Layout
    // ═══════════════════════════════════════════
    /// Tiles along world X
    #[export]
    #[init(val = 2)]
    columns: i32,

    /// Tiles along world Z
    #[export]
    #[init(val = 2)]
    rows: i32,

    /// Height samples per tile side
    #[export]
    #[init(val = 33)]
    tile_samples: i32,

    /// World distance between samples
    #[export]
    #[init(val = 1.0)]
    spacing: f32,

    /// Adjacent tiles repeat their border samples
    #[export]
    #[init(val = true)]
    shared_edges: bool,

    // ═══════════════════════════════════════════
    // Initial Heights
    // ═══════════════════════════════════════════
    #[export]
    #[init(val = 0)]
    noise_seed: i32,

    /// Zero keeps the tiles flat
    #[export]
    #[init(val = 0.0)]
    noise_amplitude: f32,

    #[export]
    #[init(val = 0.02)]
    noise_frequency: f32,

    // ═══════════════════════════════════════════
    // Brush
    // ═══════════════════════════════════════════
    #[export]
    #[init(val = true)]
    pub brush_enabled: bool,

    /// 0 Raise, 1 Flatten, 2 Smooth, 3 Ramp
    #[export]
    #[init(val = 0)]
    pub brush_tool: i32,

    #[export]
    #[init(val = 5.0)]
    pub brush_size: f32,

    #[export]
    #[init(val = 40.0)]
    pub brush_strength: f32,

    /// Optional TOML file overriding the settings above (`res://` paths allowed)
    #[export]
    config_path: GString,

    /// Write `log` output to `debug_sculpt.log`
    #[export]
    #[init(val = false)]
    debug_logging: bool,

    tiles: TileMap<TerrainTile>,
    sculptor: Sculptor,
    input: FrameInput,
    cursor_ray: Option<Ray>,
    tile_meshes: HashMap<TileCoord, Gd<MeshInstance3D>>,
    built_revisions: HashMap<TileCoord, u64>,
    material: Option<Gd<Material>>,
}

#[godot_api]
impl INode3D for SculptTerrain {
    fn ready(&mut self) {
        if self.debug_logging {
            let result =
                debug_log::init_debug_log(debug_log::DEFAULT_LOG_PATH, log::LevelFilter::Debug);
            if let Err(e) = result {
                godot_warn!("SculptTerrain: debug log unavailable: {e}");
            }
        }
        self.load_config();
        self.regenerate();
        godot_print!(
            "SculptTerrain ready: {}x{} tiles of {} samples",
            self.columns,
            self.rows,
            self.tile_samples
        );
    }

    fn process(&mut self, delta: f64) {
        if !Engine::singleton().is_editor_hint() || !self.brush_enabled || self.tiles.is_empty() {
            self.input.end_frame();
            return;
        }

        self.sync_brush_settings();
        let report = match self.cursor_ray {
            Some(ray) => self.sculptor.update(&mut self.tiles, &ray, &self.input, delta as f32),
            None => self.sculptor.idle(&self.input),
        };
        self.input.end_frame();

        // Radius keys change the radius inside the session
        self.brush_size = self.sculptor.radius();
        self.apply_report(&report);
    }
}

#[godot_api]
impl SculptTerrain {
    /// Rebuild all tiles from the layout and noise settings
    #[func]
    pub fn regenerate(&mut self) {
        let layout = self.layout();
        let noise = self.noise();
        match TileMap::generate(&layout, noise.as_ref()) {
            Ok(tiles) => {
                self.tiles = tiles;
                self.sculptor = Sculptor::new(self.brush_config());
                self.sculptor.set_max_radius(Some(layout.max_brush_radius()));
                self.brush_size = self.sculptor.radius();
                self.clear_meshes();
                self.rebuild_all_meshes();
            }
            Err(e) => godot_error!("SculptTerrain: cannot generate tiles: {e}"),
        }
    }

    /// Camera ray under the pointer, in world space
    #[func]
    pub fn set_cursor_ray(&mut self, origin: Vector3, direction: Vector3) {
        let to_local = self.base().get_global_transform().affine_inverse();
        let origin = to_local * origin;
        let direction = to_local.basis * direction;
        self.cursor_ray = Some(Ray::new(
            [origin.x, origin.y, origin.z],
            [direction.x, direction.y, direction.z],
        ));
    }

    /// Pointer left the viewport
    #[func]
    pub fn clear_cursor_ray(&mut self) {
        self.cursor_ray = None;
    }

    /// 0 primary, 1 secondary, 2 shrink radius, 3 grow radius
    #[func]
    pub fn set_button(&mut self, button: i32, pressed: bool) {
        let Some(button) = EditorButton::from_index(button) else {
            godot_warn!("SculptTerrain: unknown button {button}");
            return;
        };
        if pressed {
            self.input.press(button);
        } else {
            self.input.release(button);
        }
    }

    /// 0 UI focus, 1 gizmo drag
    #[func]
    pub fn add_input_disable(&mut self, reason: i32) {
        if let Some(reason) = InputDisable::from_index(reason) {
            self.sculptor.add_input_disable(reason);
        }
    }

    #[func]
    pub fn remove_input_disable(&mut self, reason: i32) {
        if let Some(reason) = InputDisable::from_index(reason) {
            self.sculptor.remove_input_disable(reason);
        }
    }

    #[func]
    pub fn is_input_disabled(&self) -> bool {
        self.sculptor.input_disabled()
    }

    #[func]
    pub fn is_flattening(&self) -> bool {
        self.sculptor.flatten_reference().is_some()
    }

    #[func]
    pub fn get_brush_cursor(&self) -> Vector3 {
        let [x, y, z] = self.sculptor.cursor();
        Vector3::new(x, y, z)
    }

    #[func]
    pub fn has_cursor_hit(&self) -> bool {
        self.sculptor.hit().is_some()
    }

    /// Height of sample `index` in tile `tile`, 0 when either is missing
    #[func]
    pub fn get_height(&self, tile: Vector2i, index: Vector2i) -> f32 {
        if index.x < 0 || index.y < 0 {
            return 0.0;
        }
        self.tiles
            .get(TileCoord::new(tile.x, tile.y))
            .and_then(|t| t.height_at(TileIndex::new(index.x as usize, index.y as usize)))
            .unwrap_or(0.0)
    }

    /// Largest brush radius that stays inside the tile neighborhood
    #[func]
    pub fn get_max_brush_size(&self) -> f32 {
        self.layout().max_brush_radius()
    }

    #[func]
    pub fn get_tile_count(&self) -> i32 {
        self.tiles.len() as i32
    }
}

impl SculptTerrain {
    fn layout(&self) -> TileLayoutConfig {
        TileLayoutConfig {
            columns: self.columns.max(0) as u32,
            rows: self.rows.max(0) as u32,
            width: self.tile_samples.max(0) as usize,
            height: self.tile_samples.max(0) as usize,
            spacing: self.spacing,
            shared_edges: self.shared_edges,
        }
    }

    fn noise(&self) -> Option<NoiseConfig> {
        (self.noise_amplitude != 0.0).then(|| NoiseConfig {
            seed: self.noise_seed as u32,
            frequency: self.noise_frequency,
            amplitude: self.noise_amplitude,
            ..Default::default()
        })
    }

    fn brush_config(&self) -> BrushConfig {
        BrushConfig {
            tool: BrushTool::from_index(self.brush_tool).unwrap_or_default(),
            radius: self.brush_size,
            strength: self.brush_strength,
            ..Default::default()
        }
    }

    /// Overlay the TOML config, if any, onto the exported properties.
    fn load_config(&mut self) {
        if self.config_path.is_empty() {
            return;
        }
        let path = ProjectSettings::singleton()
            .globalize_path(&self.config_path)
            .to_string();

        match SculptConfig::load(Path::new(&path)) {
            Ok(config) => self.apply_config(&config),
            Err(e) => godot_warn!("SculptTerrain: ignoring config {path}: {e}"),
        }
    }

    fn apply_config(&mut self, config: &SculptConfig) {
        let tiles = &config.tiles;
        self.columns = tiles.columns as i32;
        self.rows = tiles.rows as i32;
        self.tile_samples = tiles.width as i32;
        self.spacing = tiles.spacing;
        self.shared_edges = tiles.shared_edges;
        if tiles.width != tiles.height {
            godot_warn!(
                "SculptTerrain: non-square tiles not supported, using {} samples",
                tiles.width
            );
        }

        let brush = &config.brush;
        self.brush_tool = brush.tool.index();
        self.brush_size = brush.radius;
        self.brush_strength = brush.strength;

        if let Some(ref noise) = config.noise {
            self.noise_seed = noise.seed as i32;
            self.noise_frequency = noise.frequency;
            self.noise_amplitude = noise.amplitude;
        }
    }

    /// Push inspector / plugin edits into the session.
    fn sync_brush_settings(&mut self) {
        if let Some(tool) = BrushTool::from_index(self.brush_tool) {
            self.sculptor.set_tool(tool);
        }
        self.sculptor.set_radius(self.brush_size);
        self.sculptor.set_strength(self.brush_strength);
    }

    fn apply_report(&mut self, report: &FrameReport) {
        if !report.written.is_empty() {
            log::debug!(
                "{} pass: {} samples, wrote {:?}",
                report.tool.name(),
                report.samples,
                report.written
            );
        }
        for &coord in &report.flushed {
            self.rebuild_tile_mesh(coord);
        }
    }

    fn rebuild_all_meshes(&mut self) {
        for coord in self.tiles.coords() {
            self.rebuild_tile_mesh(coord);
        }
    }

    /// Rebuild a tile's mesh if its heights changed since the last build.
    fn rebuild_tile_mesh(&mut self, coord: TileCoord) {
        let Some(tile) = self.tiles.get(coord) else {
            return;
        };
        let revision = tile.revision();
        let built = self.built_revisions.get(&coord) == Some(&revision);
        if built && self.tile_meshes.contains_key(&coord) {
            return;
        }
        let Some(mesh) = mesh_builder::build_tile_mesh(tile) else {
            return;
        };

        let material = self
            .material
            .get_or_insert_with(mesh_builder::create_default_material)
            .clone();

        let mut instance = match self.tile_meshes.get(&coord) {
            Some(instance) => instance.clone(),
            None => {
                let mut instance = MeshInstance3D::new_alloc();
                instance.set_name(&format!("Tile_{}_{}", coord.x, coord.y));
                self.base_mut().add_child(&instance);
                instance
            }
        };
        instance.set_mesh(&mesh);
        instance.set_material_override(&material);

        self.tile_meshes.insert(coord, instance);
        self.built_revisions.insert(coord, revision);
    }

    fn clear_meshes(&mut self) {
        for (_, mut instance) in self.tile_meshes.drain() {
            if instance.is_instance_valid() {
                instance.queue_free();
            }
        }
        self.built_revisions.clear();
    }
}
