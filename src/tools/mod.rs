//! Tool strategies. Each consumes a finished `SampleBatch` and writes heights;
//! nothing here samples.

mod flatten;
mod raise;
mod smooth;

pub use flatten::apply_flatten;
pub use raise::apply_raise;
pub use smooth::apply_smooth;

use crate::brush::{BrushTool, GestureState};
use crate::sampler::SampleBatch;
use crate::tile::{HeightTile, TileCoord, TileIndex};
use crate::tile_map::{TileMap, TileNeighborhood};

/// Per-frame parameters handed to a tool.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ToolInput {
    pub dt: f32,
    pub strength: f32,
    pub primary: bool,
    pub secondary: bool,
}

/// What a tool pass changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolOutcome {
    /// Tiles that received at least one height write, in write order
    pub written: Vec<TileCoord>,
    /// A flatten gesture locked its reference this frame
    pub gesture_began: bool,
}

/// Collects written tiles and absorbs rejected writes.
#[derive(Debug, Default)]
pub(crate) struct HeightWriter {
    written: Vec<TileCoord>,
    rejected: usize,
}

impl HeightWriter {
    pub(crate) fn write<T: HeightTile>(
        &mut self,
        map: &mut TileMap<T>,
        coord: TileCoord,
        index: TileIndex,
        value: f32,
    ) {
        let Some(tile) = map.get_mut(coord) else {
            return;
        };
        match tile.set_height(index, value) {
            Ok(()) => {
                if !self.written.contains(&coord) {
                    self.written.push(coord);
                }
            }
            Err(e) => {
                self.rejected += 1;
                log::warn!("height write skipped: {e}");
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<TileCoord> {
        if self.rejected > 0 {
            log::debug!("{} height writes rejected this pass", self.rejected);
        }
        self.written
    }
}

/// Run the active tool over `batch`.
pub fn apply_tool<T: HeightTile>(
    tool: BrushTool,
    map: &mut TileMap<T>,
    neighborhood: &TileNeighborhood,
    batch: &SampleBatch,
    gesture: &mut GestureState,
    input: ToolInput,
) -> ToolOutcome {
    match tool {
        BrushTool::Raise => ToolOutcome {
            written: apply_raise(map, batch, input),
            gesture_began: false,
        },
        BrushTool::Flatten => {
            if !input.primary {
                return ToolOutcome::default();
            }
            let (written, gesture_began) = apply_flatten(map, batch, gesture);
            ToolOutcome {
                written,
                gesture_began,
            }
        }
        BrushTool::Smooth => {
            if !input.primary {
                return ToolOutcome::default();
            }
            ToolOutcome {
                written: apply_smooth(map, neighborhood, batch),
                gesture_began: false,
            }
        }
        BrushTool::Ramp => {
            log::trace!("ramp tool has no behavior");
            ToolOutcome::default()
        }
    }
}
