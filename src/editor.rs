//! Per-frame sculpting session: cursor picking, radius keys, tool dispatch
//! and the neighborhood flush.

use crate::brush::{Brush, BrushTool, GestureState};
use crate::config::BrushConfig;
use crate::input::{EditorButton, InputDisable, InputDisableSet, InputSource};
use crate::ray::Ray;
use crate::sampler::sample_brush;
use crate::tile::{HeightTile, TileCoord};
use crate::tile_map::{CursorHit, TileMap, TileNeighborhood};
use crate::tools::{apply_tool, ToolInput};

/// What one `Sculptor::update` did. Lets a history collaborator snapshot the
/// written tiles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub hit: Option<CursorHit>,
    pub tool: BrushTool,
    /// Brush samples across all tiles
    pub samples: usize,
    /// Tiles whose heights changed
    pub written: Vec<TileCoord>,
    /// Tiles flushed at the end of the frame
    pub flushed: Vec<TileCoord>,
    pub gesture_began: bool,
    pub gesture_ended: bool,
}

/// Brush, gesture and input-disable state of one editing session.
pub struct Sculptor {
    brush: Brush,
    gesture: GestureState,
    disabled: InputDisableSet,
    config: BrushConfig,
    neighborhood: TileNeighborhood,
    hit: Option<CursorHit>,
    max_radius: Option<f32>,
}

impl Default for Sculptor {
    fn default() -> Self {
        Self::new(BrushConfig::default())
    }
}

impl Sculptor {
    pub fn new(config: BrushConfig) -> Self {
        Self {
            brush: Brush::from_config(&config),
            gesture: GestureState::default(),
            disabled: InputDisableSet::default(),
            config,
            neighborhood: TileNeighborhood::default(),
            hit: None,
            max_radius: None,
        }
    }

    pub fn tool(&self) -> BrushTool {
        self.brush.tool
    }

    pub fn set_tool(&mut self, tool: BrushTool) {
        if self.brush.tool != tool {
            log::debug!("brush tool: {} -> {}", self.brush.tool.name(), tool.name());
            self.brush.tool = tool;
            self.gesture.release();
        }
    }

    pub fn radius(&self) -> f32 {
        self.brush.radius
    }

    /// Not validated below: a zero or negative radius samples nothing.
    /// Clamped to the radius limit, if any.
    pub fn set_radius(&mut self, radius: f32) {
        self.brush.radius = self.limit_radius(radius);
    }

    pub fn max_radius(&self) -> Option<f32> {
        self.max_radius
    }

    /// Cap the radius, usually at the tile extent so the brush never
    /// reaches past the neighborhood.
    pub fn set_max_radius(&mut self, max_radius: Option<f32>) {
        self.max_radius = max_radius;
        self.brush.radius = self.limit_radius(self.brush.radius);
    }

    fn limit_radius(&self, radius: f32) -> f32 {
        match self.max_radius {
            Some(max) => radius.min(max),
            None => radius,
        }
    }

    pub fn strength(&self) -> f32 {
        self.brush.strength
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.brush.strength = strength;
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn add_input_disable(&mut self, reason: InputDisable) {
        self.disabled.add(reason);
    }

    pub fn remove_input_disable(&mut self, reason: InputDisable) {
        self.disabled.remove(reason);
    }

    pub fn input_disabled(&self) -> bool {
        self.disabled.is_disabled()
    }

    /// World position of the last cursor hit.
    pub fn cursor(&self) -> [f32; 3] {
        self.brush.cursor
    }

    /// Last hit, `None` when the most recent ray missed every tile.
    pub fn hit(&self) -> Option<CursorHit> {
        self.hit
    }

    pub fn neighborhood(&self) -> &TileNeighborhood {
        &self.neighborhood
    }

    pub fn flatten_reference(&self) -> Option<f32> {
        self.gesture.flatten_reference()
    }

    /// Pick the tile under `ray`, refresh the neighborhood and cursor, and
    /// apply the radius keys. Returns `None` when nothing was hit.
    pub fn update_cursor<T: HeightTile, I: InputSource>(
        &mut self,
        map: &TileMap<T>,
        ray: &Ray,
        input: &I,
        dt: f32,
    ) -> Option<CursorHit> {
        let Some(hit) = map.pick(ray) else {
            self.hit = None;
            self.neighborhood = TileNeighborhood::default();
            return None;
        };

        self.hit = Some(hit);
        self.neighborhood = map.neighborhood(hit.tile);
        self.brush.cursor = hit.point;

        if !self.disabled.is_disabled() {
            self.brush.adjust_radius(
                input.is_down(EditorButton::ShrinkRadius),
                input.is_down(EditorButton::GrowRadius),
                dt,
                self.config.radius_rate,
                self.config.min_radius,
            );
            self.brush.radius = self.limit_radius(self.brush.radius);
        }
        Some(hit)
    }

    /// Sample the brush, run the active tool and flush the neighborhood.
    /// Does nothing while input is disabled.
    pub fn update_tools<T: HeightTile, I: InputSource>(
        &mut self,
        map: &mut TileMap<T>,
        input: &I,
        dt: f32,
        report: &mut FrameReport,
    ) {
        if self.disabled.is_disabled() || self.hit.is_none() {
            return;
        }

        let batch = sample_brush(map, &self.neighborhood, self.brush.center(), self.brush.radius);
        let tool_input = ToolInput {
            dt,
            strength: self.brush.strength,
            primary: input.is_down(EditorButton::Primary),
            secondary: input.is_down(EditorButton::Secondary),
        };
        let outcome = apply_tool(
            self.brush.tool,
            map,
            &self.neighborhood,
            &batch,
            &mut self.gesture,
            tool_input,
        );

        map.flush(&self.neighborhood.tiles);

        report.samples = batch.sample_count();
        report.written = outcome.written;
        report.flushed = self.neighborhood.tiles.clone();
        report.gesture_began = outcome.gesture_began;
    }

    /// One editor frame.
    pub fn update<T: HeightTile, I: InputSource>(
        &mut self,
        map: &mut TileMap<T>,
        ray: &Ray,
        input: &I,
        dt: f32,
    ) -> FrameReport {
        let mut report = FrameReport {
            tool: self.brush.tool,
            ..Default::default()
        };

        report.hit = self.update_cursor(map, ray, input, dt);
        if report.hit.is_some() {
            self.update_tools(map, input, dt, &mut report);
        }

        self.end_press(input, &mut report);
        report
    }

    /// Frame without a cursor ray, e.g. pointer outside the viewport.
    pub fn idle<I: InputSource>(&mut self, input: &I) -> FrameReport {
        self.hit = None;
        self.neighborhood = TileNeighborhood::default();

        let mut report = FrameReport {
            tool: self.brush.tool,
            ..Default::default()
        };
        self.end_press(input, &mut report);
        report
    }

    fn end_press<I: InputSource>(&mut self, input: &I, report: &mut FrameReport) {
        if input.was_released(EditorButton::Primary) && self.gesture.release() {
            log::debug!("flatten gesture released");
            report.gesture_ended = true;
        }
    }
}
