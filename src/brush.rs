//! Brush state for terrain sculpting.
//!
//! Holds the active tool, radius, strength and cursor, plus the per-press
//! gesture state that the flatten tool locks at the start of a stroke.

use serde::Deserialize;

use crate::config::BrushConfig;

/// Sculpting tool. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushTool {
    /// Primary raises, secondary lowers
    #[default]
    Raise,
    /// Pull samples to a height locked at the start of the press
    Flatten,
    /// Blend samples toward their 3x3 neighbourhood average
    Smooth,
    /// Declared only; has no behavior yet
    Ramp,
}

impl BrushTool {
    pub const ALL: [BrushTool; 4] = [
        BrushTool::Raise,
        BrushTool::Flatten,
        BrushTool::Smooth,
        BrushTool::Ramp,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> i32 {
        match self {
            BrushTool::Raise => 0,
            BrushTool::Flatten => 1,
            BrushTool::Smooth => 2,
            BrushTool::Ramp => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BrushTool::Raise => "Raise",
            BrushTool::Flatten => "Flatten",
            BrushTool::Smooth => "Smooth",
            BrushTool::Ramp => "Ramp",
        }
    }
}

/// Brush state machine
#[derive(Clone, Debug)]
pub struct Brush {
    pub tool: BrushTool,
    /// Radius in world units. Not validated; zero or negative radii sample nothing.
    pub radius: f32,
    pub strength: f32,
    /// Last cursor hit in world space
    pub cursor: [f32; 3],
}

impl Default for Brush {
    fn default() -> Self {
        Self::from_config(&BrushConfig::default())
    }
}

impl Brush {
    pub fn from_config(config: &BrushConfig) -> Self {
        Self {
            tool: config.tool,
            radius: config.radius,
            strength: config.strength,
            cursor: [0.0; 3],
        }
    }

    /// Brush center on the XZ plane.
    pub fn center(&self) -> (f32, f32) {
        (self.cursor[0], self.cursor[2])
    }

    /// Key-driven radius change: shrinking wins when both keys are held and
    /// stops at `min_radius`.
    pub fn adjust_radius(&mut self, shrink: bool, grow: bool, dt: f32, rate: f32, min_radius: f32) {
        if shrink {
            self.radius = (self.radius - dt * rate).max(min_radius);
        } else if grow {
            self.radius += dt * rate;
        }
    }
}

/// Per-press gesture state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureState {
    /// Flatten reference height; `Some` while a flatten press is active
    flatten_reference: Option<f32>,
}

impl GestureState {
    pub fn is_flattening(&self) -> bool {
        self.flatten_reference.is_some()
    }

    pub fn flatten_reference(&self) -> Option<f32> {
        self.flatten_reference
    }

    /// Reference for this frame: `average` on the first frame of a press,
    /// the locked value afterwards. Returns `(reference, began)`.
    pub fn hold_flatten(&mut self, average: f32) -> (f32, bool) {
        match self.flatten_reference {
            Some(reference) => (reference, false),
            None => {
                self.flatten_reference = Some(average);
                (average, true)
            }
        }
    }

    /// End the gesture. Returns true if one was active.
    pub fn release(&mut self) -> bool {
        self.flatten_reference.take().is_some()
    }
}

/// Falloff weight of a sample at `distance` from the brush center:
/// `1 - distance / radius`, or `None` at or below machine epsilon.
pub fn falloff(distance: f32, radius: f32) -> Option<f32> {
    let weight = 1.0 - distance / radius;
    (weight > f32::EPSILON).then_some(weight)
}

/// In-out ease applied to the raise falloff: `4t^3` below the midpoint,
/// `1 - 4(1 - t)^3` above it.
///
/// The name follows the editor's easing API; the curve is cubic, not `16t^5`.
pub fn ease_in_out_quintic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 1.0 - t;
        1.0 - 4.0 * u * u * u
    }
}
