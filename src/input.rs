//! Input polling collaborator and the input-disable registry.

use std::collections::HashSet;

/// Buttons and keys the sculpting session polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditorButton {
    /// Raise / flatten / smooth
    Primary,
    /// Lower (raise tool only)
    Secondary,
    ShrinkRadius,
    GrowRadius,
}

impl EditorButton {
    const COUNT: usize = 4;

    pub const ALL: [EditorButton; 4] = [
        EditorButton::Primary,
        EditorButton::Secondary,
        EditorButton::ShrinkRadius,
        EditorButton::GrowRadius,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(EditorButton::Primary),
            1 => Some(EditorButton::Secondary),
            2 => Some(EditorButton::ShrinkRadius),
            3 => Some(EditorButton::GrowRadius),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        self.slot() as i32
    }

    fn slot(self) -> usize {
        match self {
            EditorButton::Primary => 0,
            EditorButton::Secondary => 1,
            EditorButton::ShrinkRadius => 2,
            EditorButton::GrowRadius => 3,
        }
    }
}

/// "Is it down" / "was it just released" queries for the current frame.
pub trait InputSource {
    fn is_down(&self, button: EditorButton) -> bool;
    fn was_released(&self, button: EditorButton) -> bool;
}

/// Button state gathered from input events between two frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    down: [bool; EditorButton::COUNT],
    released: [bool; EditorButton::COUNT],
}

impl FrameInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: EditorButton) {
        self.down[button.slot()] = true;
    }

    pub fn release(&mut self, button: EditorButton) {
        let slot = button.slot();
        if self.down[slot] {
            self.released[slot] = true;
        }
        self.down[slot] = false;
    }

    /// Forget release edges once a frame has consumed them.
    pub fn end_frame(&mut self) {
        self.released = [false; EditorButton::COUNT];
    }

    /// Builder used by tests and scripted strokes.
    pub fn with_down(mut self, button: EditorButton) -> Self {
        self.press(button);
        self
    }
}

impl InputSource for FrameInput {
    fn is_down(&self, button: EditorButton) -> bool {
        self.down[button.slot()]
    }

    fn was_released(&self, button: EditorButton) -> bool {
        self.released[button.slot()]
    }
}

/// Reasons the brush must ignore input for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputDisable {
    /// Pointer is over editor UI
    Ui,
    /// A transform gizmo is being dragged
    Gizmo,
}

impl InputDisable {
    pub fn index(self) -> i32 {
        match self {
            InputDisable::Ui => 0,
            InputDisable::Gizmo => 1,
        }
    }

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(InputDisable::Ui),
            1 => Some(InputDisable::Gizmo),
            _ => None,
        }
    }
}

/// Active input-disable reasons; re-checked every frame.
#[derive(Clone, Debug, Default)]
pub struct InputDisableSet {
    active: HashSet<InputDisable>,
}

impl InputDisableSet {
    pub fn add(&mut self, reason: InputDisable) {
        if self.active.insert(reason) {
            log::debug!("input disabled: {reason:?}");
        }
    }

    pub fn remove(&mut self, reason: InputDisable) {
        if self.active.remove(&reason) {
            log::debug!("input re-enabled: {reason:?}");
        }
    }

    pub fn contains(&self, reason: InputDisable) -> bool {
        self.active.contains(&reason)
    }

    /// True while any reason is active.
    pub fn is_disabled(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_edges() {
        let mut input = FrameInput::new();
        input.press(EditorButton::Primary);
        assert!(input.is_down(EditorButton::Primary));
        assert!(!input.was_released(EditorButton::Primary));

        input.release(EditorButton::Primary);
        assert!(!input.is_down(EditorButton::Primary));
        assert!(input.was_released(EditorButton::Primary));

        input.end_frame();
        assert!(!input.was_released(EditorButton::Primary));
    }

    #[test]
    fn test_release_without_press_is_not_an_edge() {
        let mut input = FrameInput::new();
        input.release(EditorButton::Secondary);
        assert!(!input.was_released(EditorButton::Secondary));
    }

    #[test]
    fn test_buttons_are_independent() {
        let input = FrameInput::new().with_down(EditorButton::GrowRadius);
        assert!(input.is_down(EditorButton::GrowRadius));
        assert!(!input.is_down(EditorButton::ShrinkRadius));
        assert!(!input.is_down(EditorButton::Primary));
    }

    #[test]
    fn test_disable_set() {
        let mut set = InputDisableSet::default();
        assert!(!set.is_disabled());

        set.add(InputDisable::Ui);
        set.add(InputDisable::Gizmo);
        assert!(set.is_disabled());

        set.remove(InputDisable::Ui);
        assert!(set.is_disabled());
        assert!(set.contains(InputDisable::Gizmo));

        set.remove(InputDisable::Gizmo);
        assert!(!set.is_disabled());
    }

    #[test]
    fn test_button_from_index() {
        assert_eq!(EditorButton::from_index(0), Some(EditorButton::Primary));
        assert_eq!(EditorButton::from_index(3), Some(EditorButton::GrowRadius));
        assert_eq!(EditorButton::from_index(4), None);
        assert_eq!(EditorButton::from_index(-1), None);
        for button in EditorButton::ALL {
            assert_eq!(EditorButton::from_index(button.index()), Some(button));
        }
    }

    #[test]
    fn test_disable_from_index() {
        assert_eq!(InputDisable::from_index(0), Some(InputDisable::Ui));
        assert_eq!(InputDisable::from_index(1), Some(InputDisable::Gizmo));
        assert_eq!(InputDisable::from_index(7), None);
    }
}
