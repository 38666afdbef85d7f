#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Left,
    Right,
    Down,
    Jump,
    Shoot,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Left => 0,
            InputAction::Right => 1,
            InputAction::Down => 2,
            InputAction::Jump => 3,
            InputAction::Shoot => 4,
        }
    }
}

/// Immutable per-tick view of the input device state. The previous tick's
/// action states ride along so scenes can do edge detection (`pressed`)
/// without holding their own history.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    previous_actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.actions.is_down(action) && !self.previous_actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_previous_action_down(mut self, action: InputAction, was_down: bool) -> Self {
        self.previous_actions.set(action, was_down);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    /// Builds the snapshot for the next tick: current states become the
    /// previous states and the fresh states take their place.
    pub fn advanced_with(self, next_actions_down: &[InputAction]) -> Self {
        let mut next = Self {
            quit_requested: self.quit_requested,
            actions: ActionStates::default(),
            previous_actions: self.actions,
        };
        for action in next_actions_down {
            next.actions.set(*action, true);
        }
        next
    }
}
