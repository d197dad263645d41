//=========================================================================
// Simulation Input
//=========================================================================
//
// Normalized control values pushed into the simulation before each step.
//
// Architecture:
//   InputEvent ─push()─> KeyboardInput ─update()─> StateTracker
//                              │
//                              └─current()─> SimInput ─> apply_input()
//
// Control scheme:
// ```text
//   W / S          move_forward   (-1 forward, +1 back)
//   A / D          move_right     (-1 left,    +1 right)
//   ↑ / ↓          rotate_up      (+1 up,      -1 down)
//   ← / →          rotate_right   (-1 left,    +1 right)
//   mouse motion   added to rotate_* and clamped to [-1, 1]
//   Space          jump
//   C              crouch
//   right button   aim
//   Escape         pause request (on press)
// ```
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::event::{InputEvent, KeyCode, MouseButton};
use super::state_tracker::StateTracker;

//=== SimInput ============================================================

/// Every input channel the simulation reads. Continuous axes are nominally
/// in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimInput {
    pub move_forward: f32,
    pub move_right: f32,
    pub rotate_up: f32,
    pub rotate_right: f32,
    pub jump: bool,
    pub crouch: bool,
    pub aim: bool,
}

//=== InputSource =========================================================

/// Anything that can be sampled once per simulation step.
pub trait InputSource {
    /// Advances to the next sample.
    fn update(&mut self);

    /// Whether the latest sample asks to pause gameplay.
    fn pause_requested(&self) -> bool;

    /// Latest sample.
    fn current(&self) -> SimInput;
}

//=== KeyboardInput =======================================================

/// Pointer motion, in device units, that maps to a full-scale look axis.
const MOUSE_FULL_SCALE: f32 = 20.0;

/// Keyboard and mouse input source.
pub struct KeyboardInput {
    tracker: StateTracker,
    pending: Vec<InputEvent>,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self {
            tracker: StateTracker::new(),
            pending: Vec::with_capacity(32),
        }
    }

    /// Queues a platform event for the next `update()`.
    pub fn push(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }
}

impl Default for KeyboardInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for KeyboardInput {
    fn update(&mut self) {
        self.tracker.clear();
        self.tracker.process_events(&self.pending);
        self.pending.clear();
    }

    fn pause_requested(&self) -> bool {
        self.tracker.is_key_pressed(KeyCode::Escape)
    }

    fn current(&self) -> SimInput {
        let tracker = &self.tracker;
        let (dx, dy) = tracker.mouse_motion();

        SimInput {
            move_forward: tracker.axis(KeyCode::KeyW, KeyCode::KeyS),
            move_right: tracker.axis(KeyCode::KeyA, KeyCode::KeyD),
            rotate_up: (tracker.axis(KeyCode::ArrowDown, KeyCode::ArrowUp) - dy / MOUSE_FULL_SCALE).clamp(-1.0, 1.0),
            rotate_right: (tracker.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight) + dx / MOUSE_FULL_SCALE)
                .clamp(-1.0, 1.0),
            jump: tracker.is_key_down(KeyCode::Space),
            crouch: tracker.is_key_down(KeyCode::KeyC),
            aim: tracker.is_button_down(MouseButton::Right),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
