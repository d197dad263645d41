//=========================================================================
// State Tracker
//=========================================================================
//
// Held-state tracking with per-update deltas.
//
// Architecture:
//   InputEvent → process_events() → HashSet (keys/buttons held) → query
//
// Update lifecycle: clear() → process_events() → query
//
// One "update" is one simulation step, not one rendered frame: a frame
// that runs three steps clears the deltas three times, so a key press is
// observed by exactly one step.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

//=== Internal Dependencies ===============================================

use super::event::{InputEvent, KeyCode, MouseButton};

//=== StateTracker ========================================================

/// Tracks persistent state (keys held) and per-update deltas (keys pressed,
/// pointer motion).
pub struct StateTracker {
    //--- Persistent State (survives update boundary) ---------------------
    keys_down: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,

    //--- Update Deltas (reset via clear()) -------------------------------
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    mouse_motion: (f32, f32),
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            keys_down: HashSet::new(),
            mouse_buttons_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            keys_released: HashSet::new(),
            mouse_motion: (0.0, 0.0),
        }
    }

    //--- Update Processing ------------------------------------------------

    /// Clears per-update deltas.
    pub(super) fn clear(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_motion = (0.0, 0.0);
    }

    pub(super) fn process_events(&mut self, events: &[InputEvent]) {
        for event in events {
            self.process_event(event);
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn process_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown { key } => {
                // Key repeat re-sends KeyDown; only the first counts as a press
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }

            InputEvent::KeyUp { key } => {
                if self.keys_down.remove(&key) {
                    self.keys_released.insert(key);
                }
            }

            InputEvent::MouseButtonDown { button } => {
                self.mouse_buttons_down.insert(button);
            }

            InputEvent::MouseButtonUp { button } => {
                self.mouse_buttons_down.remove(&button);
            }

            InputEvent::MouseMotion { dx, dy } => {
                self.mouse_motion.0 += dx;
                self.mouse_motion.1 += dy;
            }

            InputEvent::FocusLost => {
                self.keys_released.extend(self.keys_down.drain());
                self.mouse_buttons_down.clear();
            }
        }
    }

    //=====================================================================
    // Query API - Keyboard
    //=====================================================================

    /// Returns `true` if key transitioned UP → DOWN during this update.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns `true` while key is held.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns `true` if key transitioned DOWN → UP during this update.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// `1.0` if only `positive` is held, `-1.0` if only `negative`, else `0.0`.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        match (self.is_key_down(negative), self.is_key_down(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    //=====================================================================
    // Query API - Mouse
    //=====================================================================

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Relative pointer motion accumulated during this update.
    pub fn mouse_motion(&self) -> (f32, f32) {
        self.mouse_motion
    }
}

//--- Trait Implementations -----------------------------------------------

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
