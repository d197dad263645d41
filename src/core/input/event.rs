//=========================================================================
// Input Event Types
//
// Platform-independent keyboard and mouse events.
//
// Only the keys the simulation's control scheme reads are named; every
// other physical key collapses to `Unidentified` and is dropped before it
// reaches the tracker.
//
// Event Flow:
// ```text
// Platform Layer (winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    StateTracker (held / pressed / look delta)
//         ↓
//    KeyboardInput → SimInput → SimulationHandle
// ```
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    /// Held to aim.
    Right,
    Middle,
    /// Side, thumb and macro buttons.
    Other,
}

//=== KeyCode =============================================================

/// Physical key location, independent of layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Movement ---------------------------------------------------------
    KeyW,
    KeyA,
    KeyS,
    KeyD,

    //--- Look -------------------------------------------------------------
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    //--- Actions ----------------------------------------------------------
    Space,
    KeyC,
    Escape,

    //--- Menu -------------------------------------------------------------
    Enter,
    KeyR,

    /// Any key the control scheme does not read.
    Unidentified,
}

//=== InputEvent ==========================================================

/// Low-level input event from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: KeyCode },
    KeyUp { key: KeyCode },
    MouseButtonDown { button: MouseButton },
    MouseButtonUp { button: MouseButton },

    /// Raw relative pointer motion in device units. Not tied to the cursor
    /// position, so it keeps arriving while the cursor is grabbed.
    MouseMotion { dx: f32, dy: f32 },

    /// Window lost focus; release events for held keys will never arrive.
    FocusLost,
}

impl InputEvent {
    pub fn key(key: KeyCode, pressed: bool) -> Self {
        if pressed {
            Self::KeyDown { key }
        } else {
            Self::KeyUp { key }
        }
    }

    pub fn button(button: MouseButton, pressed: bool) -> Self {
        if pressed {
            Self::MouseButtonDown { button }
        } else {
            Self::MouseButtonUp { button }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
