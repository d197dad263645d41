//=========================================================================
// Input Processor
//=========================================================================
//
// Converts winit events into portable InputEvents.
//
// Architecture:
//   WindowEvent / DeviceEvent → InputProcessor → InputEvent → KeyboardInput
//
// Key repeats are dropped here; the tracker only needs transitions.
// Keys outside the control scheme map to `Unidentified` and are filtered
// (returns None). Look input comes from raw device motion rather than
// cursor positions, so it keeps working while the cursor is grabbed.
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::{
    event::ElementState,
    event::{KeyEvent, MouseButton as WinitMouseButton},
    keyboard::{KeyCode as WinitKeyCode, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::input::{InputEvent, KeyCode, MouseButton};

//=== InputProcessor ======================================================

/// Stateless winit → engine event converter.
pub(crate) struct InputProcessor;

impl InputProcessor {
    pub(crate) fn new() -> Self {
        Self
    }

    //--- Event Processing -------------------------------------------------

    /// Converts a winit key event (filters repeats and unmapped keys).
    pub(crate) fn process_key_event(&self, key_event: &KeyEvent) -> Option<InputEvent> {
        if key_event.repeat {
            return None;
        }
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return None;
        };
        self.process_key(code, key_event.state)
    }

    pub(crate) fn process_key(&self, code: WinitKeyCode, state: ElementState) -> Option<InputEvent> {
        match KeyCode::from(code) {
            KeyCode::Unidentified => None,
            key => Some(InputEvent::key(key, state.is_pressed())),
        }
    }

    pub(crate) fn process_mouse_button(&self, button: WinitMouseButton, state: ElementState) -> InputEvent {
        InputEvent::button(MouseButton::from(button), state.is_pressed())
    }

    /// Converts raw device motion. Zero motion yields nothing.
    pub(crate) fn process_mouse_motion(&self, delta: (f64, f64)) -> Option<InputEvent> {
        let (dx, dy) = (delta.0 as f32, delta.1 as f32);
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(InputEvent::MouseMotion { dx, dy })
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Maps the keys the control scheme and menus read. Everything else is
/// `KeyCode::Unidentified`.
impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Movement -----------------------------------------------------
            KeyW => KeyCode::KeyW,
            KeyA => KeyCode::KeyA,
            KeyS => KeyCode::KeyS,
            KeyD => KeyCode::KeyD,

            //--- Look ---------------------------------------------------------
            ArrowUp => KeyCode::ArrowUp,
            ArrowDown => KeyCode::ArrowDown,
            ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight,

            //--- Actions ------------------------------------------------------
            Space => KeyCode::Space,
            KeyC => KeyCode::KeyC,
            Escape => KeyCode::Escape,

            //--- Menu ---------------------------------------------------------
            Enter | NumpadEnter => KeyCode::Enter,
            KeyR => KeyCode::KeyR,

            _ => KeyCode::Unidentified,
        }
    }
}

/// Left/Right/Middle mapped directly; Back/Forward/Other → Other.
impl From<WinitMouseButton> for MouseButton {
    fn from(button: WinitMouseButton) -> Self {
        match button {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
