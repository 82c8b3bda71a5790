//=========================================================================
// Platform Event Mapper
//
// Converts Winit input types into the engine's `SystemEvent` vocabulary.
// Keeps OS-specific representations out of the core: the scene tree only
// ever sees the engine's own enums.
//
// Responsibilities:
// - Translate keyboard keys and mouse buttons
// - Provide fallbacks (`Unidentified`) for unmapped keys
// - Leave positional data to the platform, which tracks the cursor
//
//=========================================================================

use winit::event::MouseButton as WinitMouseButton;
use winit::keyboard::KeyCode as WinitKeyCode;
use winit::keyboard::PhysicalKey;

use crate::core::event::{KeyCode, MouseButton};

//=== Key Conversion ======================================================
//
// Only the keys the engine vocabulary names are translated; everything
// else collapses into `Unidentified` and flows through the event stream
// unchanged.
//

impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        match code {
            WinitKeyCode::ArrowUp => KeyCode::ArrowUp,
            WinitKeyCode::ArrowDown => KeyCode::ArrowDown,
            WinitKeyCode::ArrowLeft => KeyCode::ArrowLeft,
            WinitKeyCode::ArrowRight => KeyCode::ArrowRight,
            WinitKeyCode::Enter => KeyCode::Enter,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Space => KeyCode::Space,
            _ => KeyCode::Unidentified,
        }
    }
}

/// Maps a physical key, including the non-code variants Winit can emit.
pub(crate) fn map_key(key: PhysicalKey) -> KeyCode {
    match key {
        PhysicalKey::Code(code) => KeyCode::from(code),
        _ => KeyCode::Unidentified,
    }
}

//=== Mouse Conversion ====================================================

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
// Unit Tests
//=========================================================================
