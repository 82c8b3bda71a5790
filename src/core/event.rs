//=========================================================================
// System Event Types
//
// The engine-internal representation of input and window events. The
// platform layer normalizes OS events (Winit) into these before they
// cross into the core thread; the scene tree consumes them without ever
// seeing a platform type.
//
// Responsibilities:
// - Represent pointer and keyboard input in a stable, portable way
// - Carry pointer coordinates inside the event itself, so dispatch never
//   has to query global mouse state
// - Represent window lifecycle (close, resize) as ordinary events
//
//=========================================================================

//=== MouseButton =========================================================
//
// A physical mouse button. Buttons beyond the common three collapse into
// `Other`; the scene tree treats every button the same for click
// dispatch.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

//=== KeyCode =============================================================
//
// A deliberately small key set. The scene core does not consume keys;
// they exist so applications listening on the same event stream get a
// portable representation. Unmapped keys become `Unidentified`.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    Space,
    Unidentified,
}

//=== SystemEvent =========================================================

/// One normalized external event, delivered to the active scene once per
/// controller tick in arrival order.
///
/// Pointer coordinates are in screen-surface pixels. `PointerDown` drives
/// click dispatch, `PointerMoved` drives hover dispatch; everything else
/// passes through the scene tree untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SystemEvent {
    PointerDown { x: i32, y: i32, button: MouseButton },
    PointerUp { x: i32, y: i32, button: MouseButton },
    PointerMoved { x: i32, y: i32 },
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// The OS window changed size; the controller reconfigures the screen
    /// surface in place. Scenes are not notified.
    Resized { width: u32, height: u32 },
    /// The user or OS asked the window to close. Terminates the
    /// controller loop after being forwarded.
    WindowClosed,
}

impl SystemEvent {
    /// The pointer position, for the variants that carry one.
    pub fn pointer(&self) -> Option<(i32, i32)> {
        match *self {
            SystemEvent::PointerDown { x, y, .. }
            | SystemEvent::PointerUp { x, y, .. }
            | SystemEvent::PointerMoved { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_accessor_covers_pointer_variants() {
        let down = SystemEvent::PointerDown { x: 3, y: 4, button: MouseButton::Left };
        let moved = SystemEvent::PointerMoved { x: -1, y: 9 };
        assert_eq!(down.pointer(), Some((3, 4)));
        assert_eq!(moved.pointer(), Some((-1, 9)));
    }

    #[test]
    fn pointer_accessor_is_none_for_other_events() {
        assert_eq!(SystemEvent::WindowClosed.pointer(), None);
        assert_eq!(SystemEvent::KeyDown(KeyCode::Space).pointer(), None);
        assert_eq!(SystemEvent::Resized { width: 1, height: 1 }.pointer(), None);
    }
}
