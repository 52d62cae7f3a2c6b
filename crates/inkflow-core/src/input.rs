//! Pointer input types exchanged with the host surface.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 0b001,
            MouseButton::Right => 0b010,
            MouseButton::Middle => 0b100,
        }
    }

    /// Map a winit button onto ours. Back/forward and vendor buttons have no counterpart.
    #[cfg(feature = "winit")]
    pub fn from_winit(button: winit::event::MouseButton) -> Option<Self> {
        match button {
            winit::event::MouseButton::Left => Some(MouseButton::Left),
            winit::event::MouseButton::Right => Some(MouseButton::Right),
            winit::event::MouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Set of mouse buttons currently held down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet {
    bits: u8,
}

impl ButtonSet {
    /// No buttons held.
    pub const EMPTY: ButtonSet = ButtonSet { bits: 0 };

    /// A set holding exactly one button.
    pub fn only(button: MouseButton) -> Self {
        Self { bits: button.bit() }
    }

    pub fn insert(&mut self, button: MouseButton) {
        self.bits |= button.bit();
    }

    pub fn remove(&mut self, button: MouseButton) {
        self.bits &= !button.bit();
    }

    pub fn contains(&self, button: MouseButton) -> bool {
        self.bits & button.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

/// Raw pointer event as delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
}

impl PointerEvent {
    /// Location carried by the event.
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => *position,
        }
    }
}

/// A pointer sample as seen by stream subscribers.
///
/// `button` is the button that changed state (down/up) and is `None` for moves.
/// `held` is the button state after the event was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub position: Point,
    pub button: Option<MouseButton>,
    pub held: ButtonSet,
}

impl MouseEvent {
    /// Check whether this event was produced by `button` changing state.
    pub fn is_button(&self, button: MouseButton) -> bool {
        self.button == Some(button)
    }
}
