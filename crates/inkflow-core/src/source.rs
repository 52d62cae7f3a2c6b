//! Pointer event source fed by the host surface.

use crate::input::{ButtonSet, MouseEvent, PointerEvent};
use crate::stream::{EventStream, StreamError, StreamResult, Subject};
use std::cell::Cell;

/// Fan-out point for raw pointer input.
///
/// The host calls [`PointerSource::dispatch`] for every pointer event; the
/// source tracks which buttons are held and republishes the event on the
/// matching down, move or up stream.
#[derive(Default)]
pub struct PointerSource {
    downs: Subject<MouseEvent>,
    moves: Subject<MouseEvent>,
    ups: Subject<MouseEvent>,
    held: Cell<ButtonSet>,
}

impl PointerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a host pointer event.
    pub fn dispatch(&self, event: &PointerEvent) {
        let mut held = self.held.get();
        match *event {
            PointerEvent::Down { position, button } => {
                held.insert(button);
                self.held.set(held);
                self.downs.emit(&MouseEvent {
                    position,
                    button: Some(button),
                    held,
                });
            }
            PointerEvent::Move { position } => {
                self.moves.emit(&MouseEvent {
                    position,
                    button: None,
                    held,
                });
            }
            PointerEvent::Up { position, button } => {
                held.remove(button);
                self.held.set(held);
                self.ups.emit(&MouseEvent {
                    position,
                    button: Some(button),
                    held,
                });
            }
        }
    }

    /// Buttons currently held down.
    pub fn held(&self) -> ButtonSet {
        self.held.get()
    }

    pub fn mouse_downs(&self) -> EventStream<MouseEvent> {
        self.downs.stream()
    }

    pub fn mouse_moves(&self) -> EventStream<MouseEvent> {
        self.moves.stream()
    }

    pub fn mouse_ups(&self) -> EventStream<MouseEvent> {
        self.ups.stream()
    }

    /// Pointer input cannot be rewound.
    pub fn reset(&self) -> StreamResult<()> {
        Err(StreamError::ForwardOnly)
    }
}
