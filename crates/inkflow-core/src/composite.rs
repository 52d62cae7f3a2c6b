//! Fan-out of one drag to a set of shapes.

use crate::canvas::Canvas;
use crate::drag::DragEvent;
use crate::shapes::{CursorIcon, Draggable, Hit, ShapeId};
use kurbo::Point;

/// Non-owning aggregate of shapes dragged as one.
///
/// Members are referenced by id; the shapes themselves stay in the [`Canvas`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeDraggable {
    members: Vec<ShapeId>,
    active: Option<Hit>,
}

impl CompositeDraggable {
    pub fn new(members: Vec<ShapeId>) -> Self {
        Self {
            members,
            active: None,
        }
    }

    pub fn members(&self) -> &[ShapeId] {
        &self.members
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member hit last, and the handle under the pointer.
    pub fn active(&self) -> Option<Hit> {
        self.active
    }

    pub fn set_active(&mut self, hit: Option<Hit>) {
        self.active = hit;
    }

    pub fn cursor(&self) -> CursorIcon {
        self.active.map(|hit| hit.cursor).unwrap_or_default()
    }

    /// Hit-test members from the topmost down. The first hit becomes active.
    pub fn hit_test(&mut self, canvas: &Canvas, point: Point) -> Option<Hit> {
        self.active = self
            .members
            .iter()
            .rev()
            .filter_map(|&id| canvas.get_shape(id))
            .find_map(|shape| shape.hit_test(point));
        self.active
    }

    /// Dispatch one drag step to every member.
    ///
    /// When the active hit is a handle, each member is resized through its own
    /// handle of the same alignment, with the event shifted by the offset between
    /// that handle and the active one. Otherwise every member gets the event as is.
    pub fn drag(&self, canvas: &mut Canvas, event: &DragEvent) {
        let resize = self.active.and_then(|hit| {
            let alignment = hit.handle?;
            let anchor = canvas.get_shape(hit.shape)?.anchor(alignment);
            Some((alignment, anchor))
        });

        for &id in &self.members {
            let Some(shape) = canvas.get_shape_mut(id) else {
                continue;
            };
            match resize {
                Some((alignment, active_anchor)) => {
                    let offset = shape.anchor(alignment) - active_anchor;
                    shape.drag(&event.translated(offset), Some(alignment));
                }
                None => shape.drag(event, None),
            }
        }
    }

    /// Drop every member. Composites never produce anything.
    pub fn drop(&self, canvas: &mut Canvas) {
        for &id in &self.members {
            if let Some(shape) = canvas.get_shape_mut(id) {
                shape.drop();
            }
        }
    }

    /// True while every member is being dragged.
    pub fn is_dragging(&self, canvas: &Canvas) -> bool {
        !self.members.is_empty()
            && self
                .members
                .iter()
                .filter_map(|&id| canvas.get_shape(id))
                .all(|shape| shape.is_dragging())
    }
}
