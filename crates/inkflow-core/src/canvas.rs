//! Shape arena.

use crate::shapes::{Draggable, GroupId, Hit, Shape, ShapeId};
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// All persistent shapes, keyed by id, with their stacking order.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    /// All shapes, keyed by ID.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    z_order: Vec<ShapeId>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape on top of the stack.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        id
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Shape ids back to front.
    pub fn ids(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Shapes back to front.
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Mutable access to every shape, in no particular order.
    pub fn shapes_mut(&mut self) -> impl Iterator<Item = &mut Shape> {
        self.shapes.values_mut()
    }

    /// Topmost shape under `point`.
    pub fn hit_test(&self, point: Point) -> Option<Hit> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.shapes.get(id))
            .find_map(|shape| shape.hit_test(point))
    }

    /// Ids of the selected shapes, back to front.
    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.shapes_ordered()
            .filter(|s| s.is_selected())
            .map(|s| s.id())
            .collect()
    }

    /// Ids of the shapes in `group`, back to front.
    pub fn group_members(&self, group: GroupId) -> Vec<ShapeId> {
        self.shapes_ordered()
            .filter(|s| s.group() == group)
            .map(|s| s.id())
            .collect()
    }

    /// Bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes_ordered()
            .map(|s| s.bounds())
            .reduce(|a, b| a.union(b))
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}
