//! Drawing and selection state machine.
//!
//! [`DrawingManager`] owns the canvas and the default tool and decides, for
//! each pointer event, which item receives it. It does not subscribe to
//! anything itself: the engine calls [`DrawingManager::hover`],
//! [`DrawingManager::press`], [`DrawingManager::drag`] and
//! [`DrawingManager::release`] and then drains [`DrawingManager::take_events`].

use crate::canvas::Canvas;
use crate::composite::CompositeDraggable;
use crate::drag::DragEvent;
use crate::draw::DrawSink;
use crate::shapes::{CursorIcon, Draggable, Dropped, GroupId, Hit, Pen, Shape, ShapeId};
use kurbo::{Point, Rect};
use uuid::Uuid;

/// Item that receives the next drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTarget {
    /// The default tool (pen or selector).
    #[default]
    Tool,
    /// A single shape, possibly through one of its handles.
    Shape(Hit),
    /// The current multi-shape selection.
    Selection,
}

/// Notification produced by the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    CursorChanged(CursorIcon),
    RepaintRequested,
    SelectionChanged(Vec<ShapeId>),
    /// The selector finished a marquee with these normalized bounds.
    Dropped(Rect),
    ShapeAdded(ShapeId),
    Cleared,
}

/// Owner of all shapes and the routing of pointer input to them.
#[derive(Debug)]
pub struct DrawingManager {
    canvas: Canvas,
    default_tool: Pen,
    selection: CompositeDraggable,
    active: ActiveTarget,
    cursor: CursorIcon,
    pending: Vec<DrawingEvent>,
}

impl DrawingManager {
    pub fn new(default_tool: Pen) -> Self {
        Self {
            canvas: Canvas::new(),
            default_tool,
            selection: CompositeDraggable::default(),
            active: ActiveTarget::Tool,
            cursor: CursorIcon::Default,
            pending: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.canvas.get_shape(id)
    }

    pub fn default_tool(&self) -> &Pen {
        &self.default_tool
    }

    pub fn default_tool_mut(&mut self) -> &mut Pen {
        &mut self.default_tool
    }

    /// Replace the default tool. Takes effect from the next hover.
    pub fn set_default_tool(&mut self, tool: Pen) {
        log::debug!("default tool set to {:?}", tool.kind());
        self.default_tool = tool;
        if self.active == ActiveTarget::Tool {
            self.set_cursor(self.default_tool.cursor());
        }
    }

    pub fn selection(&self) -> &CompositeDraggable {
        &self.selection
    }

    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.canvas.selected_ids()
    }

    pub fn active(&self) -> ActiveTarget {
        self.active
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// Notifications produced since the last call.
    pub fn take_events(&mut self) -> Vec<DrawingEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Resolve the item under `point` with no button held.
    ///
    /// The selection is tried first, then shapes from the top down, then the
    /// default tool.
    pub fn hover(&mut self, point: Point) -> ActiveTarget {
        self.active = if self.selection.hit_test(&self.canvas, point).is_some() {
            ActiveTarget::Selection
        } else if let Some(hit) = self.canvas.hit_test(point) {
            ActiveTarget::Shape(hit)
        } else {
            ActiveTarget::Tool
        };

        let cursor = match self.active {
            ActiveTarget::Tool => self.default_tool.cursor(),
            ActiveTarget::Shape(hit) => hit.cursor,
            ActiveTarget::Selection => self.selection.cursor(),
        };
        self.set_cursor(cursor);
        self.active
    }

    /// Handle a press of the drawing button at `point`.
    pub fn press(&mut self, point: Point) {
        match self.hover(point) {
            ActiveTarget::Tool => {
                if !self.canvas.selected_ids().is_empty() || !self.selection.is_empty() {
                    self.select_only(&[]);
                }
            }
            ActiveTarget::Shape(hit) => {
                let Some(shape) = self.canvas.get_shape(hit.shape) else {
                    return;
                };
                if !shape.is_selected() {
                    let members = self.canvas.group_members(shape.group());
                    self.select_only(&members);
                    if members.len() > 1 {
                        self.selection = CompositeDraggable::new(members);
                        self.selection.set_active(Some(hit));
                        self.active = ActiveTarget::Selection;
                    }
                }
            }
            ActiveTarget::Selection => {}
        }
        self.pending.push(DrawingEvent::RepaintRequested);
    }

    /// Forward one drag step to the target resolved at press time.
    pub fn drag(&mut self, event: &DragEvent) {
        match self.active {
            ActiveTarget::Tool => self.default_tool.drag(event, None),
            ActiveTarget::Shape(hit) => {
                if let Some(shape) = self.canvas.get_shape_mut(hit.shape) {
                    shape.drag(event, hit.handle);
                }
            }
            ActiveTarget::Selection => self.selection.drag(&mut self.canvas, event),
        }
        self.pending.push(DrawingEvent::RepaintRequested);
    }

    /// Finish the drag on the active target.
    pub fn release(&mut self) {
        match self.active {
            ActiveTarget::Tool => match self.default_tool.drop() {
                Some(Dropped::Shape(shape)) => {
                    let id = self.add_shape(shape);
                    self.select_only(&[id]);
                }
                Some(Dropped::Marquee(marquee)) => {
                    self.pending.push(DrawingEvent::Dropped(marquee));
                    self.select_by(marquee);
                }
                None => {}
            },
            ActiveTarget::Shape(hit) => {
                if let Some(shape) = self.canvas.get_shape_mut(hit.shape) {
                    shape.drop();
                }
            }
            ActiveTarget::Selection => self.selection.drop(&mut self.canvas),
        }
        self.pending.push(DrawingEvent::RepaintRequested);
    }

    /// Select exactly the shapes whose bounds lie inside `marquee`.
    pub fn select_by(&mut self, marquee: Rect) -> Vec<ShapeId> {
        for shape in self.canvas.shapes_mut() {
            shape.select_by(marquee);
        }
        let selected = self.canvas.selected_ids();
        log::debug!("marquee {marquee:?} selected {} shapes", selected.len());
        self.selection = CompositeDraggable::new(selected.clone());
        self.pending.push(DrawingEvent::SelectionChanged(selected.clone()));
        selected
    }

    /// Put every selected shape into one fresh group.
    pub fn group_selection(&mut self) -> Option<GroupId> {
        let selected = self.canvas.selected_ids();
        if selected.len() < 2 {
            return None;
        }
        let group = Uuid::new_v4();
        for id in &selected {
            if let Some(shape) = self.canvas.get_shape_mut(*id) {
                shape.set_group(group);
            }
        }
        log::debug!("grouped {} shapes", selected.len());
        Some(group)
    }

    /// Give every selected shape a group of its own. Returns how many changed.
    pub fn ungroup_selection(&mut self) -> usize {
        let selected = self.canvas.selected_ids();
        for id in &selected {
            if let Some(shape) = self.canvas.get_shape_mut(*id) {
                shape.set_group(Uuid::new_v4());
            }
        }
        selected.len()
    }

    /// Append a shape on top of the stack.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = self.canvas.add_shape(shape);
        log::debug!("shape {id} added");
        self.pending.push(DrawingEvent::ShapeAdded(id));
        self.pending.push(DrawingEvent::RepaintRequested);
        id
    }

    /// Remove every shape and reset the selection.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.selection = CompositeDraggable::default();
        self.active = ActiveTarget::Tool;
        log::debug!("canvas cleared");
        self.pending.push(DrawingEvent::Cleared);
        self.pending.push(DrawingEvent::RepaintRequested);
    }

    /// Draw every shape back to front, then the default tool.
    pub fn draw(&self, sink: &mut dyn DrawSink) {
        for shape in self.canvas.shapes_ordered() {
            shape.draw(sink);
        }
        self.default_tool.draw(sink);
    }

    fn select_only(&mut self, ids: &[ShapeId]) {
        for shape in self.canvas.shapes_mut() {
            let selected = ids.contains(&shape.id());
            shape.set_selected(selected);
        }
        self.selection = CompositeDraggable::default();
        self.pending.push(DrawingEvent::SelectionChanged(ids.to_vec()));
    }

    fn set_cursor(&mut self, cursor: CursorIcon) {
        if self.cursor != cursor {
            self.cursor = cursor;
            self.pending.push(DrawingEvent::CursorChanged(cursor));
        }
    }
}
