//! Shape model: persistent shapes, their resize handles and transient pens.

mod handle;
mod pen;

pub use handle::{HandleAlignment, ResizeHandle};
pub use pen::{Pen, PenKind};

use crate::drag::DragEvent;
use crate::draw::DrawSink;
use kurbo::{BezPath, Ellipse, Point, Rect, Shape as _, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default edge length of a resize handle.
pub const HANDLE_SIZE: f64 = 7.0;

/// Flattening tolerance used when converting curves to paths.
const PATH_TOLERANCE: f64 = 0.1;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);
    pub const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    pub const BLUE: Rgba8 = Rgba8::new(0, 0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba8> for Color {
    fn from(color: Rgba8) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Cursor glyph requested from the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorIcon {
    #[default]
    Default,
    Crosshair,
    Move,
    ResizeNwSe,
    ResizeNeSw,
    ResizeNs,
    ResizeWe,
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Identifier shared by shapes that move together.
pub type GroupId = Uuid;

/// Result of a successful hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub shape: ShapeId,
    /// Handle under the pointer, `None` for the body.
    pub handle: Option<HandleAlignment>,
    pub cursor: CursorIcon,
}

/// What a drop produced.
#[derive(Debug, Clone)]
pub enum Dropped {
    /// A new persistent shape.
    Shape(Shape),
    /// A normalized selection marquee.
    Marquee(Rect),
}

/// Something that can be hit, dragged, dropped and drawn.
pub trait Draggable {
    /// Resolve what lies under `point`.
    fn hit_test(&self, point: Point) -> Option<Hit>;

    /// Apply one drag step. `handle` selects a resize handle, `None` moves the body.
    fn drag(&mut self, event: &DragEvent, handle: Option<HandleAlignment>);

    /// Finish the drag.
    fn drop(&mut self) -> Option<Dropped>;

    fn draw(&self, sink: &mut dyn DrawSink);

    /// Hover cursor for the body.
    fn cursor(&self) -> CursorIcon;

    fn is_dragging(&self) -> bool;
}

/// Persistent shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

impl ShapeKind {
    /// Outline of this kind inscribed in `bounds`.
    pub fn outline(self, bounds: Rect) -> BezPath {
        match self {
            ShapeKind::Rectangle => bounds.to_path(PATH_TOLERANCE),
            ShapeKind::Ellipse => Ellipse::from_rect(bounds).to_path(PATH_TOLERANCE),
        }
    }
}

/// A resizable shape on the canvas.
#[derive(Debug, Clone)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    /// Raw frame; may be inverted while a handle is dragged past its opposite edge.
    frame: Rect,
    color: Color,
    dragging: bool,
    selected: bool,
    group: GroupId,
    handles: Vec<ResizeHandle>,
}

impl Shape {
    pub fn new(kind: ShapeKind, frame: Rect, color: Color, handle_size: f64) -> Self {
        let id = Uuid::new_v4();
        let frame = frame.abs();
        let handles = HandleAlignment::ALL
            .iter()
            .map(|&alignment| ResizeHandle::new(id, alignment, handle_size, color, frame))
            .collect();
        Self {
            id,
            kind,
            frame,
            color,
            dragging: false,
            selected: false,
            group: Uuid::new_v4(),
            handles,
        }
    }

    pub fn rectangle(frame: Rect, color: Color) -> Self {
        Self::new(ShapeKind::Rectangle, frame, color, HANDLE_SIZE)
    }

    pub fn ellipse(frame: Rect, color: Color) -> Self {
        Self::new(ShapeKind::Ellipse, frame, color, HANDLE_SIZE)
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Frame as last set, possibly inverted.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Normalized bounding rectangle.
    pub fn bounds(&self) -> Rect {
        self.frame.abs()
    }

    /// Replace the frame and reposition every handle.
    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        for handle in &mut self.handles {
            handle.reposition(frame);
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.set_frame(self.frame + offset);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        for handle in &mut self.handles {
            handle.color = color;
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Set the selected flag by whether `marquee` fully encloses the bounds.
    pub fn select_by(&mut self, marquee: Rect) -> bool {
        self.selected = marquee.abs().contains_rect(self.bounds());
        self.selected
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub fn handles(&self) -> &[ResizeHandle] {
        &self.handles
    }

    pub fn handle(&self, alignment: HandleAlignment) -> Option<&ResizeHandle> {
        self.handles.iter().find(|h| h.alignment == alignment)
    }

    /// Current anchor point of `alignment`.
    pub fn anchor(&self, alignment: HandleAlignment) -> Point {
        alignment.anchor(self.frame)
    }

    pub fn outline(&self) -> BezPath {
        self.kind.outline(self.bounds())
    }

    /// Even-odd interior test against the outline.
    pub fn contains(&self, point: Point) -> bool {
        self.outline().winding(point) % 2 != 0
    }
}

impl Draggable for Shape {
    fn hit_test(&self, point: Point) -> Option<Hit> {
        if let Some(handle) = self.handles.iter().find(|h| h.hit_test(point)) {
            return Some(Hit {
                shape: self.id,
                handle: Some(handle.alignment),
                cursor: handle.cursor(),
            });
        }
        self.contains(point).then(|| Hit {
            shape: self.id,
            handle: None,
            cursor: self.cursor(),
        })
    }

    fn drag(&mut self, event: &DragEvent, handle: Option<HandleAlignment>) {
        self.dragging = true;
        match handle {
            Some(alignment) => self.set_frame(alignment.resize(self.frame, event.current)),
            None => self.translate(event.delta()),
        }
    }

    fn drop(&mut self) -> Option<Dropped> {
        if self.dragging {
            self.set_frame(self.frame.abs());
            self.dragging = false;
        }
        None
    }

    fn draw(&self, sink: &mut dyn DrawSink) {
        sink.stroke_path(&self.outline(), self.color, self.dragging);
        if self.dragging || !self.selected {
            return;
        }
        for handle in &self.handles {
            handle.draw(sink);
        }
    }

    fn cursor(&self) -> CursorIcon {
        CursorIcon::Move
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }
}
