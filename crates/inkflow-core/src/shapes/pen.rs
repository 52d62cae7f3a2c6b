//! Transient pens that draw a rubber-band outline and produce a shape on drop.

use super::{CursorIcon, Draggable, Dropped, HandleAlignment, Hit, Shape, ShapeKind, HANDLE_SIZE};
use crate::drag::DragEvent;
use crate::draw::DrawSink;
use crate::geometry::raw_frame;
use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// What a pen produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenKind {
    Rectangle,
    Ellipse,
    /// Selection marquee; creates nothing.
    Select,
}

/// The default tool. Never hit-tested, never stored on the canvas.
#[derive(Debug, Clone)]
pub struct Pen {
    kind: PenKind,
    frame: Rect,
    color: Color,
    dragging: bool,
    handle_size: f64,
}

impl Pen {
    pub fn new(kind: PenKind, color: Color) -> Self {
        Self {
            kind,
            frame: Rect::ZERO,
            color,
            dragging: false,
            handle_size: HANDLE_SIZE,
        }
    }

    pub fn rectangle(color: Color) -> Self {
        Self::new(PenKind::Rectangle, color)
    }

    pub fn ellipse(color: Color) -> Self {
        Self::new(PenKind::Ellipse, color)
    }

    pub fn select(color: Color) -> Self {
        Self::new(PenKind::Select, color)
    }

    /// Handle size given to the shapes this pen creates.
    pub fn with_handle_size(mut self, handle_size: f64) -> Self {
        self.handle_size = handle_size;
        self
    }

    pub fn kind(&self) -> PenKind {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Rubber-band frame of the current drag, possibly inverted.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    fn shape_kind(&self) -> Option<ShapeKind> {
        match self.kind {
            PenKind::Rectangle => Some(ShapeKind::Rectangle),
            PenKind::Ellipse => Some(ShapeKind::Ellipse),
            PenKind::Select => None,
        }
    }
}

impl Draggable for Pen {
    fn hit_test(&self, _point: Point) -> Option<Hit> {
        None
    }

    fn drag(&mut self, event: &DragEvent, _handle: Option<HandleAlignment>) {
        self.dragging = true;
        self.frame = raw_frame(event.start, event.current);
    }

    fn drop(&mut self) -> Option<Dropped> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        let frame = self.frame.abs();
        match self.shape_kind() {
            Some(kind) => Some(Dropped::Shape(Shape::new(kind, frame, self.color, self.handle_size))),
            None => Some(Dropped::Marquee(frame)),
        }
    }

    fn draw(&self, sink: &mut dyn DrawSink) {
        if !self.dragging {
            return;
        }
        let outline = self.shape_kind().unwrap_or(ShapeKind::Rectangle).outline(self.frame.abs());
        sink.stroke_path(&outline, self.color, true);
    }

    fn cursor(&self) -> CursorIcon {
        CursorIcon::Crosshair
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }
}
