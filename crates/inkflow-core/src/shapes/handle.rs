//! Resize handles anchored to a shape's frame.

use super::{CursorIcon, ShapeId};
use crate::draw::DrawSink;
use kurbo::{Ellipse, Point, Rect, Shape as _, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Position of a handle on its parent's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleAlignment {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl HandleAlignment {
    /// All alignments, in hit-test order.
    pub const ALL: [HandleAlignment; 8] = [
        HandleAlignment::TopLeft,
        HandleAlignment::TopCenter,
        HandleAlignment::TopRight,
        HandleAlignment::CenterLeft,
        HandleAlignment::CenterRight,
        HandleAlignment::BottomLeft,
        HandleAlignment::BottomCenter,
        HandleAlignment::BottomRight,
    ];

    /// Point of `frame` this alignment is attached to.
    ///
    /// `frame` is the raw frame, so an inverted frame yields mirrored anchors.
    pub fn anchor(self, frame: Rect) -> Point {
        let cx = (frame.x0 + frame.x1) / 2.0;
        let cy = (frame.y0 + frame.y1) / 2.0;
        match self {
            HandleAlignment::TopLeft => Point::new(frame.x0, frame.y0),
            HandleAlignment::TopCenter => Point::new(cx, frame.y0),
            HandleAlignment::TopRight => Point::new(frame.x1, frame.y0),
            HandleAlignment::CenterLeft => Point::new(frame.x0, cy),
            HandleAlignment::CenterRight => Point::new(frame.x1, cy),
            HandleAlignment::BottomLeft => Point::new(frame.x0, frame.y1),
            HandleAlignment::BottomCenter => Point::new(cx, frame.y1),
            HandleAlignment::BottomRight => Point::new(frame.x1, frame.y1),
        }
    }

    /// Move the edges this alignment controls to `location`.
    ///
    /// Opposite edges stay put. The result may be inverted when the handle is
    /// dragged past them.
    pub fn resize(self, frame: Rect, location: Point) -> Rect {
        let mut out = frame;
        match self {
            HandleAlignment::TopLeft => {
                out.x0 = location.x;
                out.y0 = location.y;
            }
            HandleAlignment::TopCenter => out.y0 = location.y,
            HandleAlignment::TopRight => {
                out.x1 = location.x;
                out.y0 = location.y;
            }
            HandleAlignment::CenterLeft => out.x0 = location.x,
            HandleAlignment::CenterRight => out.x1 = location.x,
            HandleAlignment::BottomLeft => {
                out.x0 = location.x;
                out.y1 = location.y;
            }
            HandleAlignment::BottomCenter => out.y1 = location.y,
            HandleAlignment::BottomRight => {
                out.x1 = location.x;
                out.y1 = location.y;
            }
        }
        out
    }

    /// Hover cursor shown over this handle.
    pub fn cursor(self) -> CursorIcon {
        match self {
            HandleAlignment::TopLeft | HandleAlignment::BottomRight => CursorIcon::ResizeNwSe,
            HandleAlignment::TopRight | HandleAlignment::BottomLeft => CursorIcon::ResizeNeSw,
            HandleAlignment::TopCenter | HandleAlignment::BottomCenter => CursorIcon::ResizeNs,
            HandleAlignment::CenterLeft | HandleAlignment::CenterRight => CursorIcon::ResizeWe,
        }
    }
}

/// A fixed-size grip centered on one anchor of its parent.
#[derive(Debug, Clone)]
pub struct ResizeHandle {
    pub parent: ShapeId,
    pub alignment: HandleAlignment,
    pub bounds: Rect,
    pub color: Color,
}

impl ResizeHandle {
    pub fn new(parent: ShapeId, alignment: HandleAlignment, size: f64, color: Color, frame: Rect) -> Self {
        let mut handle = Self {
            parent,
            alignment,
            bounds: Rect::from_origin_size(Point::ZERO, Size::new(size, size)),
            color,
        };
        handle.reposition(frame);
        handle
    }

    /// Re-center the handle on its anchor in `frame`.
    pub fn reposition(&mut self, frame: Rect) {
        self.bounds = Rect::from_center_size(self.alignment.anchor(frame), self.bounds.size());
    }

    pub fn anchor(&self) -> Point {
        self.bounds.center()
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    pub fn cursor(&self) -> CursorIcon {
        self.alignment.cursor()
    }

    /// White disc with a colored rim.
    pub fn draw(&self, sink: &mut dyn DrawSink) {
        let path = Ellipse::from_rect(self.bounds).to_path(0.1);
        sink.fill_path(&path, Color::WHITE);
        sink.stroke_path(&path, self.color, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawCommand, RecordingSink};
    use crate::shapes::Rgba8;
    use uuid::Uuid;

    fn frame() -> Rect {
        Rect::new(10.0, 20.0, 110.0, 80.0)
    }

    #[test]
    fn test_anchors() {
        let f = frame();
        assert_eq!(HandleAlignment::TopLeft.anchor(f), Point::new(10.0, 20.0));
        assert_eq!(HandleAlignment::TopCenter.anchor(f), Point::new(60.0, 20.0));
        assert_eq!(HandleAlignment::CenterRight.anchor(f), Point::new(110.0, 50.0));
        assert_eq!(HandleAlignment::BottomRight.anchor(f), Point::new(110.0, 80.0));
    }

    #[test]
    fn test_resize_keeps_opposite_edges() {
        let f = frame();
        let r = HandleAlignment::BottomRight.resize(f, Point::new(150.0, 100.0));
        assert_eq!(r, Rect::new(10.0, 20.0, 150.0, 100.0));

        let r = HandleAlignment::TopCenter.resize(f, Point::new(999.0, 0.0));
        assert_eq!(r, Rect::new(10.0, 0.0, 110.0, 80.0));

        let r = HandleAlignment::CenterLeft.resize(f, Point::new(0.0, 999.0));
        assert_eq!(r, Rect::new(0.0, 20.0, 110.0, 80.0));
    }

    #[test]
    fn test_resize_past_opposite_edge_inverts() {
        let r = HandleAlignment::TopLeft.resize(frame(), Point::new(200.0, 200.0));
        assert!(r.x1 < r.x0 && r.y1 < r.y0);
    }

    #[test]
    fn test_handle_follows_frame() {
        let mut handle = ResizeHandle::new(Uuid::new_v4(), HandleAlignment::TopRight, 7.0, Color::BLACK, frame());
        assert_eq!(handle.anchor(), Point::new(110.0, 20.0));
        assert!((handle.bounds.width() - 7.0).abs() < f64::EPSILON);
        assert!(handle.hit_test(Point::new(112.0, 18.0)));
        assert!(!handle.hit_test(Point::new(120.0, 20.0)));

        handle.reposition(Rect::new(0.0, 0.0, 40.0, 40.0));
        assert_eq!(handle.anchor(), Point::new(40.0, 0.0));
        assert!((handle.bounds.height() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handle_draws_fill_then_outline() {
        let handle = ResizeHandle::new(Uuid::new_v4(), HandleAlignment::TopLeft, 7.0, Color::BLACK, frame());
        let mut sink = RecordingSink::new();
        handle.draw(&mut sink);
        assert_eq!(sink.len(), 2);
        assert!(matches!(sink.commands()[0], DrawCommand::Fill { .. }));
        assert_eq!(Rgba8::from(sink.commands()[0].color()), Rgba8::WHITE);
        assert!(matches!(sink.commands()[1], DrawCommand::Stroke { dashed: false, .. }));
    }
}
