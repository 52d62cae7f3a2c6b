//! Rectangle helpers shared by shapes, pens and the selection marquee.
//!
//! Shapes keep a raw frame whose corners follow the pointer while a drag is in
//! progress, so `x1 < x0` or `y1 < y0` is a legal interim state. Everything that
//! is exposed to callers goes through [`Rect::abs`] first.

use kurbo::{Point, Rect};

/// Extension methods for [`kurbo::Rect`].
pub trait RectExt {
    /// Check whether the raw frame is inverted on either axis.
    fn is_inverted(&self) -> bool;
}

impl RectExt for Rect {
    fn is_inverted(&self) -> bool {
        self.x1 < self.x0 || self.y1 < self.y0
    }
}

/// Build a raw frame spanning two points without reordering them.
///
/// Unlike [`Rect::from_points`] the result keeps `p0` as `(x0, y0)`, which is
/// what a pen needs while its second corner chases the pointer.
pub fn raw_frame(p0: Point, p1: Point) -> Rect {
    Rect::new(p0.x, p0.y, p1.x, p1.y)
}
