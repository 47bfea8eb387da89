//! Box geometry used by the layout oracle.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)

use serde::Serialize;
use tether_css::Axis;

/// A rectangle positioned in 2D space, in CSS pixels.
///
/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f64,
    /// Vertical position of the top-left corner.
    pub y: f64,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rect {
    /// A rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The x coordinate of the right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// The y coordinate of the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// The start coordinate along `axis` (`x` or `y`).
    #[must_use]
    pub const fn origin(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// The extent along `axis` (`width` or `height`).
    #[must_use]
    pub const fn size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// The same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// A width and height, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// A size from its dimensions.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The extent along `axis`.
    #[must_use]
    pub const fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// Per-side lengths: border widths, or how far a box overflows a boundary.
///
/// As an overflow measurement, a positive side means the box extends past
/// that side of the boundary:
///
/// ```text
///            top > 0
///          ┌─────────┐
///   ┌──────┼──┐      │ boundary
///   │ box  │  │      │
///   └──────┼──┘      │
/// left > 0 └─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f64,
    /// Right edge size.
    pub right: f64,
    /// Bottom edge size.
    pub bottom: f64,
    /// Left edge size.
    pub left: f64,
}

impl EdgeSizes {
    /// Overflow of `inner` past each side of `outer`.
    #[must_use]
    pub fn overflow(inner: &Rect, outer: &Rect) -> Self {
        Self {
            top: outer.y - inner.y,
            right: inner.right() - outer.right(),
            bottom: inner.bottom() - outer.bottom(),
            left: outer.x - inner.x,
        }
    }

    /// Whether any side overflows.
    #[must_use]
    pub fn any_positive(&self) -> bool {
        self.top > 0.0 || self.right > 0.0 || self.bottom > 0.0 || self.left > 0.0
    }

    /// The `left` or `top` side.
    #[must_use]
    pub const fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// The `right` or `bottom` side.
    #[must_use]
    pub const fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_sides() {
        let boundary = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inside = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(!EdgeSizes::overflow(&inside, &boundary).any_positive());

        let spilling = Rect::new(-5.0, 90.0, 20.0, 20.0);
        let overflow = EdgeSizes::overflow(&spilling, &boundary);
        assert_eq!(overflow.left, 5.0);
        assert_eq!(overflow.bottom, 10.0);
        assert!(overflow.top < 0.0);
        assert_eq!(overflow.start(Axis::Horizontal), 5.0);
        assert_eq!(overflow.end(Axis::Vertical), 10.0);
    }
}
