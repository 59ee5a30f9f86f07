//! Content-space geometry: points, rectangles, bounding boxes, and the
//! screen ↔ content view transform.
//!
//! Content space is the coordinate system node positions live in. Screen
//! space is the pointer coordinate system of the host surface. The only
//! way between them is [`ViewTransform`], so drag deltas, connection
//! previews, and drop targets all agree under zoom.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A 2D point (or vector) in either space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height of a node rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Inclusive point-in-rectangle test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this rectangle overlaps another (AABB overlap).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Min/max extents of a set of rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Grow the box by `pad` on the left, right and bottom, and by `header`
    /// on top (room for a group's title strip).
    pub fn padded(&self, pad: f32, header: f32) -> Rect {
        Rect {
            x: self.min_x - pad,
            y: self.min_y - header,
            width: self.width() + pad * 2.0,
            height: self.height() + header + pad,
        }
    }

    pub fn contains_rect(&self, r: &Rect) -> bool {
        r.x >= self.min_x
            && r.y >= self.min_y
            && r.x + r.width <= self.max_x
            && r.y + r.height <= self.max_y
    }
}

/// Bounding box over node rectangles. `None` for an empty iterator —
/// callers treat that as "nothing to draw or hit".
pub fn bounding_box<I>(rects: I) -> Option<Bounds>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().fold(None, |acc, r| {
        let b = Bounds {
            min_x: r.x,
            min_y: r.y,
            max_x: r.x + r.width,
            max_y: r.y + r.height,
        };
        Some(match acc {
            None => b,
            Some(a) => Bounds {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            },
        })
    })
}

/// Arithmetic mean of a set of points. `None` when empty.
pub fn centroid<I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = Point>,
{
    let (sum, n) = points
        .into_iter()
        .fold((Point::ZERO, 0usize), |(s, n), p| (s + p, n + 1));
    (n > 0).then(|| Point::new(sum.x / n as f32, sum.y / n as f32))
}

// ─── View transform ──────────────────────────────────────────────────────

/// Pan + uniform zoom applied to content when it is drawn.
///
/// `origin` is the offset of the drawing surface inside the pointer
/// coordinate system (e.g. the canvas element's position on the page).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub origin: Point,
    pub pan: Point,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            pan: Point::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    /// `content = (screen - origin - pan) / scale`
    pub fn to_content_space(&self, screen: Point) -> Point {
        let p = screen - self.origin - self.pan;
        Point::new(p.x / self.scale, p.y / self.scale)
    }

    /// `screen = content * scale + pan + origin`
    pub fn to_screen_space(&self, content: Point) -> Point {
        Point::new(content.x * self.scale, content.y * self.scale) + self.pan + self.origin
    }

    /// Pixel on the drawing surface itself: `content * scale + pan`.
    /// Painters use this; `origin` only applies to pointer coordinates.
    pub fn to_surface_space(&self, content: Point) -> Point {
        Point::new(content.x * self.scale, content.y * self.scale) + self.pan
    }

    /// Pan by a raw screen-space delta. Not divided by scale.
    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan + delta;
    }

    /// Zoom by `factor`, keeping the content point under `anchor` (screen
    /// space) fixed. The resulting scale is clamped to `[min, max]`.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32, min: f32, max: f32) {
        let before = self.to_content_space(anchor);
        self.scale = (self.scale * factor).clamp(min, max);
        let after = self.to_screen_space(before);
        self.pan = self.pan + (anchor - after);
    }

    pub fn reset(&mut self) {
        self.pan = Point::ZERO;
        self.scale = 1.0;
    }
}

/// Zero-origin form of [`ViewTransform::to_content_space`].
pub fn to_content_space(screen: Point, pan: Point, scale: f32) -> Point {
    ViewTransform {
        origin: Point::ZERO,
        pan,
        scale,
    }
    .to_content_space(screen)
}

/// Zero-origin form of [`ViewTransform::to_screen_space`].
pub fn to_screen_space(content: Point, pan: Point, scale: f32) -> Point {
    ViewTransform {
        origin: Point::ZERO,
        pan,
        scale,
    }
    .to_screen_space(content)
}
