/*!
2D geometry primitives and clearance tests.

All geometry is in screen space: `+x` right, `+y` down. An obstacle's top edge is
at `y`, its underside at `y + height`.

This module contains no graph logic. It provides:
- [`Obstacle`] and [`Bounds`], the rectangles everything else is computed from.
- Circle-vs-rectangle overlap, the single clearance primitive used by the surface
  extractor, the line check, and the jump-arc check.
- Interval subtraction for cutting blocked spans out of a surface.
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::constants::{ARC_SAMPLES, CONTACT_TOLERANCE, LINE_SAMPLES};

pub type Point = na::Point2<f32>;
pub type Vec2 = na::Vector2<f32>;

/// Stable identifier of an obstacle across snapshots.
pub type ObstacleId = u64;

/// An axis-aligned rectangle the agent cannot pass through.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    #[inline]
    pub const fn new(id: ObstacleId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Finite and larger than `min_extent` on both axes.
    pub fn is_usable(&self, min_extent: f32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > min_extent
            && self.height > min_extent
    }

    /// Same bounds within `margin` on every field. Ids are not compared.
    pub fn matches(&self, other: &Obstacle, margin: f32) -> bool {
        (self.x - other.x).abs() <= margin
            && (self.y - other.y).abs() <= margin
            && (self.width - other.width).abs() <= margin
            && (self.height - other.height).abs() <= margin
    }

    /// Open-interval overlap with the horizontal band `[top, bottom]`.
    #[inline]
    pub fn overlaps_band(&self, top: f32, bottom: f32) -> bool {
        self.top() < bottom && self.bottom() > top
    }

    /// Open-interval overlap with the horizontal span `[left, right]`.
    #[inline]
    pub fn overlaps_span(&self, left: f32, right: f32) -> bool {
        self.left() < right && self.right() > left
    }
}

/// Axis-aligned bounds, used for the respawn region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn around(center: Point, half_extent: f32) -> Self {
        Self {
            min: Point::new(center.x - half_extent, center.y - half_extent),
            max: Point::new(center.x + half_extent, center.y + half_extent),
        }
    }

    /// Union of all obstacle rectangles, `None` when empty.
    pub fn of_obstacles(obstacles: &[Obstacle]) -> Option<Self> {
        let mut iter = obstacles.iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min: Point::new(first.left(), first.top()),
            max: Point::new(first.right(), first.bottom()),
        };
        for o in iter {
            bounds.min.x = bounds.min.x.min(o.left());
            bounds.min.y = bounds.min.y.min(o.top());
            bounds.max.x = bounds.max.x.max(o.right());
            bounds.max.y = bounds.max.y.max(o.bottom());
        }
        Some(bounds)
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Does a circle overlap the rectangle by more than [`CONTACT_TOLERANCE`]?
///
/// Touching (distance equal to the radius) is not an intersection: a node sits
/// exactly one radius above the surface it stands on.
#[inline]
pub fn circle_intersects(center: Point, radius: f32, o: &Obstacle) -> bool {
    let cx = center.x.clamp(o.left(), o.right());
    let cy = center.y.clamp(o.top(), o.bottom());
    let dx = center.x - cx;
    let dy = center.y - cy;
    let r = (radius - CONTACT_TOLERANCE).max(0.0);
    dx * dx + dy * dy < r * r
}

/// Does a circle overlap any obstacle, optionally ignoring one id?
pub fn circle_hits_any(
    center: Point,
    radius: f32,
    obstacles: &[Obstacle],
    ignore: Option<ObstacleId>,
) -> bool {
    obstacles
        .iter()
        .filter(|o| Some(o.id) != ignore)
        .any(|o| circle_intersects(center, radius, o))
}

/// Sample [`LINE_SAMPLES`] circles from `a` to `b` (both ends included).
pub fn line_is_clear(a: Point, b: Point, radius: f32, obstacles: &[Obstacle]) -> bool {
    (0..LINE_SAMPLES).all(|i| {
        let t = i as f32 / (LINE_SAMPLES - 1) as f32;
        let p = a + (b - a) * t;
        !circle_hits_any(p, radius, obstacles, None)
    })
}

/// Point on the jump parabola at parameter `t ∈ [0, 1]`.
///
/// `x` interpolates linearly. `y` is the straight-line interpolation raised by a
/// `-4(t-0.5)² + 1` bump, scaled so the apex sits `arc_height` above the higher
/// endpoint (higher = smaller `y`).
pub fn arc_point(start: Point, end: Point, arc_height: f32, t: f32) -> Point {
    let x = start.x + (end.x - start.x) * t;
    let base_y = start.y + (end.y - start.y) * t;
    let apex_y = start.y.min(end.y) - arc_height;
    let mid_y = (start.y + end.y) * 0.5;
    let peak_offset = mid_y - apex_y;
    let bump = -4.0 * (t - 0.5) * (t - 0.5) + 1.0;
    Point::new(x, base_y - peak_offset * bump)
}

/// Sample [`ARC_SAMPLES`] circles along the jump parabola against every obstacle.
pub fn arc_is_clear(
    start: Point,
    end: Point,
    arc_height: f32,
    radius: f32,
    obstacles: &[Obstacle],
) -> bool {
    (0..ARC_SAMPLES).all(|i| {
        let t = i as f32 / (ARC_SAMPLES - 1) as f32;
        let p = arc_point(start, end, arc_height, t);
        !circle_hits_any(p, radius, obstacles, None)
    })
}

/// A closed horizontal interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub left: f32,
    pub right: f32,
}

impl Span {
    #[inline]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn mid(&self) -> f32 {
        (self.left + self.right) * 0.5
    }
}

/// Remove every blocked interval from `span`.
///
/// Blocked intervals may overlap and arrive unsorted; they are sorted by left edge
/// and merged first. Returns the free pieces in left-to-right order; pieces with
/// non-positive width are dropped.
pub fn subtract_spans(span: Span, mut blocked: Vec<Span>) -> Vec<Span> {
    blocked.sort_by(|a, b| a.left.total_cmp(&b.left));

    let mut merged: Vec<Span> = Vec::with_capacity(blocked.len());
    for b in blocked {
        match merged.last_mut() {
            Some(last) if b.left <= last.right => last.right = last.right.max(b.right),
            _ => merged.push(b),
        }
    }

    let mut free = Vec::new();
    let mut cursor = span.left;
    for b in merged {
        if b.right <= cursor {
            continue;
        }
        if b.left >= span.right {
            break;
        }
        if b.left > cursor {
            free.push(Span::new(cursor, b.left));
        }
        cursor = cursor.max(b.right);
    }
    if cursor < span.right {
        free.push(Span::new(cursor, span.right));
    }
    free
}
