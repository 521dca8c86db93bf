use super::error::{Error, Result};

use cgmath::prelude::*;
use cgmath::{BaseFloat, Point2, Vector2};

#[cfg(feature="serialize")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
///
/// Overlap tests treat each axis as the half-open interval `[min, max)`, so boxes which merely
/// touch along an edge do not intersect.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(Deserialize, Serialize))]
pub struct Bounds<Point> {
    pub min: Point,
    pub max: Point
}

impl<Point> Bounds<Point>
where
    Point: EuclideanSpace + Copy
{
    pub fn new(min: Point, max: Point) -> Self {
        Self{min, max}
    }

    pub fn size(self) -> Point::Diff {
        self.max - self.min
    }
}

impl<S> Bounds<Point2<S>>
where
    S: BaseFloat
{
    pub fn overlaps(self, other: Bounds<Point2<S>>) -> bool {
        self.min.x < other.max.x && other.min.x < self.max.x &&
        self.min.y < other.max.y && other.min.y < self.max.y
    }

    /// The point inside (or on the edge of) these bounds which is nearest to `point`
    pub fn clamp_point(self, point: Point2<S>) -> Point2<S> {
        Point2::new(
            point.x.max(self.min.x).min(self.max.x),
            point.y.max(self.min.y).min(self.max.y))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(Deserialize, Serialize))]
pub struct Circle<S> {
    pub center: Point2<S>,
    pub radius: S
}

/// A line segment, parameterized as `start + t * (end - start)` for `t` in `[0, 1]`
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(Deserialize, Serialize))]
pub struct Segment<S> {
    pub start: Point2<S>,
    pub end: Point2<S>
}

impl<S> Segment<S>
where
    S: BaseFloat
{
    /// Fails for non-finite or coincident endpoints
    pub fn new(start: Point2<S>, end: Point2<S>) -> Result<Self> {
        let segment = Self{start, end};
        segment.validate()?;
        Ok(segment)
    }

    fn validate(&self) -> Result<()> {
        check_finite(&[self.start.x, self.start.y, self.end.x, self.end.y])?;
        if self.start == self.end {
            return Err(Error::InvalidShape("segment must have non-zero length"));
        }
        Ok(())
    }

    pub fn delta(self) -> Vector2<S> {
        self.end - self.start
    }

    pub fn point_at(self, t: S) -> Point2<S> {
        self.start + self.delta() * t
    }
}

/// The geometry of an item registered in a [`World`](crate::World)
///
/// Prefer the validating constructors ([`Shape::circle`], [`Shape::rect`], [`Shape::segment`]) over
/// building variants directly; the world rejects shapes which fail [`Shape::validate`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(Deserialize, Serialize))]
pub enum Shape<S> {
    Circle(Circle<S>),
    Rect(Bounds<Point2<S>>),
    Segment(Segment<S>)
}

fn check_finite<S: BaseFloat>(values: &[S]) -> Result<()> {
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(Error::InvalidShape("coordinates must be finite"))
    }
}

impl<S> Shape<S>
where
    S: BaseFloat
{
    pub fn circle(x: S, y: S, r: S) -> Result<Self> {
        Shape::Circle(Circle{center: Point2::new(x, y), radius: r}).validated()
    }

    pub fn rect(x: S, y: S, w: S, h: S) -> Result<Self> {
        check_finite(&[w, h])?;
        Shape::Rect(Bounds::new(Point2::new(x, y), Point2::new(x + w, y + h))).validated()
    }

    pub fn segment(x1: S, y1: S, x2: S, y2: S) -> Result<Self> {
        Segment::new(Point2::new(x1, y1), Point2::new(x2, y2)).map(Shape::Segment)
    }

    /// Checks that coordinates are finite, extents positive and segments non-degenerate
    ///
    /// Shapes built through the constructors always pass; variants assembled by hand are checked
    /// again whenever they enter a [`World`](crate::World).
    pub fn validate(&self) -> Result<()> {
        match *self {
            Shape::Circle(Circle{center, radius}) => {
                check_finite(&[center.x, center.y, radius])?;
                if radius <= S::zero() {
                    return Err(Error::InvalidShape("circle radius must be positive"));
                }
            }
            Shape::Rect(Bounds{min, max}) => {
                check_finite(&[min.x, min.y, max.x, max.y])?;
                if max.x <= min.x || max.y <= min.y {
                    return Err(Error::InvalidShape("box width and height must be positive"));
                }
            }
            Shape::Segment(segment) => segment.validate()?
        }
        Ok(())
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Axis-aligned bounds of the shape; circles report their enclosing square
    pub fn bounds(&self) -> Bounds<Point2<S>> {
        match *self {
            Shape::Circle(Circle{center, radius}) => Bounds::new(
                Point2::new(center.x - radius, center.y - radius),
                Point2::new(center.x + radius, center.y + radius)),
            Shape::Rect(bounds) => bounds,
            Shape::Segment(Segment{start, end}) => Bounds::new(
                Point2::new(start.x.min(end.x), start.y.min(end.y)),
                Point2::new(start.x.max(end.x), start.y.max(end.y)))
        }
    }

    pub fn intersects(&self, other: &Shape<S>) -> Option<Contact<S>> {
        intersect(self, other)
    }
}

/// Extra information produced by a positive intersection test
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Contact<S> {
    /// Boxes (or a box and a circle) overlap
    Overlap,
    /// Circle-circle response: the center offset from the first circle to the second, scaled by
    /// `1 / sqrt((r1 + r2)^2 - d^2)`
    ///
    /// This is a push-apart hint which grows as penetration shrinks; it is not a minimum
    /// translation vector and must be rescaled before being used for contact resolution.
    Push(Vector2<S>),
    /// Entry and exit times along the segment
    ///
    /// For circles these are the unclipped times at which the segment's supporting line enters and
    /// leaves the circle; for boxes they are clipped to `[0, 1]`.
    Interval(S, S),
    /// Time along the first segment at which it crosses the second
    Crossing(S)
}

#[inline]
fn cross<S: BaseFloat>(lhs: Vector2<S>, rhs: Vector2<S>) -> S {
    lhs.x * rhs.y - lhs.y * rhs.x
}

pub fn rect_rect<S: BaseFloat>(a: &Bounds<Point2<S>>, b: &Bounds<Point2<S>>) -> bool {
    a.overlaps(*b)
}

pub fn rect_circle<S: BaseFloat>(rect: &Bounds<Point2<S>>, circle: &Circle<S>) -> bool {
    let nearest = rect.clamp_point(circle.center);
    if nearest == circle.center {
        return true;
    }
    (circle.center - nearest).magnitude2() <= circle.radius * circle.radius
}

pub fn circle_circle<S: BaseFloat>(a: &Circle<S>, b: &Circle<S>) -> Option<Vector2<S>> {
    let offset = b.center - a.center;
    let distance2 = offset.magnitude2();
    let reach = a.radius + b.radius;
    let reach2 = reach * reach;
    if distance2 <= reach2 {
        Some(offset * (S::one() / (reach2 - distance2).sqrt()))
    } else {
        None
    }
}

/// Times at which the segment's supporting line enters and leaves the circle
///
/// Returns `None` when the line passes entirely outside the circle. The times are not clipped to
/// the segment.
pub fn line_circle_times<S: BaseFloat>(segment: &Segment<S>, circle: &Circle<S>) -> Option<(S, S)> {
    let delta = segment.delta();
    let length2 = delta.magnitude2();
    let offset = segment.start - circle.center;
    let radius2 = circle.radius * circle.radius;

    if length2 == S::zero() {
        return if offset.magnitude2() <= radius2 {
            Some((S::neg_infinity(), S::infinity()))
        } else {
            None
        };
    }

    // parameter of the point on the line nearest the center, and that point's squared distance
    let t_mid = -offset.dot(delta) / length2;
    let height2 = (offset + delta * t_mid).magnitude2();
    if height2 > radius2 {
        return None;
    }

    let half_width = ((radius2 - height2) / length2).sqrt();
    Some((t_mid - half_width, t_mid + half_width))
}

pub fn segment_circle<S: BaseFloat>(segment: &Segment<S>, circle: &Circle<S>) -> Option<(S, S)> {
    line_circle_times(segment, circle)
        .filter(|&(t1, t2)| t1 <= S::one() && t2 >= S::zero())
}

/// Collinear (and parallel) segments never intersect, even when they overlap
pub fn segment_segment<S: BaseFloat>(a: &Segment<S>, b: &Segment<S>) -> Option<S> {
    let r = a.delta();
    let s = b.delta();
    let denominator = cross(r, s);
    if denominator == S::zero() {
        return None;
    }

    let offset = b.start - a.start;
    let t = cross(offset, s) / denominator;
    let u = cross(offset, r) / denominator;
    let unit = |x: S| x >= S::zero() && x <= S::one();
    if unit(t) && unit(u) {
        Some(t)
    } else {
        None
    }
}

/// Slab test; returns entry and exit times clipped to `[0, 1]`
pub fn segment_rect<S: BaseFloat>(segment: &Segment<S>, rect: &Bounds<Point2<S>>) -> Option<(S, S)> {
    let delta = segment.delta();
    let start = segment.start;
    let mut t_enter = S::neg_infinity();
    let mut t_exit = S::infinity();

    for &(origin, step, min, max) in &[
        (start.x, delta.x, rect.min.x, rect.max.x),
        (start.y, delta.y, rect.min.y, rect.max.y)]
    {
        if step == S::zero() {
            // parallel to this slab: inside for every t, or never
            if origin < min || origin > max {
                return None;
            }
            continue;
        }

        let (near, far) = if step > S::zero() {
            ((min - origin) / step, (max - origin) / step)
        } else {
            ((max - origin) / step, (min - origin) / step)
        };
        t_enter = t_enter.max(near);
        t_exit = t_exit.min(far);
    }

    if t_enter <= t_exit && t_enter <= S::one() && t_exit >= S::zero() {
        Some((t_enter.max(S::zero()), t_exit.min(S::one())))
    } else {
        None
    }
}

/// Tests two shapes for intersection
///
/// Dispatch is symmetric: mixed pairs are reordered so that one implementation serves both
/// argument orders. Segment times always refer to the segment argument (the first one, for two
/// segments).
pub fn intersect<S: BaseFloat>(a: &Shape<S>, b: &Shape<S>) -> Option<Contact<S>> {
    match (a, b) {
        (Shape::Rect(a), Shape::Rect(b)) => {
            if rect_rect(a, b) { Some(Contact::Overlap) } else { None }
        }
        (Shape::Rect(rect), Shape::Circle(circle)) | (Shape::Circle(circle), Shape::Rect(rect)) => {
            if rect_circle(rect, circle) { Some(Contact::Overlap) } else { None }
        }
        (Shape::Circle(a), Shape::Circle(b)) => circle_circle(a, b).map(Contact::Push),
        (Shape::Segment(segment), Shape::Circle(circle)) | (Shape::Circle(circle), Shape::Segment(segment)) => {
            segment_circle(segment, circle).map(|(t1, t2)| Contact::Interval(t1, t2))
        }
        (Shape::Segment(a), Shape::Segment(b)) => segment_segment(a, b).map(Contact::Crossing),
        (Shape::Segment(segment), Shape::Rect(rect)) | (Shape::Rect(rect), Shape::Segment(segment)) => {
            segment_rect(segment, rect).map(|(t1, t2)| Contact::Interval(t1, t2))
        }
    }
}
