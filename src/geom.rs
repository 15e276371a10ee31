use super::error::Error;
use super::traits::Real;

use cgmath::{Point2, Rad, Vector2};
use cgmath::prelude::*;

/// Inclusive containment test
pub trait Containment<RHS = Self> {
    fn contains(&self, other: RHS) -> bool;
}

/// An axis-aligned bounding box
///
/// In 2D this is `{min.x, min.y, max.x, max.y}` with `min <= max` on both axes.  Bounds stored
/// by the detectors may be "fattened" (see [`Bounds::expand`]) so that small movements do not
/// require reindexing.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
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
    S: Real
{
    /// Validating constructor; fails if `min > max` on either axis
    pub fn try_new(min: Point2<S>, max: Point2<S>) -> Result<Self, Error> {
        if min.x > max.x || min.y > max.y {
            return Err(Error::InvertedBounds);
        }
        Ok(Self{min, max})
    }

    pub fn from_coords(min_x: S, min_y: S, max_x: S, max_y: S) -> Self {
        Self::from_points(Point2::new(min_x, min_y), Point2::new(max_x, max_y))
    }

    /// The smallest bounds containing both points, in any order
    pub fn from_points(a: Point2<S>, b: Point2<S>) -> Self {
        Self{
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y))
        }
    }

    /// The smallest bounds containing every point; `None` for an empty iterator
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point2<S>>
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self{min: first, max: first}, |bounds, point| {
            bounds.union(&Self{min: point, max: point})
        }))
    }

    /// The degenerate bounds at the origin
    pub fn zero() -> Self {
        Self{min: Point2::origin(), max: Point2::origin()}
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x &&
        self.max.x >= other.min.x &&
        self.min.y <= other.max.y &&
        self.max.y >= other.min.y
    }

    pub fn union(&self, other: &Self) -> Self {
        Self{
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y))
        }
    }

    /// Grows the bounds by `expansion` in width and height (`expansion / 2` on every side)
    pub fn expand(&mut self, expansion: S) {
        let half = expansion / (S::one() + S::one());
        self.min.x -= half;
        self.min.y -= half;
        self.max.x += half;
        self.max.y += half;
    }

    pub fn expanded(mut self, expansion: S) -> Self {
        self.expand(expansion);
        self
    }

    pub fn translate(&mut self, offset: Vector2<S>) {
        self.min += offset;
        self.max += offset;
    }

    pub fn perimeter(&self) -> S {
        let size = self.size();
        (size.x + size.y) * (S::one() + S::one())
    }

    pub fn center(&self) -> Point2<S> {
        self.min.midpoint(self.max)
    }

    /// Sum of how far `other` sticks out of `self` on each of the four sides
    ///
    /// Zero iff `self` contains `other`.
    pub fn enlargement(&self, other: &Self) -> S {
        let zero = S::zero();
        (self.min.x - other.min.x).max(zero) +
        (other.max.x - self.max.x).max(zero) +
        (self.min.y - other.min.y).max(zero) +
        (other.max.y - self.max.y).max(zero)
    }

    pub fn is_finite(&self) -> bool {
        self.min.x.is_finite() &&
        self.min.y.is_finite() &&
        self.max.x.is_finite() &&
        self.max.y.is_finite()
    }
}

impl<S> Containment for Bounds<Point2<S>>
where
    S: Real
{
    fn contains(&self, other: Bounds<Point2<S>>) -> bool {
        self.min.x <= other.min.x &&
        self.min.y <= other.min.y &&
        self.max.x >= other.max.x &&
        self.max.y >= other.max.y
    }
}

impl<S> Containment<Point2<S>> for Bounds<Point2<S>>
where
    S: Real
{
    fn contains(&self, point: Point2<S>) -> bool {
        self.min.x <= point.x &&
        self.min.y <= point.y &&
        self.max.x >= point.x &&
        self.max.y >= point.y
    }
}

/// A rigid 2D transform: rotation about the origin followed by a translation
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform<S> {
    pub translation: Vector2<S>,
    cos: S,
    sin: S
}

impl<S> Transform<S>
where
    S: Real
{
    pub fn new(translation: Vector2<S>, rotation: Rad<S>) -> Self {
        let (sin, cos) = rotation.0.sin_cos();
        Self{translation, cos, sin}
    }

    pub fn identity() -> Self {
        Self{translation: Vector2::zero(), cos: S::one(), sin: S::zero()}
    }

    pub fn from_translation(x: S, y: S) -> Self {
        Self{translation: Vector2::new(x, y), cos: S::one(), sin: S::zero()}
    }

    pub fn rotation(&self) -> Rad<S> {
        Rad(self.sin.atan2(self.cos))
    }

    pub fn set_rotation(&mut self, rotation: Rad<S>) {
        let (sin, cos) = rotation.0.sin_cos();
        self.cos = cos;
        self.sin = sin;
    }

    pub fn translate(&mut self, offset: Vector2<S>) {
        self.translation += offset;
    }

    pub fn rotate_vector(&self, v: Vector2<S>) -> Vector2<S> {
        Vector2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y)
    }

    pub fn transform_point(&self, p: Point2<S>) -> Point2<S> {
        Point2::from_vec(self.rotate_vector(p.to_vec()) + self.translation)
    }
}

impl<S: Real> Default for Transform<S> {
    fn default() -> Self {
        Self::identity()
    }
}

/// A half-line with a normalized direction
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ray<S> {
    origin: Point2<S>,
    direction: Vector2<S>
}

impl<S> Ray<S>
where
    S: Real
{
    /// Fails with [`Error::ZeroDirection`] if `direction` cannot be normalized
    pub fn new(origin: Point2<S>, direction: Vector2<S>) -> Result<Self, Error> {
        let magnitude = direction.magnitude();
        if !(magnitude > S::zero()) || !magnitude.is_finite() {
            return Err(Error::ZeroDirection);
        }
        Ok(Self{origin, direction: direction / magnitude})
    }

    pub fn from_angle(origin: Point2<S>, angle: Rad<S>) -> Self {
        let (sin, cos) = angle.0.sin_cos();
        Self{origin, direction: Vector2::new(cos, sin)}
    }

    pub fn origin(&self) -> Point2<S> {
        self.origin
    }

    pub fn direction(&self) -> Vector2<S> {
        self.direction
    }
}

/// A ray query against many bounds
///
/// Precomputes the inverse direction and the bounds of the ray segment so each candidate costs
/// one overlap test and one slab test.  A non-positive `length` means the ray is unbounded.
#[derive(Copy, Clone, Debug)]
pub struct RayCaster<S> {
    origin: Point2<S>,
    length: S,
    inv_dx: S,
    inv_dy: S,
    bounds: Bounds<Point2<S>>
}

impl<S> RayCaster<S>
where
    S: Real
{
    pub fn new(ray: &Ray<S>, length: S) -> Self {
        let length = if length <= S::zero() { <S as num_traits::Float>::max_value() } else { length };
        let origin = ray.origin();
        let direction = ray.direction();
        let end = Point2::new(origin.x + direction.x * length, origin.y + direction.y * length);
        Self{
            origin,
            length,
            inv_dx: S::one() / direction.x,
            inv_dy: S::one() / direction.y,
            bounds: Bounds::from_points(origin, end)
        }
    }

    /// The bounds of the ray segment
    pub fn bounds(&self) -> &Bounds<Point2<S>> {
        &self.bounds
    }

    pub fn length(&self) -> S {
        self.length
    }

    /// Slab test
    pub fn intersects(&self, bounds: &Bounds<Point2<S>>) -> bool {
        let tx1 = (bounds.min.x - self.origin.x) * self.inv_dx;
        let tx2 = (bounds.max.x - self.origin.x) * self.inv_dx;
        let ty1 = (bounds.min.y - self.origin.y) * self.inv_dy;
        let ty2 = (bounds.max.y - self.origin.y) * self.inv_dy;

        let tmin = tx1.min(tx2).max(ty1.min(ty2));
        let tmax = tx1.max(tx2).min(ty1.max(ty2));

        if tmax < S::zero() {
            return false;
        }
        if tmin > self.length {
            return false;
        }
        tmax >= tmin
    }

    /// Overlap with the segment bounds followed by the slab test
    pub fn hits(&self, bounds: &Bounds<Point2<S>>) -> bool {
        self.bounds.overlaps(bounds) && self.intersects(bounds)
    }
}
