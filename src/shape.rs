use super::geom::{Bounds, Transform};
use super::traits::Real;

use cgmath::{Point2, Vector2};
use cgmath::prelude::*;

/// Geometry that can be bounded in world space
///
/// The broadphase never inspects a shape beyond these two methods.  `radius` is only used as an
/// ordering heuristic by the lazy tree.
pub trait Shape<S: Real> {
    fn bounds(&self, transform: &Transform<S>) -> Bounds<Point2<S>>;
    fn radius(&self) -> S;
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Circle<S> {
    pub center: Point2<S>,
    pub radius: S
}

impl<S: Real> Circle<S> {
    pub fn new(radius: S) -> Self {
        Self{center: Point2::origin(), radius}
    }

    pub fn with_center(center: Point2<S>, radius: S) -> Self {
        Self{center, radius}
    }
}

impl<S: Real> Shape<S> for Circle<S> {
    fn bounds(&self, transform: &Transform<S>) -> Bounds<Point2<S>> {
        let center = transform.transform_point(self.center);
        let r = Vector2::new(self.radius, self.radius);
        Bounds::new(center - r, center + r)
    }

    fn radius(&self) -> S {
        self.center.to_vec().magnitude() + self.radius
    }
}

/// An oriented box given by its local center and half extents
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rectangle<S> {
    pub center: Point2<S>,
    pub half_extents: Vector2<S>
}

impl<S: Real> Rectangle<S> {
    pub fn new(width: S, height: S) -> Self {
        let two = S::one() + S::one();
        Self{center: Point2::origin(), half_extents: Vector2::new(width / two, height / two)}
    }

    pub fn with_center(center: Point2<S>, width: S, height: S) -> Self {
        Self{center, ..Self::new(width, height)}
    }

    fn corners(&self) -> [Point2<S>; 4] {
        let (c, h) = (self.center, self.half_extents);
        [
            Point2::new(c.x - h.x, c.y - h.y),
            Point2::new(c.x + h.x, c.y - h.y),
            Point2::new(c.x + h.x, c.y + h.y),
            Point2::new(c.x - h.x, c.y + h.y),
        ]
    }
}

impl<S: Real> Shape<S> for Rectangle<S> {
    fn bounds(&self, transform: &Transform<S>) -> Bounds<Point2<S>> {
        let [a, b, c, d] = self.corners();
        let a = transform.transform_point(a);
        Bounds::new(a, a)
            .union(&Bounds::from_points(transform.transform_point(b), transform.transform_point(c)))
            .union(&Bounds::from_points(transform.transform_point(d), a))
    }

    fn radius(&self) -> S {
        self.center.to_vec().magnitude() + self.half_extents.magnitude()
    }
}

/// A convex polygon in local coordinates
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon<S> {
    pub vertices: Vec<Point2<S>>
}

impl<S: Real> Shape<S> for Polygon<S> {
    fn bounds(&self, transform: &Transform<S>) -> Bounds<Point2<S>> {
        Bounds::enclosing(self.vertices.iter().map(|&v| transform.transform_point(v)))
            .unwrap_or_else(|| {
                let origin = transform.transform_point(Point2::origin());
                Bounds::new(origin, origin)
            })
    }

    fn radius(&self) -> S {
        self.vertices.iter()
            .map(|v| v.to_vec().magnitude())
            .fold(S::zero(), S::max)
    }
}

/// Closed set of the concrete shapes above
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Geometry<S> {
    Circle(Circle<S>),
    Rectangle(Rectangle<S>),
    Polygon(Polygon<S>)
}

impl<S: Real> Geometry<S> {
    fn shape(&self) -> &dyn Shape<S> {
        match self {
            Geometry::Circle(shape) => shape,
            Geometry::Rectangle(shape) => shape,
            Geometry::Polygon(shape) => shape
        }
    }
}

impl<S: Real> Shape<S> for Geometry<S> {
    fn bounds(&self, transform: &Transform<S>) -> Bounds<Point2<S>> {
        self.shape().bounds(transform)
    }

    fn radius(&self) -> S {
        self.shape().radius()
    }
}

impl<S> From<Circle<S>> for Geometry<S> {
    fn from(shape: Circle<S>) -> Self {
        Geometry::Circle(shape)
    }
}

impl<S> From<Rectangle<S>> for Geometry<S> {
    fn from(shape: Rectangle<S>) -> Self {
        Geometry::Rectangle(shape)
    }
}

impl<S> From<Polygon<S>> for Geometry<S> {
    fn from(shape: Polygon<S>) -> Self {
        Geometry::Polygon(shape)
    }
}
