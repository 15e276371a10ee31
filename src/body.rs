use super::collidable::{Collidable, Fixture};
use super::geom::Transform;
use super::shape::{Geometry, Shape};
use super::traits::Real;

use cgmath::{Point2, Vector2};
use cgmath::prelude::*;

/// A shape attached to a [`Body`]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyFixture<S> {
    pub id: u32,
    pub geometry: Geometry<S>
}

impl<S: Real> Fixture<S> for BodyFixture<S> {
    type ID = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn shape(&self) -> &dyn Shape<S> {
        &self.geometry
    }
}

/// Minimal rigid body: an ID, a transform and a list of fixtures
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Body<S> {
    pub id: u32,
    pub transform: Transform<S>,
    pub fixtures: Vec<BodyFixture<S>>,
    next_fixture: u32
}

impl<S: Real> Body<S> {
    pub fn new(id: u32) -> Self {
        Self{id, transform: Transform::identity(), fixtures: Vec::new(), next_fixture: 0}
    }

    pub fn at(id: u32, x: S, y: S) -> Self {
        Self{id, transform: Transform::from_translation(x, y), fixtures: Vec::new(), next_fixture: 0}
    }

    pub fn with_fixture<G: Into<Geometry<S>>>(mut self, geometry: G) -> Self {
        self.add_fixture(geometry);
        self
    }

    /// Attaches a new fixture and returns its ID
    ///
    /// IDs are never reused, even after [`remove_fixture`](Self::remove_fixture).
    pub fn add_fixture<G: Into<Geometry<S>>>(&mut self, geometry: G) -> u32 {
        let id = self.next_fixture;
        self.next_fixture += 1;
        self.fixtures.push(BodyFixture{id, geometry: geometry.into()});
        id
    }

    /// Detaches a fixture; the caller remains responsible for removing it from any detector
    pub fn remove_fixture(&mut self, id: u32) -> Option<BodyFixture<S>> {
        let index = self.fixtures.iter().position(|fixture| fixture.id == id)?;
        Some(self.fixtures.remove(index))
    }

    pub fn fixture(&self, id: u32) -> Option<&BodyFixture<S>> {
        self.fixtures.iter().find(|fixture| fixture.id == id)
    }

    pub fn position(&self) -> Point2<S> {
        Point2::from_vec(self.transform.translation)
    }

    pub fn set_position(&mut self, x: S, y: S) {
        self.transform.translation = Vector2::new(x, y);
    }

    pub fn translate(&mut self, offset: Vector2<S>) {
        self.transform.translate(offset);
    }
}

impl<S: Real> Collidable for Body<S> {
    type ID = u32;
    type Scalar = S;
    type Fixture = BodyFixture<S>;

    fn id(&self) -> u32 {
        self.id
    }

    fn transform(&self) -> &Transform<S> {
        &self.transform
    }

    fn fixtures(&self) -> &[BodyFixture<S>] {
        &self.fixtures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Bounds;
    use crate::shape::{Circle, Rectangle};

    #[test]
    fn fixture_ids_are_unique() {
        let mut body = Body::<f64>::new(7)
            .with_fixture(Circle::new(1.0))
            .with_fixture(Rectangle::new(1.0, 1.0));
        assert_eq!(body.fixtures.iter().map(|f| f.id).collect::<Vec<_>>(), vec![0, 1]);
        assert!(body.remove_fixture(0).is_some());
        assert_eq!(body.add_fixture(Circle::new(2.0)), 2);
        assert!(body.fixture(0).is_none());
    }

    #[test]
    fn removed_fixture_ids_are_not_reused() {
        let mut body = Body::<f64>::new(3)
            .with_fixture(Circle::new(1.0))
            .with_fixture(Circle::new(2.0));
        let detached = body.remove_fixture(1).unwrap();
        let id = body.add_fixture(Rectangle::new(1.0, 1.0));
        assert_ne!(id, detached.id);
        assert_eq!(id, 2);
        assert_ne!(body.key(&detached), body.key(&body.fixtures[1]));
    }

    #[test]
    fn fixture_bounds_follow_transform() {
        let mut body = Body::<f64>::at(1, 0.0, 0.0).with_fixture(Circle::new(1.0));
        body.set_position(5.0, 0.0);
        let fixture = &body.fixtures[0];
        assert_eq!(body.fixture_bounds(fixture), Bounds::from_coords(4.0, -1.0, 6.0, 1.0));
        assert_eq!(body.key(fixture).collidable, 1);
    }
}
