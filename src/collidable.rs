use super::geom::{Bounds, Transform};
use super::key::{BroadphaseItem, BroadphasePair, FixtureKey};
use super::shape::Shape;
use super::traits::{ObjectID, Real};

use cgmath::Point2;

/// One shape attached to a collidable
pub trait Fixture<S: Real> {
    type ID: ObjectID;

    fn id(&self) -> Self::ID;
    fn shape(&self) -> &dyn Shape<S>;
}

/// An object owning zero or more fixtures, placed in the world by a transform
///
/// Implemented by the caller's body type.  Fixture world bounds are `shape.bounds(transform)`.
pub trait Collidable {
    type ID: ObjectID;
    type Scalar: Real;
    type Fixture: Fixture<Self::Scalar>;

    fn id(&self) -> Self::ID;
    fn transform(&self) -> &Transform<Self::Scalar>;
    fn fixtures(&self) -> &[Self::Fixture];

    fn key(&self, fixture: &Self::Fixture) -> Key<Self>
    where
        Self: Sized
    {
        FixtureKey::new(self.id(), fixture.id())
    }

    /// Fresh, unexpanded world bounds of `fixture`
    fn fixture_bounds(&self, fixture: &Self::Fixture) -> Aabb<Self>
    where
        Self: Sized
    {
        fixture.shape().bounds(self.transform())
    }
}

pub type FixtureID<C> = <<C as Collidable>::Fixture as Fixture<<C as Collidable>::Scalar>>::ID;
pub type Key<C> = FixtureKey<<C as Collidable>::ID, FixtureID<C>>;
pub type Item<C> = BroadphaseItem<<C as Collidable>::ID, FixtureID<C>>;
pub type Pair<C> = BroadphasePair<<C as Collidable>::ID, FixtureID<C>>;
pub type Aabb<C> = Bounds<Point2<<C as Collidable>::Scalar>>;
