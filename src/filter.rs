use super::collidable::{Aabb, Collidable, Key};
use super::geom::Ray;

/// Caller-supplied veto over candidate results
///
/// Each method is consulted once per candidate before it is added to the result list.  All
/// default to allowing everything.
pub trait BroadphaseFilter<C: Collidable> {
    fn allow_pair(&self, _first: &Key<C>, _second: &Key<C>) -> bool {
        true
    }

    fn allow_bounds(&self, _bounds: &Aabb<C>, _item: &Key<C>) -> bool {
        true
    }

    fn allow_ray(&self, _ray: &Ray<C::Scalar>, _length: C::Scalar, _item: &Key<C>) -> bool {
        true
    }
}

/// Allows every candidate
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFilter;

impl<C: Collidable> BroadphaseFilter<C> for DefaultFilter {}

/// Adapts a closure into a pair-only filter; AABB and ray candidates are always allowed
pub struct PairFilter<F>(pub F);

impl<C, F> BroadphaseFilter<C> for PairFilter<F>
where
    C: Collidable,
    F: Fn(&Key<C>, &Key<C>) -> bool
{
    fn allow_pair(&self, first: &Key<C>, second: &Key<C>) -> bool {
        (self.0)(first, second)
    }
}

/// Adapts a closure into an item filter applied to both AABB and ray candidates
pub struct ItemFilter<F>(pub F);

impl<C, F> BroadphaseFilter<C> for ItemFilter<F>
where
    C: Collidable,
    F: Fn(&Key<C>) -> bool
{
    fn allow_bounds(&self, _bounds: &Aabb<C>, item: &Key<C>) -> bool {
        (self.0)(item)
    }

    fn allow_ray(&self, _ray: &Ray<C::Scalar>, _length: C::Scalar, item: &Key<C>) -> bool {
        (self.0)(item)
    }
}
