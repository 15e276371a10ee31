// mlodato, 20260915

use super::brute_force::BruteForce;
use super::collidable::{Aabb, Collidable, Item, Key, Pair};
use super::dynamic_tree::DynamicTree;
use super::error::{Error, InvariantViolation};
use super::filter::BroadphaseFilter;
use super::geom::{Bounds, Ray, Transform};
use super::lazy_tree::LazyTree;
use super::sap::SweepAndPrune;
use super::shape::Shape;
use super::traits::Real;
use super::{DEFAULT_CAPACITY, DEFAULT_EXPANSION};

use cgmath::Vector2;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Typical number of candidate pairs per indexed fixture
pub const COLLISIONS_PER_OBJECT: usize = 4;

const RAYCAST_DENSITY: f64 = 0.02;

/// Initial capacity for pairwise results over `n` fixtures
pub fn estimated_pairs(n: usize) -> usize {
    n * COLLISIONS_PER_OBJECT
}

/// Initial capacity for ray results over `n` fixtures
pub fn estimated_raycast_hits(n: usize) -> usize {
    (n as f64 * RAYCAST_DENSITY).max(1.0) as usize
}

pub(crate) fn validate_expansion<S: Real>(expansion: S) -> Result<S, Error> {
    if expansion >= S::zero() && expansion.is_finite() {
        Ok(expansion)
    } else {
        Err(Error::NegativeExpansion)
    }
}

/// Fresh, unexpanded bounds of every fixture of `collidable`; `None` without fixtures
pub fn collidable_bounds<C: Collidable>(collidable: &C) -> Option<Aabb<C>> {
    collidable.fixtures().iter()
        .map(|fixture| collidable.fixture_bounds(fixture))
        .fold(None, |acc: Option<Aabb<C>>, bounds| match acc {
            Some(acc) => Some(acc.union(&bounds)),
            None => Some(bounds)
        })
}

/// A broadphase index over the fixtures of collidables of type `C`
///
/// Every detector reports a superset of the truly overlapping fixture pairs.  Pairs are never
/// reported for a fixture with itself, never in both orientations and never for two fixtures of
/// the same collidable.
///
/// Adding a fixture that is already present updates it and updating an absent fixture adds it.
pub trait BroadphaseDetector<C: Collidable> {
    /// Inserts or updates one fixture
    fn add_fixture(&mut self, collidable: &C, fixture: &C::Fixture);

    /// Removes one fixture by key; returns whether it was present
    fn remove_key(&mut self, key: &Key<C>) -> bool;

    fn contains_key(&self, key: &Key<C>) -> bool;

    /// The stored (possibly expanded) bounds of a fixture, if present
    fn indexed_bounds(&self, key: &Key<C>) -> Option<Aabb<C>>;

    fn clear(&mut self);

    /// Number of fixtures currently indexed
    fn len(&self) -> usize;

    /// All overlapping pairs of indexed fixtures allowed by `filter`
    fn detect(&mut self, filter: &dyn BroadphaseFilter<C>) -> Vec<Pair<C>>;

    /// All indexed fixtures whose bounds overlap `bounds`
    fn detect_bounds(&mut self, bounds: &Aabb<C>, filter: &dyn BroadphaseFilter<C>) -> Vec<Item<C>>;

    /// All indexed fixtures whose bounds are hit by `ray` within `length`
    ///
    /// A non-positive `length` casts an unbounded ray.
    fn raycast(&mut self, ray: &Ray<C::Scalar>, length: C::Scalar, filter: &dyn BroadphaseFilter<C>)
        -> Vec<Item<C>>;

    fn expansion(&self) -> C::Scalar;

    /// Sets the margin added to the width and height of stored bounds
    ///
    /// Detectors which do not support expansion accept and ignore the value.
    fn set_expansion(&mut self, expansion: C::Scalar) -> Result<(), Error>;

    fn supports_expansion(&self) -> bool;

    /// Translates every stored bounds by `offset`, e.g. to re-center the world
    fn shift(&mut self, offset: Vector2<C::Scalar>);

    /// Checks the detector's internal invariants
    fn validate(&self) -> Result<(), InvariantViolation> {
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update_fixture(&mut self, collidable: &C, fixture: &C::Fixture) {
        self.add_fixture(collidable, fixture);
    }

    fn add(&mut self, collidable: &C) {
        for fixture in collidable.fixtures() {
            self.add_fixture(collidable, fixture);
        }
    }

    fn update(&mut self, collidable: &C) {
        for fixture in collidable.fixtures() {
            self.update_fixture(collidable, fixture);
        }
    }

    /// Removes every fixture currently attached to `collidable`; returns whether any was present
    ///
    /// Fixtures detached from the collidable since they were added are not removed.
    fn remove(&mut self, collidable: &C) -> bool {
        let mut removed = false;
        for fixture in collidable.fixtures() {
            removed |= self.remove_key(&collidable.key(fixture));
        }
        removed
    }

    fn remove_fixture(&mut self, collidable: &C, fixture: &C::Fixture) -> bool {
        self.remove_key(&collidable.key(fixture))
    }

    fn contains_fixture(&self, collidable: &C, fixture: &C::Fixture) -> bool {
        self.contains_key(&collidable.key(fixture))
    }

    /// True iff the collidable has fixtures and every one of them is indexed
    fn contains(&self, collidable: &C) -> bool {
        let fixtures = collidable.fixtures();
        !fixtures.is_empty() && fixtures.iter().all(|fixture| self.contains_fixture(collidable, fixture))
    }

    /// Indexed bounds of the fixture, or fresh unexpanded bounds when it is not indexed
    fn fixture_bounds(&self, collidable: &C, fixture: &C::Fixture) -> Aabb<C> {
        self.indexed_bounds(&collidable.key(fixture))
            .unwrap_or_else(|| collidable.fixture_bounds(fixture))
    }

    /// Union of [`fixture_bounds`](Self::fixture_bounds) over all fixtures; the degenerate box at
    /// the origin for a collidable without fixtures
    fn bounds(&self, collidable: &C) -> Aabb<C> {
        collidable.fixtures().iter()
            .map(|fixture| self.fixture_bounds(collidable, fixture))
            .fold(None, |acc: Option<Aabb<C>>, bounds| match acc {
                Some(acc) => Some(acc.union(&bounds)),
                None => Some(bounds)
            })
            .unwrap_or_else(Bounds::zero)
    }

    /// Overlap test of the current fresh bounds of two collidables, bypassing the index
    fn detect_collidables(&self, first: &C, second: &C) -> bool {
        match (collidable_bounds(first), collidable_bounds(second)) {
            (Some(a), Some(b)) => a.overlaps(&b),
            _ => false
        }
    }

    /// Overlap test of two shapes at the given transforms, bypassing the index
    fn detect_shapes(
        &self,
        first: &dyn Shape<C::Scalar>,
        first_transform: &Transform<C::Scalar>,
        second: &dyn Shape<C::Scalar>,
        second_transform: &Transform<C::Scalar>) -> bool
    {
        first.bounds(first_transform).overlaps(&second.bounds(second_transform))
    }
}

/// A detector which can refresh many collidables at once before the next pass
pub trait BatchBroadphaseDetector<C: Collidable>: BroadphaseDetector<C> {
    /// Recomputes the bounds of every fixture of `collidables` and schedules a full rebuild
    fn batch_update(&mut self, collidables: &[C]);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    BruteForce,
    DynamicTree,
    SweepAndPrune,
    LazyTree
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::BruteForce,
        Algorithm::DynamicTree,
        Algorithm::SweepAndPrune,
        Algorithm::LazyTree];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BruteForce => "brute_force",
            Algorithm::DynamicTree => "dynamic_tree",
            Algorithm::SweepAndPrune => "sap",
            Algorithm::LazyTree => "lazy_tree"
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Algorithm::ALL.iter()
            .copied()
            .find(|algorithm| algorithm.name() == s)
            .ok_or(Error::UnknownAlgorithm)
    }
}

/// Configures and constructs detectors
///
/// ```
/// use broadphase2d::{Algorithm, Body, BroadphaseDetector, DetectorBuilder};
///
/// let detector: Box<dyn BroadphaseDetector<Body<f64>>> = DetectorBuilder::new()
///     .with_expansion(0.1)
///     .with_capacity(1024)
///     .build(Algorithm::DynamicTree)
///     .unwrap();
/// assert!(detector.is_empty());
/// ```
#[derive(Copy, Clone, Debug)]
pub struct DetectorBuilder<S> {
    expansion: S,
    capacity: usize
}

impl<S: Real> Default for DetectorBuilder<S> {
    fn default() -> Self {
        Self{
            expansion: num_traits::cast(DEFAULT_EXPANSION).unwrap_or_else(S::zero),
            capacity: DEFAULT_CAPACITY
        }
    }
}

impl<S: Real> DetectorBuilder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expansion(&mut self, expansion: S) -> &mut Self {
        self.expansion = expansion;
        self
    }

    pub fn with_capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn build_brute_force<C>(&self) -> Result<BruteForce<C>, Error>
    where
        C: Collidable<Scalar = S>
    {
        validate_expansion(self.expansion)?;
        Ok(BruteForce::with_capacity(self.capacity))
    }

    pub fn build_dynamic_tree<C>(&self) -> Result<DynamicTree<C>, Error>
    where
        C: Collidable<Scalar = S>
    {
        let mut detector = DynamicTree::with_capacity(self.capacity);
        detector.set_expansion(self.expansion)?;
        Ok(detector)
    }

    pub fn build_sap<C>(&self) -> Result<SweepAndPrune<C>, Error>
    where
        C: Collidable<Scalar = S>
    {
        let mut detector = SweepAndPrune::with_capacity(self.capacity);
        detector.set_expansion(self.expansion)?;
        Ok(detector)
    }

    pub fn build_lazy_tree<C>(&self) -> Result<LazyTree<C>, Error>
    where
        C: Collidable<Scalar = S>
    {
        validate_expansion(self.expansion)?;
        Ok(LazyTree::with_capacity(self.capacity))
    }

    pub fn build<C>(&self, algorithm: Algorithm) -> Result<Box<dyn BroadphaseDetector<C>>, Error>
    where
        C: Collidable<Scalar = S> + 'static
    {
        let detector: Box<dyn BroadphaseDetector<C>> = match algorithm {
            Algorithm::BruteForce => Box::new(self.build_brute_force::<C>()?),
            Algorithm::DynamicTree => Box::new(self.build_dynamic_tree::<C>()?),
            Algorithm::SweepAndPrune => Box::new(self.build_sap::<C>()?),
            Algorithm::LazyTree => Box::new(self.build_lazy_tree::<C>()?)
        };
        debug!("built {} detector (expansion {:?}, capacity {})", algorithm, self.expansion, self.capacity);
        Ok(detector)
    }
}
