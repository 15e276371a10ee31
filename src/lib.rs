// mlodato, 20260914

//! Interchangeable 2D broadphase collision detectors
//!
//! A broadphase indexes the axis-aligned bounds of every fixture of every collidable and proposes
//! candidate pairs whose bounds overlap.  Results are a superset of the truly intersecting pairs:
//! exact shape tests are left to the caller.  The same index answers AABB and ray queries.
//!
//! Four detectors implement [`BroadphaseDetector`]:
//!
//! * [`BruteForce`]: tests every pair with exact bounds; the reference for the others
//! * [`DynamicTree`]: an incrementally balanced AABB tree with expanded leaf bounds
//! * [`SweepAndPrune`]: proxies sorted along the x axis
//! * [`LazyTree`]: an AABB tree rebuilt during every pairwise pass
//!
//! ```
//! use broadphase2d::{Body, BroadphaseDetector, Circle, DefaultFilter, DynamicTree};
//!
//! let a = Body::at(0, 0.0, 0.0).with_fixture(Circle::new(1.0));
//! let mut b = Body::at(1, 5.0, 0.0).with_fixture(Circle::new(1.0));
//!
//! let mut detector = DynamicTree::new();
//! detector.add(&a);
//! detector.add(&b);
//! assert!(detector.detect(&DefaultFilter).is_empty());
//!
//! b.set_position(1.5, 0.0);
//! detector.update(&b);
//! assert_eq!(detector.detect(&DefaultFilter).len(), 1);
//! ```

extern crate cgmath;
extern crate num_traits;

#[macro_use]
extern crate log;

#[cfg(feature="parallel")]
extern crate rayon;

mod body;
mod brute_force;
mod collidable;
mod detector;
mod dynamic_tree;
mod error;
mod filter;
mod geom;
mod key;
mod lazy_tree;
mod sap;
mod shape;
mod traits;
mod tree;

pub use body::{Body, BodyFixture};
pub use brute_force::BruteForce;
pub use collidable::{Aabb, Collidable, Fixture, FixtureID, Item, Key, Pair};
pub use detector::{
    collidable_bounds,
    estimated_pairs,
    estimated_raycast_hits,
    Algorithm,
    BatchBroadphaseDetector,
    BroadphaseDetector,
    DetectorBuilder,
    COLLISIONS_PER_OBJECT};
pub use dynamic_tree::DynamicTree;
pub use error::{Error, InvariantViolation};
pub use filter::{BroadphaseFilter, DefaultFilter, ItemFilter, PairFilter};
pub use geom::{Bounds, Containment, Ray, RayCaster, Transform};
pub use key::{BroadphaseItem, BroadphasePair, FixtureKey};
pub use lazy_tree::LazyTree;
pub use sap::SweepAndPrune;
pub use shape::{Circle, Geometry, Polygon, Rectangle, Shape};
pub use traits::{ObjectID, Real};

/// Default margin added to the width and height of stored bounds
pub const DEFAULT_EXPANSION: f64 = 0.2;

/// Default number of fixtures each detector reserves room for
pub const DEFAULT_CAPACITY: usize = 64;
