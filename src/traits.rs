// mlodato, 20260914

use std::fmt::Debug;
use std::hash::Hash;

/// Identifiers for collidables and fixtures
///
/// Identity in the broadphase is carried by IDs: two fixtures are the same fixture iff their
/// collidable IDs and fixture IDs are equal.

#[cfg(not(feature="parallel"))]
pub trait ObjectID: Copy + Clone + Hash + Ord + Debug {}

#[cfg(not(feature="parallel"))]
impl<T: Copy + Clone + Hash + Ord + Debug> ObjectID for T {}

#[cfg(feature="parallel")]
pub trait ObjectID: Copy + Clone + Hash + Ord + Send + Sync + Debug {}

#[cfg(feature="parallel")]
impl<T: Copy + Clone + Hash + Ord + Send + Sync + Debug> ObjectID for T {}

/// Scalar type used for coordinates (`f32` or `f64`)

#[cfg(not(feature="parallel"))]
pub trait Real: cgmath::BaseFloat + Debug {}

#[cfg(not(feature="parallel"))]
impl<T: cgmath::BaseFloat + Debug> Real for T {}

#[cfg(feature="parallel")]
pub trait Real: cgmath::BaseFloat + Send + Sync + Debug {}

#[cfg(feature="parallel")]
impl<T: cgmath::BaseFloat + Send + Sync + Debug> Real for T {}
