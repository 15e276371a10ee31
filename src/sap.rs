// mlodato, 20260921

use super::collidable::{Aabb, Collidable, Item, Key, Pair};
use super::detector::{estimated_pairs, estimated_raycast_hits, validate_expansion, BroadphaseDetector};
use super::error::Error;
use super::filter::BroadphaseFilter;
use super::geom::{Bounds, Containment, Ray, RayCaster};
use super::key::BroadphasePair;
use super::traits::Real;
use super::{DEFAULT_CAPACITY, DEFAULT_EXPANSION};

use cgmath::{Point2, Vector2};
use num_traits::Zero;
use rustc_hash::FxHashMap;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Unbounded};

/// Entry of the sorted set, ordered by `(min.x, min.y, key)`
#[derive(Copy, Clone, Debug)]
struct SapProxy<S, K> {
    bounds: Bounds<Point2<S>>,
    key: K
}

impl<S: Real, K: Ord> Ord for SapProxy<S, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bounds.min.x.partial_cmp(&other.bounds.min.x).unwrap_or(Ordering::Equal)
            .then_with(|| self.bounds.min.y.partial_cmp(&other.bounds.min.y).unwrap_or(Ordering::Equal))
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl<S: Real, K: Ord> PartialOrd for SapProxy<S, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Real, K: Ord> PartialEq for SapProxy<S, K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S: Real, K: Ord> Eq for SapProxy<S, K> {}

/// Sweep-and-prune over the x axis
///
/// Proxies are kept sorted by their minimum corner, so a scan for overlaps with some bounds can
/// stop at the first proxy starting beyond the bounds' maximum x.
pub struct SweepAndPrune<C: Collidable> {
    proxies: BTreeSet<SapProxy<C::Scalar, Key<C>>>,
    bounds: FxHashMap<Key<C>, Aabb<C>>,
    expansion: C::Scalar,
    relocations: usize
}

impl<C: Collidable> SweepAndPrune<C> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self{
            proxies: BTreeSet::new(),
            bounds: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            expansion: num_traits::cast(DEFAULT_EXPANSION).unwrap_or_else(C::Scalar::zero),
            relocations: 0
        }
    }

    /// Number of times a proxy was re-sorted because its fixture escaped its expanded bounds
    pub fn relocations(&self) -> usize {
        self.relocations
    }

    /// Visits proxies in order until one starts beyond `max_x`
    fn scan<F>(&self, max_x: C::Scalar, mut visit: F)
    where
        F: FnMut(&SapProxy<C::Scalar, Key<C>>)
    {
        for proxy in &self.proxies {
            if proxy.bounds.min.x > max_x {
                break;
            }
            visit(proxy);
        }
    }
}

impl<C: Collidable> Default for SweepAndPrune<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Collidable> BroadphaseDetector<C> for SweepAndPrune<C> {
    fn add_fixture(&mut self, collidable: &C, fixture: &C::Fixture) {
        let key = collidable.key(fixture);
        let bounds = collidable.fixture_bounds(fixture);
        if !bounds.is_finite() {
            warn!("non-finite bounds for fixture {:?}: {:?}", key, bounds);
        }

        if let Some(&stored) = self.bounds.get(&key) {
            if stored.contains(bounds) {
                return;
            }
            self.proxies.remove(&SapProxy{bounds: stored, key});
            self.relocations += 1;
            trace!("relocated {:?}", key);
        }

        let bounds = bounds.expanded(self.expansion);
        self.proxies.insert(SapProxy{bounds, key});
        self.bounds.insert(key, bounds);
    }

    fn remove_key(&mut self, key: &Key<C>) -> bool {
        match self.bounds.remove(key) {
            Some(bounds) => {
                self.proxies.remove(&SapProxy{bounds, key: *key});
                true
            },
            None => false
        }
    }

    fn contains_key(&self, key: &Key<C>) -> bool {
        self.bounds.contains_key(key)
    }

    fn indexed_bounds(&self, key: &Key<C>) -> Option<Aabb<C>> {
        self.bounds.get(key).copied()
    }

    fn clear(&mut self) {
        self.proxies.clear();
        self.bounds.clear();
    }

    fn len(&self) -> usize {
        self.bounds.len()
    }

    fn detect(&mut self, filter: &dyn BroadphaseFilter<C>) -> Vec<Pair<C>> {
        let mut pairs = Vec::with_capacity(estimated_pairs(self.bounds.len()));
        for current in &self.proxies {
            let tail = self.proxies.range::<SapProxy<C::Scalar, Key<C>>, _>((Excluded(current), Unbounded));
            for test in tail {
                if test.bounds.min.x > current.bounds.max.x {
                    break;
                }
                if current.key.collidable == test.key.collidable {
                    continue;
                }
                if current.bounds.overlaps(&test.bounds) && filter.allow_pair(&current.key, &test.key) {
                    pairs.push(BroadphasePair::new(current.key, test.key));
                }
            }
        }
        pairs
    }

    fn detect_bounds(&mut self, bounds: &Aabb<C>, filter: &dyn BroadphaseFilter<C>) -> Vec<Item<C>> {
        let mut items = Vec::new();
        self.scan(bounds.max.x, |proxy| {
            if proxy.bounds.overlaps(bounds) && filter.allow_bounds(bounds, &proxy.key) {
                items.push(proxy.key);
            }
        });
        items
    }

    fn raycast(&mut self, ray: &Ray<C::Scalar>, length: C::Scalar, filter: &dyn BroadphaseFilter<C>)
        -> Vec<Item<C>>
    {
        let caster = RayCaster::new(ray, length);
        let mut items = Vec::with_capacity(estimated_raycast_hits(self.bounds.len()));
        self.scan(caster.bounds().max.x, |proxy| {
            if caster.hits(&proxy.bounds) && filter.allow_ray(ray, length, &proxy.key) {
                items.push(proxy.key);
            }
        });
        items
    }

    fn expansion(&self) -> C::Scalar {
        self.expansion
    }

    fn set_expansion(&mut self, expansion: C::Scalar) -> Result<(), Error> {
        self.expansion = validate_expansion(expansion)?;
        Ok(())
    }

    fn supports_expansion(&self) -> bool {
        true
    }

    fn shift(&mut self, offset: Vector2<C::Scalar>) {
        for bounds in self.bounds.values_mut() {
            bounds.translate(offset);
        }
        let bounds = &self.bounds;
        self.proxies = bounds.iter()
            .map(|(&key, &bounds)| SapProxy{bounds, key})
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::filter::DefaultFilter;
    use crate::shape::Rectangle;

    #[test]
    fn identical_bounds_are_distinct_entries() {
        let mut detector = SweepAndPrune::new();
        detector.set_expansion(0.0).unwrap();
        let bodies: Vec<_> = (0..4)
            .map(|id| Body::<f64>::at(id, 0.0, 0.0).with_fixture(Rectangle::new(1.0, 1.0)))
            .collect();
        for body in &bodies {
            detector.add(body);
        }
        assert_eq!(detector.proxies.len(), 4);
        assert_eq!(detector.detect(&DefaultFilter).len(), 6);

        assert!(detector.remove(&bodies[2]));
        assert_eq!(detector.proxies.len(), 3);
        assert_eq!(detector.detect(&DefaultFilter).len(), 3);
    }

    #[test]
    fn relocates_only_on_escape() {
        let mut detector = SweepAndPrune::new();
        let mut body = Body::<f64>::at(0, 0.0, 0.0).with_fixture(Rectangle::new(1.0, 1.0));
        detector.add(&body);
        body.set_position(0.05, 0.0);
        detector.update(&body);
        assert_eq!(detector.relocations(), 0);
        body.set_position(3.0, 0.0);
        detector.update(&body);
        assert_eq!(detector.relocations(), 1);
        assert_eq!(detector.proxies.len(), 1);
    }

    #[test]
    fn sorted_scan_stops_early() {
        let mut detector = SweepAndPrune::new();
        for id in 0..10 {
            detector.add(&Body::<f64>::at(id, id as f64 * 10.0, 0.0).with_fixture(Rectangle::new(1.0, 1.0)));
        }
        let mut visited = 0;
        detector.scan(25.0, |_| visited += 1);
        assert_eq!(visited, 3);

        let hits = detector.detect_bounds(&Bounds::from_coords(19.0, -1.0, 31.0, 1.0), &DefaultFilter);
        assert_eq!(hits.len(), 2);

        detector.shift(Vector2::new(-20.0, 0.0));
        let hits = detector.detect_bounds(&Bounds::from_coords(-1.0, -1.0, 11.0, 1.0), &DefaultFilter);
        assert_eq!(hits.iter().map(|key| key.collidable).collect::<Vec<_>>(), vec![2, 3]);
    }
}
