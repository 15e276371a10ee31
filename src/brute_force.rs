// mlodato, 20260915

use super::collidable::{Aabb, Collidable, Item, Key, Pair};
use super::detector::{estimated_pairs, estimated_raycast_hits, validate_expansion, BroadphaseDetector};
use super::error::Error;
use super::filter::BroadphaseFilter;
use super::geom::{Ray, RayCaster};
use super::key::BroadphasePair;
use super::DEFAULT_CAPACITY;

use cgmath::Vector2;
use num_traits::Zero;
use rustc_hash::FxHashMap;

/// Linear-scan detector
///
/// Stores exact, unexpanded bounds and tests every pair, so its results are the minimal candidate
/// set.  Used as the reference the other detectors are checked against.
pub struct BruteForce<C: Collidable> {
    proxies: FxHashMap<Key<C>, Aabb<C>>
}

impl<C: Collidable> BruteForce<C> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self{proxies: FxHashMap::with_capacity_and_hasher(capacity, Default::default())}
    }
}

impl<C: Collidable> Default for BruteForce<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Collidable> BroadphaseDetector<C> for BruteForce<C> {
    fn add_fixture(&mut self, collidable: &C, fixture: &C::Fixture) {
        let key = collidable.key(fixture);
        let bounds = collidable.fixture_bounds(fixture);
        if !bounds.is_finite() {
            warn!("non-finite bounds for fixture {:?}: {:?}", key, bounds);
        }
        self.proxies.insert(key, bounds);
    }

    fn remove_key(&mut self, key: &Key<C>) -> bool {
        self.proxies.remove(key).is_some()
    }

    fn contains_key(&self, key: &Key<C>) -> bool {
        self.proxies.contains_key(key)
    }

    fn indexed_bounds(&self, key: &Key<C>) -> Option<Aabb<C>> {
        self.proxies.get(key).copied()
    }

    fn clear(&mut self) {
        self.proxies.clear();
    }

    fn len(&self) -> usize {
        self.proxies.len()
    }

    fn detect(&mut self, filter: &dyn BroadphaseFilter<C>) -> Vec<Pair<C>> {
        let proxies: Vec<_> = self.proxies.iter().collect();
        let mut pairs = Vec::with_capacity(estimated_pairs(proxies.len()));
        for (i, &(key, bounds)) in proxies.iter().enumerate() {
            for &(other_key, other_bounds) in &proxies[i + 1..] {
                if key.collidable == other_key.collidable {
                    continue;
                }
                if bounds.overlaps(other_bounds) && filter.allow_pair(key, other_key) {
                    pairs.push(BroadphasePair::new(*key, *other_key));
                }
            }
        }
        pairs
    }

    fn detect_bounds(&mut self, bounds: &Aabb<C>, filter: &dyn BroadphaseFilter<C>) -> Vec<Item<C>> {
        self.proxies.iter()
            .filter(|&(key, proxy)| proxy.overlaps(bounds) && filter.allow_bounds(bounds, key))
            .map(|(key, _)| *key)
            .collect()
    }

    fn raycast(&mut self, ray: &Ray<C::Scalar>, length: C::Scalar, filter: &dyn BroadphaseFilter<C>)
        -> Vec<Item<C>>
    {
        let caster = RayCaster::new(ray, length);
        let mut items = Vec::with_capacity(estimated_raycast_hits(self.proxies.len()));
        for (key, proxy) in &self.proxies {
            if caster.hits(proxy) && filter.allow_ray(ray, length, key) {
                items.push(*key);
            }
        }
        items
    }

    fn expansion(&self) -> C::Scalar {
        C::Scalar::zero()
    }

    fn set_expansion(&mut self, expansion: C::Scalar) -> Result<(), Error> {
        validate_expansion(expansion)?;
        debug!("brute force detector ignores expansion {:?}", expansion);
        Ok(())
    }

    fn supports_expansion(&self) -> bool {
        false
    }

    fn shift(&mut self, offset: Vector2<C::Scalar>) {
        for bounds in self.proxies.values_mut() {
            bounds.translate(offset);
        }
    }
}
