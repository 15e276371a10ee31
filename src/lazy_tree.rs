// mlodato, 20260924

use super::collidable::{Aabb, Collidable, Fixture, Item, Key, Pair};
use super::detector::{
    estimated_pairs,
    estimated_raycast_hits,
    validate_expansion,
    BatchBroadphaseDetector,
    BroadphaseDetector};
use super::error::{Error, InvariantViolation};
use super::filter::BroadphaseFilter;
use super::geom::{Ray, RayCaster};
use super::key::BroadphasePair;
use super::tree::Tree;
use super::DEFAULT_CAPACITY;

use cgmath::Vector2;
use num_traits::Zero;
use rustc_hash::FxHashMap;

#[cfg(feature="parallel")]
use rayon::prelude::*;

use std::cmp::Ordering;

#[derive(Clone, Debug)]
struct LazyLeaf<K, S> {
    key: K,
    radius: S,
    removed: bool
}

/// AABB tree rebuilt from scratch on every pairwise pass
///
/// Suited to "update everything, then detect once" workloads.  Leaves persist between passes but
/// branches do not: [`detect`](BroadphaseDetector::detect) dismantles any existing hierarchy, then
/// inserts leaves smallest-first while testing each one against the leaves inserted before it.
/// Removed leaves are only unlinked; they are dropped from the insertion order in one compaction
/// pass before the next build.
pub struct LazyTree<C: Collidable> {
    tree: Tree<C::Scalar, LazyLeaf<Key<C>, C::Scalar>>,
    elements: Vec<usize>,
    leaves: FxHashMap<Key<C>, usize>,
    sorted: bool,
    pending_inserts: bool,
    pending_removes: bool
}

impl<C: Collidable> LazyTree<C> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self{
            tree: Tree::with_capacity(capacity),
            elements: Vec::with_capacity(capacity),
            leaves: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            sorted: true,
            pending_inserts: false,
            pending_removes: false
        }
    }

    /// Dismantles the hierarchy so the next query rebuilds it, without refreshing any bounds
    pub fn batch_rebuild(&mut self) {
        self.tree.dismantle();
        self.pending_inserts = true;
    }

    /// Compacts removals, sorts and inserts every leaf not yet on the tree
    ///
    /// Called implicitly by AABB and ray queries.
    pub fn build(&mut self) {
        self.compact();
        self.ensure_sorted();
        if self.pending_inserts {
            for i in 0..self.elements.len() {
                let leaf = self.elements[i];
                if !self.tree.is_attached(leaf) {
                    let sibling = self.find_sibling(leaf, |_| {});
                    self.tree.attach(leaf, sibling);
                }
            }
            self.pending_inserts = false;
        }
    }

    /// Height of the root, zero when the hierarchy is not built
    pub fn height(&self) -> u32 {
        self.tree.height()
    }

    fn is_removed(&self, leaf: usize) -> bool {
        self.tree.node(leaf).item.as_ref().map_or(true, |item| item.removed)
    }

    fn compact(&mut self) {
        if !self.pending_removes {
            return;
        }
        let before = self.elements.len();
        let mut i = 0;
        while i < self.elements.len() {
            let leaf = self.elements[i];
            if self.is_removed(leaf) {
                self.tree.free(leaf);
                self.elements.swap_remove(i);
            } else {
                i += 1;
            }
        }
        self.pending_removes = false;
        self.sorted = false;
        debug!("compacted {} removed leaves ({} remain)", before - self.elements.len(), self.elements.len());
    }

    fn ensure_sorted(&mut self) {
        if self.sorted {
            return;
        }
        let tree = &self.tree;
        let by_radius = |a: &usize, b: &usize| {
            let ra = tree.node(*a).item.as_ref().map(|item| item.radius);
            let rb = tree.node(*b).item.as_ref().map(|item| item.radius);
            ra.partial_cmp(&rb).unwrap_or(Ordering::Equal)
        };

        #[cfg(feature="parallel")]
        self.elements.par_sort_by(by_radius);

        #[cfg(not(feature="parallel"))]
        self.elements.sort_by(by_radius);

        self.sorted = true;
    }

    /// Descends from the root by least enlargement and returns the leaf `leaf` should be paired
    /// with
    ///
    /// Every subtree passed over on the way down, and the final leaf itself, is handed to
    /// `skipped`; together they cover the whole tree.
    fn find_sibling<F>(&self, leaf: usize, mut skipped: F) -> Option<usize>
    where
        F: FnMut(usize)
    {
        let bounds = self.tree.node(leaf).bounds;
        let mut index = self.tree.root()?;
        while let Some((left, right)) = self.tree.node(index).children() {
            let cost_left = self.tree.node(left).bounds.enlargement(&bounds);
            let (next, other) = if cost_left == C::Scalar::zero() {
                (left, right)
            } else {
                let cost_right = self.tree.node(right).bounds.enlargement(&bounds);
                if cost_left < cost_right { (left, right) } else { (right, left) }
            };
            skipped(other);
            index = next;
        }
        skipped(index);
        Some(index)
    }

    fn detect_subtree(&self, leaf: usize, top: usize, filter: &dyn BroadphaseFilter<C>, pairs: &mut Vec<Pair<C>>) {
        let node = self.tree.node(leaf);
        let (bounds, key) = match &node.item {
            Some(item) => (node.bounds, item.key),
            None => return
        };
        self.tree.query(top, |other| other.overlaps(&bounds), |_, other| {
            if let Some(other) = &other.item {
                if key.collidable != other.key.collidable && filter.allow_pair(&key, &other.key) {
                    pairs.push(BroadphasePair::new(key, other.key));
                }
            }
        });
    }
}

impl<C: Collidable> Default for LazyTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Collidable> BroadphaseDetector<C> for LazyTree<C> {
    fn add_fixture(&mut self, collidable: &C, fixture: &C::Fixture) {
        let key = collidable.key(fixture);
        let bounds = collidable.fixture_bounds(fixture);
        let radius = fixture.shape().radius();
        if !bounds.is_finite() {
            warn!("non-finite bounds for fixture {:?}: {:?}", key, bounds);
        }

        match self.leaves.get(&key) {
            Some(&leaf) => {
                self.tree.detach(leaf);
                self.tree.set_bounds(leaf, bounds);
                if let Some(item) = self.tree.item_mut(leaf) {
                    if item.radius != radius {
                        item.radius = radius;
                        self.sorted = false;
                    }
                }
            },
            None => {
                let leaf = self.tree.allocate(bounds, LazyLeaf{key, radius, removed: false});
                self.elements.push(leaf);
                self.leaves.insert(key, leaf);
                self.sorted = false;
            }
        }
        self.pending_inserts = true;
    }

    fn remove_key(&mut self, key: &Key<C>) -> bool {
        match self.leaves.remove(key) {
            Some(leaf) => {
                self.tree.detach(leaf);
                if let Some(item) = self.tree.item_mut(leaf) {
                    item.removed = true;
                }
                self.pending_removes = true;
                true
            },
            None => false
        }
    }

    fn contains_key(&self, key: &Key<C>) -> bool {
        self.leaves.contains_key(key)
    }

    fn indexed_bounds(&self, key: &Key<C>) -> Option<Aabb<C>> {
        self.leaves.get(key).map(|&leaf| self.tree.node(leaf).bounds)
    }

    fn clear(&mut self) {
        self.tree.clear();
        self.elements.clear();
        self.leaves.clear();
        self.sorted = true;
        self.pending_inserts = false;
        self.pending_removes = false;
    }

    fn len(&self) -> usize {
        self.leaves.len()
    }

    fn detect(&mut self, filter: &dyn BroadphaseFilter<C>) -> Vec<Pair<C>> {
        if self.tree.root().is_some() {
            self.batch_rebuild();
        }
        self.compact();
        self.ensure_sorted();

        let mut pairs = Vec::with_capacity(estimated_pairs(self.leaves.len()));
        for i in 0..self.elements.len() {
            let leaf = self.elements[i];
            let sibling = self.find_sibling(leaf, |subtree| {
                self.detect_subtree(leaf, subtree, filter, &mut pairs);
            });
            self.tree.attach(leaf, sibling);
        }
        self.pending_inserts = false;

        if log_enabled!(log::Level::Debug) {
            debug!("lazy rebuild: {} leaves, height {}, {} pairs", self.elements.len(), self.tree.height(), pairs.len());
        }
        pairs
    }

    fn detect_bounds(&mut self, bounds: &Aabb<C>, filter: &dyn BroadphaseFilter<C>) -> Vec<Item<C>> {
        self.build();
        let mut items = Vec::new();
        if let Some(root) = self.tree.root() {
            self.tree.query(root, |node| node.overlaps(bounds), |_, node| {
                if let Some(item) = &node.item {
                    if filter.allow_bounds(bounds, &item.key) {
                        items.push(item.key);
                    }
                }
            });
        }
        items
    }

    fn raycast(&mut self, ray: &Ray<C::Scalar>, length: C::Scalar, filter: &dyn BroadphaseFilter<C>)
        -> Vec<Item<C>>
    {
        self.build();
        let mut items = Vec::with_capacity(estimated_raycast_hits(self.leaves.len()));
        if let Some(root) = self.tree.root() {
            let caster = RayCaster::new(ray, length);
            self.tree.query(root, |node| caster.hits(node), |_, node| {
                if let Some(item) = &node.item {
                    if filter.allow_ray(ray, length, &item.key) {
                        items.push(item.key);
                    }
                }
            });
        }
        items
    }

    fn expansion(&self) -> C::Scalar {
        C::Scalar::zero()
    }

    fn set_expansion(&mut self, expansion: C::Scalar) -> Result<(), Error> {
        validate_expansion(expansion)?;
        debug!("lazy tree ignores expansion {:?}", expansion);
        Ok(())
    }

    fn supports_expansion(&self) -> bool {
        false
    }

    fn shift(&mut self, offset: Vector2<C::Scalar>) {
        self.tree.shift(offset);
    }

    /// Checks the hierarchy formed by the leaves currently on it
    fn validate(&self) -> Result<(), InvariantViolation> {
        let attached = self.elements.iter()
            .filter(|&&leaf| self.tree.is_attached(leaf))
            .count();
        self.tree.validate(attached)
    }
}

impl<C: Collidable> BatchBroadphaseDetector<C> for LazyTree<C> {
    fn batch_update(&mut self, collidables: &[C]) {
        self.tree.dismantle();
        for collidable in collidables {
            for fixture in collidable.fixtures() {
                self.add_fixture(collidable, fixture);
            }
        }
        self.pending_inserts = true;
    }
}
