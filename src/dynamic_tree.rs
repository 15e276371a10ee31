// mlodato, 20260918

use super::collidable::{Aabb, Collidable, Item, Key, Pair};
use super::detector::{estimated_pairs, estimated_raycast_hits, validate_expansion, BroadphaseDetector};
use super::error::{Error, InvariantViolation};
use super::filter::BroadphaseFilter;
use super::geom::{Containment, Ray, RayCaster};
use super::key::BroadphasePair;
use super::tree::Tree;
use super::{DEFAULT_CAPACITY, DEFAULT_EXPANSION};

use cgmath::Vector2;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;

/// Incrementally balanced AABB tree
///
/// Leaves store bounds expanded by [`expansion`](BroadphaseDetector::expansion); an update only
/// moves a leaf when the fixture's fresh bounds escape the stored ones.
pub struct DynamicTree<C: Collidable> {
    tree: Tree<C::Scalar, Key<C>>,
    leaves: FxHashMap<Key<C>, usize>,
    expansion: C::Scalar,
    relocations: usize
}

impl<C: Collidable> DynamicTree<C> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self{
            tree: Tree::with_capacity(capacity),
            leaves: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            expansion: num_traits::cast(DEFAULT_EXPANSION).unwrap_or_else(C::Scalar::zero),
            relocations: 0
        }
    }

    /// Number of times a stored leaf was moved because its fixture escaped its expanded bounds
    pub fn relocations(&self) -> usize {
        self.relocations
    }

    /// Height of the root, zero when empty
    pub fn height(&self) -> u32 {
        self.tree.height()
    }

    /// Picks the node the new leaf becomes a sibling of
    ///
    /// Creating a parent above `node` costs twice the perimeter of the merged bounds; descending
    /// costs the growth of `node` plus the growth of the cheaper child.
    fn find_sibling(&self, bounds: &Aabb<C>) -> Option<usize> {
        let two = C::Scalar::one() + C::Scalar::one();
        let mut index = self.tree.root()?;
        loop {
            let node = self.tree.node(index);
            let (left, right) = match node.children() {
                Some(children) => children,
                None => return Some(index)
            };

            let perimeter = node.bounds.perimeter();
            let union_perimeter = node.bounds.union(bounds).perimeter();
            let cost = union_perimeter * two;
            let descend = (union_perimeter - perimeter) * two;

            let cost_left = self.descend_cost(left, bounds, descend);
            let cost_right = self.descend_cost(right, bounds, descend);
            if cost < cost_left && cost < cost_right {
                return Some(index);
            }
            index = if cost_left < cost_right { left } else { right };
        }
    }

    fn descend_cost(&self, index: usize, bounds: &Aabb<C>, descend: C::Scalar) -> C::Scalar {
        let child = self.tree.node(index);
        let union_perimeter = child.bounds.union(bounds).perimeter();
        if child.is_leaf() {
            union_perimeter + descend
        } else {
            union_perimeter - child.bounds.perimeter() + descend
        }
    }

    fn insert_leaf(&mut self, leaf: usize) {
        let bounds = self.tree.node(leaf).bounds;
        let sibling = self.find_sibling(&bounds);
        self.tree.attach(leaf, sibling);
    }
}

impl<C: Collidable> Default for DynamicTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Collidable> BroadphaseDetector<C> for DynamicTree<C> {
    fn add_fixture(&mut self, collidable: &C, fixture: &C::Fixture) {
        let key = collidable.key(fixture);
        let bounds = collidable.fixture_bounds(fixture);
        if !bounds.is_finite() {
            warn!("non-finite bounds for fixture {:?}: {:?}", key, bounds);
        }

        match self.leaves.get(&key) {
            Some(&leaf) => {
                if self.tree.node(leaf).bounds.contains(bounds) {
                    return;
                }
                self.tree.detach(leaf);
                self.tree.set_bounds(leaf, bounds.expanded(self.expansion));
                self.insert_leaf(leaf);
                self.relocations += 1;
                trace!("relocated {:?}", key);
            },
            None => {
                let leaf = self.tree.allocate(bounds.expanded(self.expansion), key);
                self.insert_leaf(leaf);
                self.leaves.insert(key, leaf);
            }
        }
    }

    fn remove_key(&mut self, key: &Key<C>) -> bool {
        match self.leaves.remove(key) {
            Some(leaf) => {
                self.tree.free(leaf);
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
        self.leaves.clear();
    }

    fn len(&self) -> usize {
        self.leaves.len()
    }

    fn detect(&mut self, filter: &dyn BroadphaseFilter<C>) -> Vec<Pair<C>> {
        let root = match self.tree.root() {
            Some(root) => root,
            None => return Vec::new()
        };

        let mut pairs = Vec::with_capacity(estimated_pairs(self.leaves.len()));
        let mut visited = vec![false; self.tree.index_bound()];
        for (key, &leaf) in &self.leaves {
            let bounds = self.tree.node(leaf).bounds;
            self.tree.query(root, |node| node.overlaps(&bounds), |other, node| {
                if other == leaf || visited[other] {
                    return;
                }
                if let Some(other_key) = &node.item {
                    if key.collidable != other_key.collidable && filter.allow_pair(key, other_key) {
                        pairs.push(BroadphasePair::new(*key, *other_key));
                    }
                }
            });
            visited[leaf] = true;
        }
        pairs
    }

    fn detect_bounds(&mut self, bounds: &Aabb<C>, filter: &dyn BroadphaseFilter<C>) -> Vec<Item<C>> {
        let mut items = Vec::new();
        if let Some(root) = self.tree.root() {
            self.tree.query(root, |node| node.overlaps(bounds), |_, node| {
                if let Some(key) = &node.item {
                    if filter.allow_bounds(bounds, key) {
                        items.push(*key);
                    }
                }
            });
        }
        items
    }

    fn raycast(&mut self, ray: &Ray<C::Scalar>, length: C::Scalar, filter: &dyn BroadphaseFilter<C>)
        -> Vec<Item<C>>
    {
        let mut items = Vec::with_capacity(estimated_raycast_hits(self.leaves.len()));
        if let Some(root) = self.tree.root() {
            let caster = RayCaster::new(ray, length);
            self.tree.query(root, |node| caster.hits(node), |_, node| {
                if let Some(key) = &node.item {
                    if filter.allow_ray(ray, length, key) {
                        items.push(*key);
                    }
                }
            });
        }
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
        self.tree.shift(offset);
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        self.tree.validate(self.leaves.len())
    }
}
