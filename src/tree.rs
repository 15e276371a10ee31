// mlodato, 20260917

//! Arena-allocated binary bounding-volume hierarchy
//!
//! Nodes live in a [`Slab`] and refer to each other by index.  A node is a leaf iff it has no left
//! child; every branch has exactly two children, bounds equal to the union of its children and a
//! height one greater than its tallest child.  Children of a branch never differ in height by more
//! than one.

use super::error::InvariantViolation;
use super::geom::Bounds;
use super::traits::Real;

use cgmath::{Point2, Vector2};
use slab::Slab;
use smallvec::SmallVec;

#[derive(Clone, Debug)]
pub(crate) struct Node<S, T> {
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub bounds: Bounds<Point2<S>>,
    pub height: u32,
    pub item: Option<T>
}

impl<S, T> Node<S, T> {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }

    pub fn children(&self) -> Option<(usize, usize)> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Tree<S, T> {
    nodes: Slab<Node<S, T>>,
    root: Option<usize>
}

impl<S, T> Default for Tree<S, T> {
    fn default() -> Self {
        Self{nodes: Slab::new(), root: None}
    }
}

impl<S, T> Tree<S, T>
where
    S: Real
{
    /// Reserves room for the leaves and branches of `leaves` items
    pub fn with_capacity(leaves: usize) -> Self {
        Self{
            nodes: Slab::with_capacity((2 * leaves).saturating_sub(1)),
            root: None
        }
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn node(&self, index: usize) -> &Node<S, T> {
        &self.nodes[index]
    }

    pub fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        self.nodes.get_mut(index)?.item.as_mut()
    }

    pub fn set_bounds(&mut self, index: usize, bounds: Bounds<Point2<S>>) {
        self.nodes[index].bounds = bounds;
    }

    /// Upper bound (exclusive) on node indices; sizes per-node scratch buffers
    pub fn index_bound(&self) -> usize {
        self.nodes.capacity()
    }

    /// Height of the root, zero for an empty tree
    pub fn height(&self) -> u32 {
        self.root.map_or(0, |root| self.nodes[root].height)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Allocates a detached leaf
    pub fn allocate(&mut self, bounds: Bounds<Point2<S>>, item: T) -> usize {
        self.nodes.insert(Node{
            parent: None,
            left: None,
            right: None,
            bounds,
            height: 0,
            item: Some(item)
        })
    }

    /// Frees a leaf, detaching it first if necessary
    pub fn free(&mut self, leaf: usize) -> Option<T> {
        self.detach(leaf);
        self.nodes.remove(leaf).item
    }

    pub fn is_attached(&self, leaf: usize) -> bool {
        self.root == Some(leaf) || self.nodes[leaf].parent.is_some()
    }

    /// Attaches a detached leaf as the sibling of `sibling`, or as the root of an empty tree
    ///
    /// A new branch is spliced in above `sibling`, then every ancestor is rebalanced and refit.
    pub fn attach(&mut self, leaf: usize, sibling: Option<usize>) {
        let sibling = match (sibling, self.root) {
            (Some(sibling), Some(_)) => sibling,
            _ => {
                self.nodes[leaf].parent = None;
                self.root = Some(leaf);
                return;
            }
        };

        let old_parent = self.nodes[sibling].parent;
        let branch = self.nodes.insert(Node{
            parent: old_parent,
            left: Some(sibling),
            right: Some(leaf),
            bounds: self.nodes[sibling].bounds.union(&self.nodes[leaf].bounds),
            height: self.nodes[sibling].height + 1,
            item: None
        });
        self.nodes[sibling].parent = Some(branch);
        self.nodes[leaf].parent = Some(branch);

        match old_parent {
            Some(parent) => self.replace_child(parent, sibling, branch),
            None => self.root = Some(branch)
        }
        self.refit_from(Some(branch));
    }

    /// Unlinks a leaf from the hierarchy without freeing it
    ///
    /// The leaf's parent branch is freed and replaced by the leaf's sibling.
    pub fn detach(&mut self, leaf: usize) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }

        let parent = match self.nodes[leaf].parent {
            Some(parent) => parent,
            None => return
        };
        let (sibling, grandparent) = {
            let node = &self.nodes[parent];
            let sibling = if node.left == Some(leaf) { node.right } else { node.left };
            (sibling, node.parent)
        };
        let sibling = match sibling {
            Some(sibling) => sibling,
            None => return
        };

        self.nodes.remove(parent);
        self.nodes[leaf].parent = None;
        self.nodes[sibling].parent = grandparent;

        match grandparent {
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.refit_from(Some(grandparent));
            },
            None => self.root = Some(sibling)
        }
    }

    /// Frees every branch, leaving all leaves allocated but detached
    pub fn dismantle(&mut self) {
        self.nodes.retain(|_, node| node.is_leaf());
        for (_, node) in self.nodes.iter_mut() {
            node.parent = None;
        }
        self.root = None;
    }

    /// Translates the bounds of every node
    pub fn shift(&mut self, offset: Vector2<S>) {
        for (_, node) in self.nodes.iter_mut() {
            node.bounds.translate(offset);
        }
    }

    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        let node = &mut self.nodes[parent];
        if node.left == Some(old) {
            node.left = Some(new);
        } else {
            node.right = Some(new);
        }
    }

    fn refit(&mut self, index: usize) {
        if let Some((left, right)) = self.nodes[index].children() {
            let bounds = self.nodes[left].bounds.union(&self.nodes[right].bounds);
            let height = 1 + self.nodes[left].height.max(self.nodes[right].height);
            let node = &mut self.nodes[index];
            node.bounds = bounds;
            node.height = height;
        }
    }

    fn refit_from(&mut self, start: Option<usize>) {
        let mut next = start;
        while let Some(index) = next {
            let index = self.balance(index);
            self.refit(index);
            next = self.nodes[index].parent;
        }
    }

    /// Rotates the taller child of `a` above it when its children differ in height by more than
    /// one; returns the root of the resulting subtree
    ///
    /// Both children must already be balanced.  Any height difference is repaired, not only a
    /// difference of two: the node lowered by a rotation is balanced again before it is refit.
    fn balance(&mut self, a: usize) -> usize {
        let (left, right) = match self.nodes[a].children() {
            Some(children) => children,
            None => return a
        };
        let diff = self.nodes[right].height as i64 - self.nodes[left].height as i64;
        if diff > 1 {
            self.rotate(a, right, true)
        } else if diff < -1 {
            self.rotate(a, left, false)
        } else {
            a
        }
    }

    fn rotate(&mut self, a: usize, c: usize, c_is_right: bool) -> usize {
        let (f, g) = match self.nodes[c].children() {
            Some(children) => children,
            None => return a
        };

        let parent = self.nodes[a].parent;
        self.nodes[c].parent = parent;
        self.nodes[a].parent = Some(c);
        match parent {
            Some(parent) => self.replace_child(parent, a, c),
            None => self.root = Some(c)
        }

        // the taller grandchild stays under `c`, the shorter one moves under `a`
        let (tall, short) = if self.nodes[f].height > self.nodes[g].height { (f, g) } else { (g, f) };
        if c_is_right {
            self.nodes[c].left = Some(a);
            self.nodes[c].right = Some(tall);
            self.nodes[a].right = Some(short);
        } else {
            self.nodes[c].right = Some(a);
            self.nodes[c].left = Some(tall);
            self.nodes[a].left = Some(short);
        }
        self.nodes[tall].parent = Some(c);
        self.nodes[short].parent = Some(a);

        let lowered = self.balance(a);
        self.refit(lowered);
        self.refit(c);
        c
    }

    /// Stackless traversal of the subtree rooted at `top`
    ///
    /// Descends into every node for which `overlaps` holds and calls `visit` for each such leaf.
    /// Climbing back up relies on parent links only, so no stack is kept regardless of depth.
    pub fn query<O, V>(&self, top: usize, mut overlaps: O, mut visit: V)
    where
        O: FnMut(&Bounds<Point2<S>>) -> bool,
        V: FnMut(usize, &Node<S, T>)
    {
        let mut index = top;
        loop {
            let node = &self.nodes[index];
            if overlaps(&node.bounds) {
                match node.left {
                    Some(left) => {
                        index = left;
                        continue;
                    },
                    None => visit(index, node)
                }
            }

            loop {
                if index == top {
                    return;
                }
                let parent = match self.nodes[index].parent {
                    Some(parent) => parent,
                    None => return
                };
                let node = &self.nodes[parent];
                if node.left == Some(index) {
                    match node.right {
                        Some(right) => {
                            index = right;
                            break;
                        },
                        None => return
                    }
                }
                index = parent;
            }
        }
    }

    /// Checks every structural invariant and that exactly `leaves` leaves are reachable
    pub fn validate(&self, leaves: usize) -> Result<(), InvariantViolation> {
        let root = match self.root {
            Some(root) => root,
            None if leaves == 0 => return Ok(()),
            None => return Err(InvariantViolation::LeafCount{expected: leaves, actual: 0})
        };
        if self.nodes.get(root).map_or(true, |node| node.parent.is_some()) {
            return Err(InvariantViolation::RootHasParent(root));
        }

        let mut stack: SmallVec<[usize; 64]> = SmallVec::new();
        stack.push(root);
        let mut count = 0;
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match (node.left, node.right) {
                (None, None) => {
                    if node.height != 0 {
                        return Err(InvariantViolation::LeafHeight(index));
                    }
                    if node.item.is_none() {
                        return Err(InvariantViolation::LeafWithoutItem(index));
                    }
                    count += 1;
                },
                (None, Some(_)) => return Err(InvariantViolation::LeafHasChildren(index)),
                (Some(_), None) => return Err(InvariantViolation::MissingChild(index)),
                (Some(left_index), Some(right_index)) => {
                    if node.item.is_some() {
                        return Err(InvariantViolation::BranchWithItem(index));
                    }
                    let left = self.nodes.get(left_index)
                        .ok_or(InvariantViolation::DanglingChild(index))?;
                    let right = self.nodes.get(right_index)
                        .ok_or(InvariantViolation::DanglingChild(index))?;
                    if left.parent != Some(index) {
                        return Err(InvariantViolation::ParentMismatch(left_index));
                    }
                    if right.parent != Some(index) {
                        return Err(InvariantViolation::ParentMismatch(right_index));
                    }
                    if node.bounds != left.bounds.union(&right.bounds) {
                        return Err(InvariantViolation::BoundsNotUnion(index));
                    }
                    if node.height != 1 + left.height.max(right.height) {
                        return Err(InvariantViolation::HeightMismatch(index));
                    }
                    if (left.height as i64 - right.height as i64).abs() > 1 {
                        return Err(InvariantViolation::Unbalanced(index));
                    }
                    stack.push(left_index);
                    stack.push(right_index);
                }
            }
        }

        if count != leaves {
            return Err(InvariantViolation::LeafCount{expected: leaves, actual: count});
        }
        Ok(())
    }
}
