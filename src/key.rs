use std::cmp::{max, min};

/// Identity of one fixture within the broadphase
///
/// Two keys are equal iff both the collidable ID and the fixture ID are equal.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixtureKey<ID, FID> {
    pub collidable: ID,
    pub fixture: FID
}

impl<ID, FID> FixtureKey<ID, FID> {
    pub fn new(collidable: ID, fixture: FID) -> Self {
        Self{collidable, fixture}
    }
}

/// Result of an AABB or ray query
pub type BroadphaseItem<ID, FID> = FixtureKey<ID, FID>;

/// Result of pairwise detection
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature="serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BroadphasePair<ID, FID> {
    pub first: FixtureKey<ID, FID>,
    pub second: FixtureKey<ID, FID>
}

impl<ID, FID> BroadphasePair<ID, FID>
where
    ID: Ord + Copy,
    FID: Ord + Copy
{
    pub fn new(first: FixtureKey<ID, FID>, second: FixtureKey<ID, FID>) -> Self {
        Self{first, second}
    }

    /// The same pair with `first <= second`, for comparing results as unordered sets
    pub fn unordered(self) -> Self {
        Self{
            first: min(self.first, self.second),
            second: max(self.first, self.second)
        }
    }

    pub fn contains(&self, key: &FixtureKey<ID, FID>) -> bool {
        self.first == *key || self.second == *key
    }

    pub fn other(&self, key: &FixtureKey<ID, FID>) -> Option<FixtureKey<ID, FID>> {
        if self.first == *key {
            Some(self.second)
        } else if self.second == *key {
            Some(self.first)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_pairs_compare_equal() {
        let a = FixtureKey::new(1u32, 0u32);
        let b = FixtureKey::new(0u32, 3u32);
        assert_eq!(BroadphasePair::new(a, b).unordered(), BroadphasePair::new(b, a).unordered());
        assert_eq!(BroadphasePair::new(a, b).unordered().first, b);
        assert_eq!(BroadphasePair::new(a, b).other(&a), Some(b));
        assert_eq!(BroadphasePair::new(a, a).other(&b), None);
    }
}
