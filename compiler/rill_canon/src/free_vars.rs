//! Ordered free-variable sets.

use smallvec::SmallVec;

use rill_ir::can::PatternIdx;

/// A deduplicated, insertion-ordered set of pattern indices.
///
/// Free-variable sets are tiny in practice (most expressions reference a
/// handful of bindings), so this is a linear-scan set over a `SmallVec`
/// rather than a hash set. The insertion order is what makes capture
/// lists deterministic across runs.
#[derive(Clone, Debug, Default)]
pub struct FreeVarSet {
    items: SmallVec<[PatternIdx; 4]>,
}

impl FreeVarSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one pattern index, keeping first-insertion order.
    pub fn insert(&mut self, idx: PatternIdx) {
        if !self.items.contains(&idx) {
            self.items.push(idx);
        }
    }

    /// Union another set into this one (other's new items append in order).
    pub fn union(&mut self, other: FreeVarSet) {
        for idx in other.items {
            self.insert(idx);
        }
    }

    /// Remove every index bound by `bound`.
    pub fn subtract(&mut self, bound: &[PatternIdx]) {
        self.items.retain(|idx| !bound.contains(idx));
    }

    /// Whether the set contains `idx`.
    pub fn contains(&self, idx: PatternIdx) -> bool {
        self.items.contains(&idx)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of free variables.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = PatternIdx> + '_ {
        self.items.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(raw: u32) -> PatternIdx {
        PatternIdx::new(raw)
    }

    #[test]
    fn insert_deduplicates_preserving_order() {
        let mut set = FreeVarSet::new();
        set.insert(p(2));
        set.insert(p(0));
        set.insert(p(2));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![p(2), p(0)]);
    }

    #[test]
    fn union_appends_new_items() {
        let mut a = FreeVarSet::new();
        a.insert(p(1));
        let mut b = FreeVarSet::new();
        b.insert(p(2));
        b.insert(p(1));
        a.union(b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![p(1), p(2)]);
    }

    #[test]
    fn subtract_removes_bound_patterns() {
        let mut set = FreeVarSet::new();
        set.insert(p(1));
        set.insert(p(2));
        set.insert(p(3));
        set.subtract(&[p(2)]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![p(1), p(3)]);
    }
}
