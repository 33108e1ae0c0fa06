use crate::key::Key;
use std::collections::{HashMap, HashSet};

///
/// JoinTable
///
/// Insertion-ordered set of `(left, right)` key pairs backing one owning
/// many-to-many relation. Both columns are indexed by pair position so either
/// direction is a lookup that preserves pair insertion order.
///

#[derive(Debug)]
pub struct JoinTable {
    name: String,
    pairs: Vec<(Key, Key)>,
    seen: HashSet<(Key, Key)>,
    by_left: HashMap<Key, Vec<usize>>,
    by_right: HashMap<Key, Vec<usize>>,
}

impl JoinTable {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pairs: Vec::new(),
            seen: HashSet::new(),
            by_left: HashMap::new(),
            by_right: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn contains(&self, left: &Key, right: &Key) -> bool {
        self.seen.contains(&(left.clone(), right.clone()))
    }

    /// Add a pair. Returns false if the pair was already present.
    pub(crate) fn insert(&mut self, left: Key, right: Key) -> bool {
        if !self.seen.insert((left.clone(), right.clone())) {
            return false;
        }

        let idx = self.pairs.len();
        self.by_left.entry(left.clone()).or_default().push(idx);
        self.by_right.entry(right.clone()).or_default().push(idx);
        self.pairs.push((left, right));

        true
    }

    /// Right-column keys paired with `left`, in pair insertion order.
    pub fn rights_of<'a>(&'a self, left: &Key) -> impl Iterator<Item = &'a Key> + use<'a> {
        self.by_left
            .get(left)
            .into_iter()
            .flatten()
            .map(|idx| &self.pairs[*idx].1)
    }

    /// Left-column keys paired with `right`, in pair insertion order.
    pub fn lefts_of<'a>(&'a self, right: &Key) -> impl Iterator<Item = &'a Key> + use<'a> {
        self.by_right
            .get(right)
            .into_iter()
            .flatten()
            .map(|idx| &self.pairs[*idx].0)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&Key, &Key)> {
        self.pairs.iter().map(|(left, right)| (left, right))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pairs_are_ignored() {
        let mut table = JoinTable::new("book_tags");

        assert!(table.insert(Key::Int(1), Key::Int(3)));
        assert!(!table.insert(Key::Int(1), Key::Int(3)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn lookups_follow_pair_insertion_order() {
        let mut table = JoinTable::new("book_tags");
        table.insert(Key::Int(1), Key::Int(3));
        table.insert(Key::Int(2), Key::Int(3));
        table.insert(Key::Int(1), Key::Int(1));

        let rights: Vec<_> = table.rights_of(&Key::Int(1)).cloned().collect();
        let lefts: Vec<_> = table.lefts_of(&Key::Int(3)).cloned().collect();

        assert_eq!(rights, vec![Key::Int(3), Key::Int(1)]);
        assert_eq!(lefts, vec![Key::Int(1), Key::Int(2)]);
        assert_eq!(table.rights_of(&Key::Int(9)).count(), 0);
    }
}
