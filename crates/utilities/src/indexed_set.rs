use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::TagIndex;

/// A unique type for the indices of an [IndexedSet].
pub struct SetTag;

/// The index of an element in an [IndexedSet].
pub type SetIndex = TagIndex<usize, SetTag>;

/// A set that assigns every inserted element a unique index, in order of
/// insertion.
#[derive(Debug, Clone)]
pub struct IndexedSet<T> {
    /// Maps every element to its index in `elements`.
    table: FxHashMap<T, SetIndex>,
    elements: Vec<T>,
}

impl<T: Clone + Hash + Eq> IndexedSet<T> {
    pub fn new() -> Self {
        Self {
            table: FxHashMap::default(),
            elements: Vec::new(),
        }
    }

    /// Inserts the given element, returns its index and true iff the element
    /// was not yet present.
    pub fn insert(&mut self, element: T) -> (SetIndex, bool) {
        if let Some(index) = self.table.get(&element) {
            return (*index, false);
        }

        let index = SetIndex::new(self.elements.len());
        self.elements.push(element.clone());
        self.table.insert(element, index);
        (index, true)
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true iff the set is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Consumes the set and returns the elements in order of insertion.
    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T: Clone + Hash + Eq> Default for IndexedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_set_insert() {
        let mut set = IndexedSet::new();

        let (first, inserted) = set.insert("a".to_string());
        assert!(inserted);
        assert_eq!(*first, 0);

        let (second, inserted) = set.insert("b".to_string());
        assert!(inserted);
        assert_eq!(*second, 1);

        // Inserting an existing element returns the original index.
        let (again, inserted) = set.insert("a".to_string());
        assert!(!inserted);
        assert_eq!(again, first);
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_vec(), vec!["a".to_string(), "b".to_string()]);

    }
}
