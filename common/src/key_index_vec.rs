use std::collections::HashMap;
use std::hash::Hash;

use crate::is_debug;

pub trait KeyIndexKey<K> {
    fn key(&self) -> &K;
}

/// Insertion-ordered storage with O(1) lookup by key.
///
/// Removal keeps the relative order of the remaining items, so iteration order
/// is always the order in which the surviving items were pushed.
#[derive(Debug, Clone)]
pub struct KeyIndexVec<K: Copy + Eq + Hash, V: KeyIndexKey<K>> {
    items: Vec<V>,
    idx_by_key: HashMap<K, usize>,
}

impl<K, V> Default for KeyIndexVec<K, V>
where
    K: Copy + Eq + Hash,
    V: KeyIndexKey<K>,
{
    fn default() -> Self {
        Self {
            items: Vec::new(),
            idx_by_key: HashMap::new(),
        }
    }
}

impl<K, V> KeyIndexVec<K, V>
where
    K: Copy + Eq + Hash,
    V: KeyIndexKey<K>,
{
    /// Appends `v` unless an item with the same key is already stored.
    /// Returns `false` and drops `v` in that case.
    pub fn push(&mut self, v: V) -> bool {
        let key = *v.key();
        if self.idx_by_key.contains_key(&key) {
            return false;
        }
        self.idx_by_key.insert(key, self.items.len());
        self.items.push(v);
        true
    }

    pub fn remove_by_key(&mut self, key: &K) -> Option<V> {
        let idx = self.idx_by_key.remove(key)?;
        let removed = self.items.remove(idx);
        assert!(*removed.key() == *key);

        for (pos, item) in self.items.iter().enumerate().skip(idx) {
            self.idx_by_key.insert(*item.key(), pos);
        }

        Some(removed)
    }

    /// Removes every item for which `keep` returns false and hands the removed
    /// items back in their original order.
    pub fn retain(&mut self, mut keep: impl FnMut(&V) -> bool) -> Vec<V> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if keep(&item) {
                kept.push(item);
            } else {
                removed.push(item);
            }
        }
        self.items = kept;
        self.rebuild_index();

        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.idx_by_key.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.items.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.items.iter().map(|item| *item.key())
    }

    pub fn len(&self) -> usize {
        assert_eq!(self.items.len(), self.idx_by_key.len());
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        assert_eq!(self.items.len(), self.idx_by_key.len());
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.idx_by_key.contains_key(key)
    }

    pub fn index_of_key(&self, key: &K) -> Option<usize> {
        self.idx_by_key.get(key).copied()
    }

    pub fn by_key(&self, key: &K) -> Option<&V> {
        self.index_of_key(key).map(|idx| &self.items[idx])
    }

    /// The key must not be changed through the returned reference.
    pub fn by_key_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.index_of_key(key)?;
        Some(&mut self.items[idx])
    }

    fn rebuild_index(&mut self) {
        self.idx_by_key.clear();
        for (idx, item) in self.items.iter().enumerate() {
            self.idx_by_key.insert(*item.key(), idx);
        }

        if is_debug() {
            assert_eq!(self.items.len(), self.idx_by_key.len());
        }
    }
}
