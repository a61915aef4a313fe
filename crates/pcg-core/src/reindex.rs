use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Assigns dense `u32` ids to values in first-seen order.
///
/// Used to hash-cons composite DFA state tuples so the rest of the
/// pipeline works with cheap integer states.
pub struct Reindexer<K> {
    map: FxHashMap<K, u32>,
}

impl<K: Eq + Hash + Clone> Reindexer<K> {
    pub fn new() -> Self {
        Reindexer {
            map: FxHashMap::default(),
        }
    }

    /// The id for `k`, assigning the next free id if `k` is new.
    pub fn index(&mut self, k: &K) -> u32 {
        if let Some(&id) = self.map.get(k) {
            return id;
        }
        let id = self.map.len() as u32;
        self.map.insert(k.clone(), id);
        id
    }

    /// The id for `k` if it has been seen before.
    pub fn lookup(&self, k: &K) -> Option<u32> {
        self.map.get(k).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for Reindexer<K> {
    fn default() -> Self {
        Self::new()
    }
}
