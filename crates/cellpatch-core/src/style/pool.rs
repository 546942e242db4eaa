//! Content-addressed intern tables

use ahash::AHashMap;
use std::hash::{Hash, Hasher};

/// Append-only indexed table with find-or-create by structural equality
///
/// Used for shared strings and for every styles.xml collection. Entries loaded
/// from a file are kept even when they duplicate an earlier entry (indices in
/// the file must stay stable); lookups resolve to the first occurrence.
#[derive(Debug, Clone)]
pub struct InternPool<K> {
    /// All entries in index order
    items: Vec<K>,
    /// Hash -> indices with that hash
    index_map: AHashMap<u64, Vec<u32>>,
}

fn hash_key<K: Hash>(item: &K) -> u64 {
    let mut hasher = ahash::AHasher::default();
    item.hash(&mut hasher);
    hasher.finish()
}

impl<K: Hash + Eq> InternPool<K> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index_map: AHashMap::new(),
        }
    }

    /// Index of an equal entry, if any
    pub fn find(&self, item: &K) -> Option<u32> {
        self.index_map
            .get(&hash_key(item))?
            .iter()
            .copied()
            // Verify it's actually the same (hash collision check)
            .find(|&idx| self.items[idx as usize] == *item)
    }

    /// Append an entry read from a file, duplicates included
    pub fn push_existing(&mut self, item: K) -> u32 {
        let idx = self.items.len() as u32;
        let key = hash_key(&item);
        let duplicate = self.find(&item).is_some();
        if !duplicate {
            self.index_map.entry(key).or_default().push(idx);
        }
        self.items.push(item);
        idx
    }

    /// Find-or-create, returning the index and whether a new entry was appended
    pub fn get_or_insert(&mut self, item: K) -> (u32, bool) {
        if let Some(idx) = self.find(&item) {
            return (idx, false);
        }
        let idx = self.items.len() as u32;
        self.index_map.entry(hash_key(&item)).or_default().push(idx);
        self.items.push(item);
        (idx, true)
    }

    pub fn get(&self, index: u32) -> Option<&K> {
        self.items.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over all entries with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &K)> {
        self.items.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl<K: Hash + Eq> Default for InternPool<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq> FromIterator<K> for InternPool<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut pool = Self::new();
        for item in iter {
            pool.push_existing(item);
        }
        pool
    }
}
