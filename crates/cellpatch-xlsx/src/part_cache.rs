//! Lazily parsed parts with dirty tracking
//!
//! A part is parsed on first access and is the single source of truth from
//! then on. Only dirty entries are serialized back into the package; clean ones
//! keep their original bytes.

use std::collections::hash_map::Entry;

use ahash::AHashMap;

use crate::error::XlsxResult;

/// A parsed part and whether it changed since it was loaded or last saved
#[derive(Debug)]
pub struct CachedPart<T> {
    pub value: T,
    pub dirty: bool,
}

impl<T> CachedPart<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Parsed parts keyed by part path
#[derive(Debug)]
pub struct PartCache<T> {
    entries: AHashMap<String, CachedPart<T>>,
}

impl<T> Default for PartCache<T> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<T> PartCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `path` with `load` unless it is already cached
    pub fn get_or_load<F>(&mut self, path: &str, load: F) -> XlsxResult<&mut CachedPart<T>>
    where
        F: FnOnce() -> XlsxResult<T>,
    {
        match self.entries.entry(path.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                log::debug!("parsing part {}", path);
                let value = load()?;
                Ok(entry.insert(CachedPart::clean(value)))
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&CachedPart<T>> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut CachedPart<T>> {
        self.entries.get_mut(path)
    }

    /// Dirty entries, sorted by path for deterministic output
    pub fn dirty_entries(&self) -> Vec<(&str, &T)> {
        let mut dirty: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.dirty)
            .map(|(k, e)| (k.as_str(), &e.value))
            .collect();
        dirty.sort_by(|a, b| a.0.cmp(b.0));
        dirty
    }

    pub fn any_dirty(&self) -> bool {
        self.entries.values().any(|e| e.dirty)
    }

    /// Called after a successful save
    pub fn mark_all_clean(&mut self) {
        for entry in self.entries.values_mut() {
            entry.dirty = false;
        }
    }
}
