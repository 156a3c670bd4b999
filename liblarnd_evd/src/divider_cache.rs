use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::dividers::EventDividers;

/// A bounded, least-recently-used cache of EventDividers keyed by file path.
///
/// Meant to be created once and shared (behind an Arc) by everything that segments
/// files. Values are computed outside of the lock; if two callers race on the same
/// path the first insertion wins and both receive it.
#[derive(Debug)]
pub struct DividerCache {
    capacity: usize,
    entries: Mutex<VecDeque<(PathBuf, Arc<EventDividers>)>>, // front is most recent
}

impl DividerCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a path, marking it as most recently used
    pub fn get(&self, path: &Path) -> Option<Arc<EventDividers>> {
        let mut entries = self.lock();
        let position = entries.iter().position(|(p, _)| p == path)?;
        let entry = entries.remove(position)?;
        let dividers = entry.1.clone();
        entries.push_front(entry);
        Some(dividers)
    }

    /// Insert dividers for a path, evicting the least recently used entry when full.
    ///
    /// Returns whatever is cached for the path afterwards.
    pub fn insert(&self, path: &Path, dividers: EventDividers) -> Arc<EventDividers> {
        let dividers = Arc::new(dividers);
        if self.capacity == 0 {
            return dividers;
        }
        let mut entries = self.lock();
        if let Some((_, existing)) = entries.iter().find(|(p, _)| p == path) {
            return existing.clone();
        }
        entries.push_front((path.to_path_buf(), dividers.clone()));
        while entries.len() > self.capacity {
            if let Some((evicted, _)) = entries.pop_back() {
                spdlog::debug!("Evicted event dividers of {}", evicted.display());
            }
        }
        dividers
    }

    /// Return the cached dividers for path, computing them with `make` on a miss.
    ///
    /// Errors from `make` are passed through and nothing is cached.
    pub fn get_or_try_insert_with<E, F>(
        &self,
        path: &Path,
        make: F,
    ) -> Result<Arc<EventDividers>, E>
    where
        F: FnOnce() -> Result<EventDividers, E>,
    {
        if let Some(dividers) = self.get(path) {
            return Ok(dividers);
        }
        let dividers = make()?;
        Ok(self.insert(path, dividers))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(PathBuf, Arc<EventDividers>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
