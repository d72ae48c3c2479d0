// ── Dual-index registry ──
//
// MTUs and groups are addressable by either their stable numeric index or
// their configured name. Rather than one map with two kinds of key, the
// registry keeps a canonical ordered store plus two lookup indexes into
// it, so iteration yields each entity exactly once.

use std::collections::HashMap;
use std::sync::Arc;

/// An entity addressable by numeric index and by name.
pub trait Indexed {
    fn index(&self) -> usize;
    fn description(&self) -> &str;
}

/// Immutable dual-index lookup over one entity type.
///
/// Entities with an empty description are placeholder slots: they stay
/// retrievable by numeric index but never appear in [`values`](Self::values).
#[derive(Debug)]
pub struct Registry<T> {
    entries: Vec<Arc<T>>,
    by_index: HashMap<usize, usize>,
    by_name: HashMap<String, usize>,
}

impl<T: Indexed> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_index: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register an entity under its numeric index and, when it has one,
    /// its name. Builder-internal; the registry is read-only afterwards.
    pub(crate) fn insert(&mut self, entity: Arc<T>) {
        let slot = self.entries.len();
        self.by_index.insert(entity.index(), slot);
        if !entity.description().is_empty() {
            self.by_name.insert(entity.description().to_owned(), slot);
        }
        self.entries.push(entity);
    }

    /// Look up an entity by its numeric index.
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.by_index
            .get(&index)
            .map(|&slot| Arc::clone(&self.entries[slot]))
    }

    /// Look up an entity by its configured name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<T>> {
        self.by_name
            .get(name)
            .map(|&slot| Arc::clone(&self.entries[slot]))
    }

    /// Iterate every named entity exactly once, in registration order.
    ///
    /// Placeholder entities (empty description) are skipped; they remain
    /// addressable via [`get`](Self::get).
    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries
            .iter()
            .filter(|entity| !entity.description().is_empty())
    }

    /// Number of distinct stored entities, placeholders included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
