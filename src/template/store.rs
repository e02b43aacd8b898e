use std::collections::HashMap;
use std::sync::Arc;

use super::types::TemplateSet;

/// Compiled template sets keyed by page file name.
///
/// Filled once by the compiler and read-only afterwards, so it is shared
/// across requests as a plain `Arc` with no locking.
#[derive(Debug)]
pub struct TemplateStore<T> {
    sets: HashMap<String, Arc<TemplateSet<T>>>,
}

impl<T> Default for TemplateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TemplateStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    /// Add a compiled set; only the compiler calls this, while building
    pub(crate) fn insert(&mut self, set: TemplateSet<T>) {
        self.sets.insert(set.name().to_string(), Arc::new(set));
    }

    /// Get a template set by page name
    pub fn get(&self, name: &str) -> Option<Arc<TemplateSet<T>>> {
        self.sets.get(name).cloned()
    }

    /// Check if a page was compiled
    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Page names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of template sets
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
