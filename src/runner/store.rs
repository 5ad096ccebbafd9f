use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Annotated sources keyed by filename, shared between the load pipeline
/// and the report writers.
///
/// Cloning yields another handle onto the same store. A second load of the
/// same file overwrites the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct SourceStore {
    entries: Rc<RefCell<BTreeMap<PathBuf, String>>>,
}

impl SourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` for `filename`, returning the previous entry if any.
    pub fn set(&self, filename: &Path, text: String) -> Option<String> {
        self.entries
            .borrow_mut()
            .insert(filename.to_path_buf(), text)
    }

    pub fn get(&self, filename: &Path) -> Option<String> {
        self.entries.borrow().get(filename).cloned()
    }

    pub fn contains(&self, filename: &Path) -> bool {
        self.entries.borrow().contains_key(filename)
    }

    /// Stored filenames in path order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// True when both handles refer to the same underlying store.
    pub fn same_store(&self, other: &SourceStore) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}
