use crate::runner::coverage::Collector;
use crate::runner::error::BoxError;
use crate::runner::store::SourceStore;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A named coverage report writer.
pub trait Report {
    fn write_report(&self, collector: &Collector, sync: bool) -> Result<(), BoxError>;
}

/// Creates report writers by name, e.g. `html`, `text` or `lcov`.
pub trait ReportFactory {
    fn create(&self, name: &str, options: &ReportOptions) -> Result<Box<dyn Report>, BoxError>;
}

/// Options handed to a report writer: the shared `dir` and `sourceStore`
/// defaults overlaid with the report's own options.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub dir: PathBuf,
    /// `None` when the report options set `sourceStore` to `false` or `null`.
    pub source_store: Option<SourceStore>,
    /// Report-specific options other than `dir` and `sourceStore`.
    pub extra: Map<String, Value>,
}

impl ReportOptions {
    pub fn merged(directory: &Path, store: &SourceStore, specific: &Value) -> Self {
        let mut extra = specific.as_object().cloned().unwrap_or_default();

        let dir = match extra.remove("dir") {
            Some(Value::String(dir)) => PathBuf::from(dir),
            _ => directory.to_path_buf(),
        };

        let source_store = match extra.remove("sourceStore") {
            Some(Value::Bool(false)) | Some(Value::Null) => None,
            _ => Some(store.clone()),
        };

        Self {
            dir,
            source_store,
            extra,
        }
    }
}
