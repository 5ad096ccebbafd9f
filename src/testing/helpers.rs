//! Test helper functions for common testing patterns

use crate::runner::bridge::{Completion, GlobExpander, TestRunner};
use crate::runner::coverage::Collector;
use crate::runner::error::{BoxError, RunnerError};
use crate::runner::interceptor::{ModuleHost, ModuleLoader};
use crate::runner::report::{Report, ReportFactory, ReportOptions};
use crate::types::config::RunnerOptions;
use anyhow::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Create a temporary directory with test files
pub fn create_temp_dir_with_files(files: &[(&str, &str)]) -> Result<TempDir> {
    let temp_dir = TempDir::new()?;

    for (filename, content) in files {
        let file_path = temp_dir.path().join(filename);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file_path, content)?;
    }

    Ok(temp_dir)
}

/// Assert that an error contains a specific message
pub fn assert_error_contains<T, E>(result: Result<T, E>, expected_message: &str)
where
    E: std::fmt::Display,
{
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => {
            let error_string = e.to_string();
            assert!(
                error_string.contains(expected_message),
                "Error '{error_string}' does not contain expected message '{expected_message}'"
            );
        }
    }
}

/// Host that records every compiled module.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub compiled: Vec<(PathBuf, String)>,
}

impl ModuleHost for RecordingHost {
    fn compile(&mut self, source: &str, filename: &Path) -> Result<(), BoxError> {
        self.compiled.push((filename.to_path_buf(), source.to_string()));
        Ok(())
    }
}

/// Expander answering from a fixed table; unknown patterns match nothing.
#[derive(Debug, Default)]
pub struct TableExpander {
    pub table: HashMap<String, Vec<PathBuf>>,
    pub calls: RefCell<Vec<String>>,
}

impl TableExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pattern: &str, files: &[&str]) -> Self {
        self.table
            .insert(pattern.to_string(), files.iter().map(PathBuf::from).collect());
        self
    }
}

impl GlobExpander for TableExpander {
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, RunnerError> {
        self.calls.borrow_mut().push(pattern.to_string());
        Ok(self.table.get(pattern).cloned().unwrap_or_default())
    }
}

/// Test runner that loads every registered file, then completes.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub options: Option<RunnerOptions>,
    /// Whether `configure` ran before any `add_file`.
    pub configured_before_files: Option<bool>,
    pub files: Vec<PathBuf>,
    pub completed: bool,
    /// Skip calling the completion, as a runner that aborted would.
    pub skip_completion: bool,
}

impl TestRunner for RecordingRunner {
    fn configure(&mut self, options: &RunnerOptions) {
        self.configured_before_files = Some(self.files.is_empty());
        self.options = Some(options.clone());
    }

    fn add_file(&mut self, path: &Path) {
        self.files.push(path.to_path_buf());
    }

    fn run(
        &mut self,
        loader: &mut dyn ModuleLoader,
        on_complete: Completion<'_>,
    ) -> Result<(), RunnerError> {
        for file in &self.files {
            loader.load(file)?;
        }
        if self.skip_completion {
            return Ok(());
        }
        self.completed = true;
        on_complete()
    }
}

/// One `write_report` call seen by a [`RecordingReports`] factory.
#[derive(Debug, Clone)]
pub struct ReportCall {
    pub name: String,
    pub options: ReportOptions,
    pub files: Vec<String>,
    pub sync: bool,
}

/// Report factory that records creations and writes; reports named in
/// `failing` return an error from `write_report`.
#[derive(Debug, Clone, Default)]
pub struct RecordingReports {
    pub calls: Rc<RefCell<Vec<ReportCall>>>,
    pub failing: Vec<String>,
}

struct RecordingReport {
    name: String,
    options: ReportOptions,
    calls: Rc<RefCell<Vec<ReportCall>>>,
    fail: bool,
}

impl Report for RecordingReport {
    fn write_report(&self, collector: &Collector, sync: bool) -> Result<(), BoxError> {
        if self.fail {
            return Err(format!("cannot write {}", self.name).into());
        }
        self.calls.borrow_mut().push(ReportCall {
            name: self.name.clone(),
            options: self.options.clone(),
            files: collector.files().map(str::to_string).collect(),
            sync,
        });
        Ok(())
    }
}

impl ReportFactory for RecordingReports {
    fn create(&self, name: &str, options: &ReportOptions) -> Result<Box<dyn Report>, BoxError> {
        Ok(Box::new(RecordingReport {
            name: name.to_string(),
            options: options.clone(),
            calls: Rc::clone(&self.calls),
            fail: self.failing.iter().any(|failing| failing == name),
        }))
    }
}
