use crate::runner::error::RunnerError;
use crate::runner::interceptor::ModuleLoader;
use crate::types::config::{Config, RunnerOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Completion handler invoked once after every test file has run.
pub type Completion<'a> = Box<dyn FnOnce() -> Result<(), RunnerError> + 'a>;

/// The underlying test runner.
pub trait TestRunner {
    /// Receives the normalized runner options before any file is added.
    fn configure(&mut self, options: &RunnerOptions);

    fn add_file(&mut self, path: &Path);

    /// Executes the registered files, loading modules through `loader`, and
    /// calls `on_complete` when they have all finished.
    fn run(
        &mut self,
        loader: &mut dyn ModuleLoader,
        on_complete: Completion<'_>,
    ) -> Result<(), RunnerError>;
}

/// Expands a glob pattern into concrete files.
pub trait GlobExpander {
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, RunnerError>;
}

/// Filesystem expansion backed by the `glob` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsGlob;

impl GlobExpander for FsGlob {
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, RunnerError> {
        let entries = glob::glob(pattern).map_err(|e| RunnerError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(pattern, error = %e, "Skipping unreadable glob match");
                    None
                }
            })
            .collect())
    }
}

/// Registers test files and pre-required modules with a [`TestRunner`] and
/// starts the run.
pub struct TestRunnerBridge {
    tests: Vec<String>,
    options: RunnerOptions,
    working_dir: PathBuf,
    expander: Box<dyn GlobExpander>,
}

impl TestRunnerBridge {
    pub fn new(config: &Config) -> Self {
        Self {
            tests: config.tests.clone(),
            options: config.runner.clone(),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            expander: Box::new(FsGlob),
        }
    }

    pub fn with_expander(mut self, expander: Box<dyn GlobExpander>) -> Self {
        self.expander = expander;
        self
    }

    pub fn with_working_dir(mut self, working_dir: PathBuf) -> Self {
        self.working_dir = working_dir;
        self
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Anchors a relative glob at the working directory. The directory part is
    /// escaped so it only ever matches itself.
    fn resolve_pattern(&self, pattern: &str) -> String {
        if Path::new(pattern).is_absolute() {
            return pattern.to_string();
        }
        let base = glob::Pattern::escape(&self.working_dir.to_string_lossy());
        Path::new(&base).join(pattern).to_string_lossy().into_owned()
    }

    /// Expands every test glob in order, relative globs against the working
    /// directory. A glob matching nothing is fine; a file matched by several
    /// globs is listed once, at its first match.
    pub fn test_files(&self) -> Result<Vec<PathBuf>, RunnerError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for pattern in &self.tests {
            let matched = self.expander.expand(&self.resolve_pattern(pattern))?;
            debug!(pattern = %pattern, matched = matched.len(), "Expanded test glob");
            for file in matched {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        Ok(files)
    }

    /// Pre-required modules resolved against the working directory.
    pub fn required_modules(&self) -> Vec<PathBuf> {
        self.options
            .require
            .iter()
            .map(|module| self.working_dir.join(module))
            .collect()
    }

    /// Hands the runner its options, registers the test files, loads the
    /// pre-required modules, then runs. Returns the registered files.
    pub fn start(
        &self,
        runner: &mut dyn TestRunner,
        loader: &mut dyn ModuleLoader,
        on_complete: Completion<'_>,
    ) -> Result<Vec<PathBuf>, RunnerError> {
        let files = self.test_files()?;
        runner.configure(&self.options);
        for file in &files {
            runner.add_file(file);
        }

        for module in self.required_modules() {
            debug!(module = %module.display(), "Requiring module");
            loader.load(&module)?;
        }

        runner.run(loader, on_complete)?;
        Ok(files)
    }
}
