//! The per-file load pipeline: read, normalize indentation, transpile,
//! annotate, instrument, then hand the result to the host.

use crate::runner::annotate::annotate;
use crate::runner::error::{BoxError, RunnerError};
use crate::runner::patterns::{is_selected, PatternSet};
use crate::runner::store::SourceStore;
use crate::types::config::{Config, TranspileOptions};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use tracing::debug;

static LEADING_TABS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\t+").unwrap());

/// Output of a [`Transpiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transpiled {
    pub code: String,
}

/// Converts a source dialect into directly executable code. Implementations
/// must honor `options.source_map` by appending an inline map.
#[cfg_attr(test, mockall::automock)]
pub trait Transpiler {
    fn transform(&self, source: &str, options: &TranspileOptions) -> Result<Transpiled, BoxError>;
}

/// Rewrites executable code so it records which constructs ran.
#[cfg_attr(test, mockall::automock)]
pub trait Instrumenter {
    fn instrument(&self, source: &str, filename: &Path) -> Result<String, BoxError>;
}

/// The host's own compile-and-execute step for a module.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleHost {
    fn compile(&mut self, source: &str, filename: &Path) -> Result<(), BoxError>;
}

/// What a test runner calls to load a module during a run.
pub trait ModuleLoader {
    fn load(&mut self, filename: &Path) -> Result<(), RunnerError>;
}

/// Replaces every run of leading tabs with two spaces per tab. Tabs after
/// the first non-tab character of a line are left alone.
pub fn normalize_indentation(source: &str) -> String {
    LEADING_TABS
        .replace_all(source, |caps: &Captures| "  ".repeat(caps[0].len()))
        .into_owned()
}

/// Include/exclude decisions for a loaded file.
#[derive(Debug, Clone)]
pub struct LoadGate {
    transpile_include: PatternSet,
    transpile_exclude: PatternSet,
    coverage_exclude: PatternSet,
}

impl LoadGate {
    pub fn new(config: &Config) -> Result<Self, RunnerError> {
        Ok(Self {
            transpile_include: PatternSet::new(&config.transpiler.include)?,
            transpile_exclude: PatternSet::new(&config.transpiler.exclude)?,
            coverage_exclude: PatternSet::new(&config.coverage.exclude)?,
        })
    }

    pub fn should_transpile(&self, filename: &Path) -> bool {
        is_selected(filename, &self.transpile_include, &self.transpile_exclude)
    }

    pub fn should_instrument(&self, filename: &Path) -> bool {
        !self.coverage_exclude.matches_any(filename)
    }
}

pub struct LoadPipeline {
    gate: LoadGate,
    transpile_options: TranspileOptions,
    transpiler: Box<dyn Transpiler>,
    instrumenter: Box<dyn Instrumenter>,
    store: SourceStore,
}

impl LoadPipeline {
    pub fn new(
        config: &Config,
        transpiler: Box<dyn Transpiler>,
        instrumenter: Box<dyn Instrumenter>,
        store: SourceStore,
    ) -> Result<Self, RunnerError> {
        Ok(Self {
            gate: LoadGate::new(config)?,
            transpile_options: config.transpiler.options.clone(),
            transpiler,
            instrumenter,
            store,
        })
    }

    pub fn gate(&self) -> &LoadGate {
        &self.gate
    }

    pub fn store(&self) -> &SourceStore {
        &self.store
    }

    /// Reads `filename` and runs it through the pipeline. Nothing is cached:
    /// loading the same file twice repeats every step.
    pub fn transform(&self, filename: &Path) -> Result<String, RunnerError> {
        let raw = fs::read_to_string(filename).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::FileNotFound {
                    path: filename.to_string_lossy().to_string(),
                }
            } else {
                RunnerError::Io(e)
            }
        })?;

        self.transform_source(&raw, filename)
    }

    /// Pipeline steps after the read, for text already in memory.
    pub fn transform_source(&self, raw: &str, filename: &Path) -> Result<String, RunnerError> {
        let mut code = normalize_indentation(raw);

        if self.gate.should_transpile(filename) {
            debug!(file = %filename.display(), "Transpiling");
            let mut options = self.transpile_options.clone();
            options.filename = Some(filename.to_path_buf());

            code = self
                .transpiler
                .transform(&code, &options)
                .map_err(|e| RunnerError::Transpile {
                    filename: filename.display().to_string(),
                    message: e.to_string(),
                })?
                .code;
        }

        if self.gate.should_instrument(filename) {
            self.store.set(filename, annotate(&code));

            debug!(file = %filename.display(), "Instrumenting");
            code = self
                .instrumenter
                .instrument(&code, filename)
                .map_err(|e| RunnerError::Instrument {
                    filename: filename.display().to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(code)
    }

    /// Transforms `filename` and passes the final text to the host.
    pub fn load(&self, host: &mut dyn ModuleHost, filename: &Path) -> Result<(), RunnerError> {
        let code = self.transform(filename)?;
        host.compile(&code, filename)
            .map_err(|e| RunnerError::Compile {
                filename: filename.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Pairs the pipeline with a host so a test runner can load modules.
    pub fn bind<'a>(&'a self, host: &'a mut dyn ModuleHost) -> BoundLoader<'a> {
        BoundLoader {
            pipeline: self,
            host,
        }
    }
}

pub struct BoundLoader<'a> {
    pipeline: &'a LoadPipeline,
    host: &'a mut dyn ModuleHost,
}

impl ModuleLoader for BoundLoader<'_> {
    fn load(&mut self, filename: &Path) -> Result<(), RunnerError> {
        self.pipeline.load(&mut *self.host, filename)
    }
}
