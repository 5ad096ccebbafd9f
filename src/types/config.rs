use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const DEFAULT_TEST_GLOB: &str = "test/**/*.js";
pub const DEPENDENCY_GLOB: &str = "**/node_modules/**/*";
pub const DEFAULT_TRANSPILE_INCLUDE: [&str; 2] = ["**/*.jsx", "**/*.js"];
pub const DEFAULT_COVERAGE_VARIABLE: &str = "__coverage__";
pub const DEFAULT_REPORT_DIR: &str = "coverage";

/// Fully resolved configuration for a single run.
///
/// Built once by [`crate::runner::config::normalize`] and never mutated
/// afterwards. Every glob field is a list, never a bare string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub tests: Vec<String>,
    pub runner: RunnerOptions,
    pub transpiler: TranspilerConfig,
    pub coverage: CoverageConfig,
}

impl Default for Config {
    fn default() -> Self {
        crate::runner::config::normalize(&Value::Null)
    }
}

/// Options handed to the test runner.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunnerOptions {
    /// Modules loaded through the pipeline before any test file.
    pub require: Vec<String>,
    pub grep: Vec<GrepPattern>,
    /// Remaining runner options, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranspilerConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub options: TranspileOptions,
}

/// Source map emission requested from the transpiler. Only inline maps can be
/// annotated, so no other mode is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    #[default]
    Inline,
}

/// Options passed to [`crate::runner::interceptor::Transpiler::transform`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileOptions {
    /// Path of the file being transformed; set per load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    pub source_map: SourceMapMode,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageConfig {
    pub directory: PathBuf,
    /// Report name to report-specific options, in configuration order.
    pub reporters: Map<String, Value>,
    pub collector: Map<String, Value>,
    pub instrumenter: Map<String, Value>,
    pub coverage_variable: String,
    /// Files matching any of these are neither annotated nor instrumented.
    pub exclude: Vec<String>,
}

/// A compiled `grep` filter.
#[derive(Debug, Clone)]
pub struct GrepPattern(Regex);

impl GrepPattern {
    /// Compiles `pattern` as a regex, falling back to a literal match when the
    /// string is not valid regex syntax.
    pub fn new(pattern: &str) -> Option<Self> {
        Regex::new(pattern)
            .or_else(|_| Regex::new(&regex::escape(pattern)))
            .ok()
            .map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, title: &str) -> bool {
        self.0.is_match(title)
    }
}

impl PartialEq for GrepPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for GrepPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
