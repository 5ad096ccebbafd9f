use crate::runner::error::RunnerError;
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// `*` stays inside a path component; only `**` crosses separators.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled list of glob patterns used as a single predicate.
///
/// Include, exclude and test selection all go through this type so the
/// matching rules are the same everywhere.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RunnerError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern.as_ref()).map_err(|e| RunnerError::InvalidPattern {
                    pattern: pattern.as_ref().to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// True when at least one pattern matches `path`. An empty set never
    /// matches.
    pub fn matches_any(&self, path: &Path) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_path_with(path, MATCH_OPTIONS))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Include/exclude gate: `path` must match an include pattern and no exclude
/// pattern.
pub fn is_selected(path: &Path, include: &PatternSet, exclude: &PatternSet) -> bool {
    include.matches_any(path) && !exclude.matches_any(path)
}
