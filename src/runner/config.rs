use crate::types::config::*;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Resolves a partial configuration into a complete [`Config`].
///
/// Pure and infallible: any field that is absent or has an unexpected shape is
/// treated as absent and replaced by its default.
pub fn normalize(partial: &Value) -> Config {
    let tests = partial
        .get("tests")
        .and_then(coalesce_patterns)
        .unwrap_or_else(|| vec![DEFAULT_TEST_GLOB.to_string()]);

    let runner = normalize_runner(section(partial, &["mocha", "runner"]));
    let transpiler = normalize_transpiler(section(partial, &["babel", "transpiler"]));
    let coverage = normalize_coverage(section(partial, &["istanbul", "coverage"]), &tests);

    Config {
        tests,
        runner,
        transpiler,
        coverage,
    }
}

/// Coalesces a glob field to a list. Non-string list entries are dropped.
pub fn coalesce_patterns(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(pattern) => Some(vec![pattern.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

/// Turns a test glob into a coverage exclude pattern that matches absolute
/// paths.
pub fn test_glob_exclude(glob: &str) -> String {
    if glob.starts_with('/') || glob.starts_with("**") {
        glob.to_string()
    } else {
        format!("**/{glob}")
    }
}

fn section(partial: &Value, names: &[&str]) -> Map<String, Value> {
    names
        .iter()
        .find_map(|name| partial.get(*name).and_then(Value::as_object))
        .cloned()
        .unwrap_or_default()
}

fn normalize_runner(mut section: Map<String, Value>) -> RunnerOptions {
    let require = section
        .remove("require")
        .as_ref()
        .and_then(coalesce_patterns)
        .unwrap_or_default();

    let grep = section
        .remove("grep")
        .as_ref()
        .and_then(coalesce_patterns)
        .unwrap_or_default()
        .iter()
        .filter_map(|pattern| GrepPattern::new(pattern))
        .collect();

    RunnerOptions {
        require,
        grep,
        extra: section,
    }
}

fn normalize_transpiler(mut section: Map<String, Value>) -> TranspilerConfig {
    let include = section
        .remove("include")
        .as_ref()
        .and_then(coalesce_patterns)
        .unwrap_or_else(|| DEFAULT_TRANSPILE_INCLUDE.map(str::to_string).to_vec());

    let mut exclude = section
        .remove("exclude")
        .as_ref()
        .and_then(coalesce_patterns)
        .unwrap_or_default();
    exclude.push(DEPENDENCY_GLOB.to_string());

    // The annotator only understands inline maps; whatever the caller asked
    // for is replaced.
    section.remove("sourceMap");
    section.remove("filename");

    TranspilerConfig {
        include,
        exclude,
        options: TranspileOptions {
            filename: None,
            source_map: SourceMapMode::Inline,
            extra: section,
        },
    }
}

fn normalize_coverage(mut section: Map<String, Value>, tests: &[String]) -> CoverageConfig {
    let directory = section
        .remove("directory")
        .and_then(|dir| dir.as_str().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));

    let reporters = match section.remove("reporters") {
        Some(Value::Object(reporters)) => reporters,
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(|name| (name.to_string(), Value::Object(Map::new())))
            .collect(),
        _ => default_reporters(),
    };

    let collector = take_object(&mut section, "collector");

    let coverage_variable = section
        .remove("coverageVariable")
        .and_then(|name| name.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_COVERAGE_VARIABLE.to_string());

    let mut instrumenter = take_object(&mut section, "instrumenter");
    instrumenter.insert(
        "coverageVariable".to_string(),
        Value::String(coverage_variable.clone()),
    );

    let mut exclude = section
        .remove("exclude")
        .as_ref()
        .and_then(coalesce_patterns)
        .unwrap_or_default();
    exclude.extend(tests.iter().map(|glob| test_glob_exclude(glob)));
    exclude.push(DEPENDENCY_GLOB.to_string());

    CoverageConfig {
        directory,
        reporters,
        collector,
        instrumenter,
        coverage_variable,
        exclude,
    }
}

fn take_object(section: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match section.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn default_reporters() -> Map<String, Value> {
    ["html", "text"]
        .into_iter()
        .map(|name| (name.to_string(), Value::Object(Map::new())))
        .collect()
}
