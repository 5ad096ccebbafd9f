//! Test fixtures for consistent testing across the codebase

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use serde_json::json;

/// Original source embedded in [`GENERATED_FIXTURE`]'s inline map.
pub const ORIGINAL_FIXTURE: &str = "const a = 1;\nconst sum = a +\n  2;\n";

/// Transpiler-style output: a scaffolding line, a blank line, one line
/// mapped from original line 1 and one mapped from original lines 2 and 3.
pub static GENERATED_FIXTURE: Lazy<String> = Lazy::new(|| {
    let json = source_map_json("sum.jsx", ORIGINAL_FIXTURE, ";;AAAA;AACA,QACA");
    format!(
        "\"use strict\";\n\nvar a = 1;\nvar sum = a + 2;\n{}",
        inline_map_comment(&json)
    )
});

/// Expected annotation of [`GENERATED_FIXTURE`].
pub fn annotated_fixture() -> String {
    [
        "\"use strict\";",
        "",
        "var a = 1;         Line: 1    | const a = 1;",
        "var sum = a + 2;   Lines: 2,3 | const sum = a +  2;",
    ]
    .join("\n")
}

/// Serializes a single-source version 3 source map.
pub fn source_map_json(source: &str, content: &str, mappings: &str) -> String {
    json!({
        "version": 3,
        "sources": [source],
        "sourcesContent": [content],
        "names": [],
        "mappings": mappings
    })
    .to_string()
}

/// Builds the trailing comment a transpiler appends for an inline map.
pub fn inline_map_comment(json: &str) -> String {
    format!(
        "//# sourceMappingURL=data:application/json;base64,{}",
        STANDARD.encode(json)
    )
}

/// Minimal JSON configuration exercising every section.
pub const FULL_CONFIG_JSON: &str = r#"{
    "tests": ["spec/**/*.js"],
    "mocha": {"require": "spec/setup.js", "grep": "adds", "timeout": 2000},
    "babel": {"include": "src/**/*.jsx", "presets": ["react"]},
    "istanbul": {"directory": "out/coverage", "reporters": {"lcov": {}}}
}"#;

/// The same configuration as YAML.
pub const FULL_CONFIG_YAML: &str = r#"
tests:
  - spec/**/*.js
mocha:
  require: spec/setup.js
  grep: adds
  timeout: 2000
babel:
  include: src/**/*.jsx
  presets: [react]
istanbul:
  directory: out/coverage
  reporters:
    lcov: {}
"#;
