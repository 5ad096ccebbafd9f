use crate::runner::error::RunnerError;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = ".transcov.json";

/// Reads the configuration file at `path`.
///
/// A file that cannot be read falls back to an empty configuration, which
/// normalizes to the defaults. A file that can be read but does not parse is
/// a [`RunnerError::Config`].
pub async fn load_config(path: &Path) -> Result<Value, RunnerError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Error reading configuration file, using default config"
            );
            return Ok(Value::Object(Map::new()));
        }
    };

    debug!(path = %path.display(), "Loaded configuration file");
    parse_config(&content, path)
}

/// Parses configuration text. `.yml`/`.yaml` files are YAML, anything else is
/// JSON. An empty document is an empty configuration.
pub fn parse_config(content: &str, path: &Path) -> Result<Value, RunnerError> {
    let config_error = |message: String| RunnerError::Config {
        path: path.to_string_lossy().to_string(),
        message,
    };

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml" | "yaml")
    );

    let value: Value = if content.trim().is_empty() {
        Value::Null
    } else if is_yaml {
        serde_yaml::from_str(content).map_err(|e| config_error(e.to_string()))?
    } else {
        serde_json::from_str(content).map_err(|e| config_error(e.to_string()))?
    };

    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(config_error(
            "configuration must be a mapping of sections".to_string(),
        )),
    }
}
