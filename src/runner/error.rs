use thiserror::Error;

/// Error type returned by the external collaborators (transpiler,
/// instrumenter, host, report writers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Error loading configuration file: {path}: {message}")]
    Config { path: String, message: String },

    #[error("Error during transpile - {filename}: \n{message}")]
    Transpile { filename: String, message: String },

    #[error("Error during instrument - {filename}: \n{message}")]
    Instrument { filename: String, message: String },

    #[error("Error during compile - {filename}: \n{message}")]
    Compile { filename: String, message: String },

    #[error("Report '{name}' failed: {message}")]
    Report { name: String, message: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceMapError {
    #[error("inline source map is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("inline source map is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inline source map is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("a mapping is malformed: \"{0}\"")]
    MappingMalformed(String),

    #[error("source map lists no sources")]
    NoSources,

    #[error("source map has no content for source '{0}'")]
    MissingSourceContent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpile_error_message_shape() {
        let err = RunnerError::Transpile {
            filename: "F".to_string(),
            message: "msg".to_string(),
        };
        assert_eq!(err.to_string(), "Error during transpile - F: \nmsg");
    }

    #[test]
    fn test_instrument_error_message_shape() {
        let err = RunnerError::Instrument {
            filename: "/src/a.js".to_string(),
            message: "Unexpected token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error during instrument - /src/a.js: \nUnexpected token"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RunnerError = io.into();
        assert!(matches!(err, RunnerError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_mapping_malformed_message() {
        let err = SourceMapError::MappingMalformed("A$".to_string());
        assert_eq!(err.to_string(), "a mapping is malformed: \"A$\"");
    }
}
