use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    SourceUnavailable { source: String, message: String },

    SchemaMismatch { source: String, column: String },

    MalformedValue {
        source: String,
        column: String,
        value: String,
    },

    Config(String),

    MissingBaseline,

    Store(String),

    Json(serde_json::Error),

    Toml(toml::de::Error),

    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::SourceUnavailable { source, message } => {
                write!(f, "source '{source}' unavailable: {message}")
            }
            PipelineError::SchemaMismatch { source, column } => {
                write!(f, "source '{source}' is missing expected column '{column}'")
            }
            PipelineError::MalformedValue {
                source,
                column,
                value,
            } => write!(
                f,
                "source '{source}' has an unparseable value in column '{column}': {value}"
            ),
            PipelineError::Config(msg) => write!(f, "configuration error: {msg}"),
            PipelineError::MissingBaseline => {
                write!(f, "no persisted table to update; run a full rebuild first")
            }
            PipelineError::Store(msg) => write!(f, "table store error: {msg}"),
            PipelineError::Json(err) => write!(f, "JSON deserialization failed: {err}"),
            PipelineError::Toml(err) => write!(f, "TOML deserialization failed: {err}"),
            PipelineError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Json(err) => Some(err),
            PipelineError::Toml(err) => Some(err),
            PipelineError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Json(err)
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::Toml(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
