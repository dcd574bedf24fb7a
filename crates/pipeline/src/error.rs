use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A required source (URL or file path) is not configured.
    Configuration(String),
    /// A source could not be read: non-success HTTP status, missing file, etc.
    SourceUnavailable(String),
    /// A required column is absent from a source table.
    Schema { table: String, column: String },
    /// Caller-supplied request parameters are invalid.
    InvalidRequest(String),
    /// Payload could not be decoded (malformed JSON, unreadable sheet).
    Parse(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl PipelineError {
    pub fn schema(table: &str, column: &str) -> Self {
        Self::Schema { table: table.into(), column: column.into() }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::SourceUnavailable(msg) => write!(f, "source unavailable: {msg}"),
            Self::Schema { table, column } => {
                write!(f, "{table} table: missing required column '{column}'")
            }
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}
