use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse {
        path: String,
        source: serde_json::Error,
    },
    NonFinite {
        field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    InvalidGrid {
        columns: u32,
        rows: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed reading config {path}: {source}"),
            Self::Parse { path, source } => write!(f, "invalid config json in {path}: {source}"),
            Self::NonFinite { field } => write!(f, "config field {field} is not finite"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "config field {field} out of range: {value} (allowed {min}..={max})"
            ),
            Self::InvalidGrid { columns, rows } => write!(
                f,
                "safety pocket grid must be at least 2x2, got {columns}x{rows}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
