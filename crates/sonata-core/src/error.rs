//! Error types for sonata-core

use thiserror::Error;

/// Result type alias using sonata-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the descriptor validator
#[derive(Error, Debug)]
pub enum Error {
    /// Descriptor file missing or unreadable
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor file is not valid YAML
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Neither the local nor the remote schema master could serve a schema
    #[error("Schema not available: {name} ({reason})")]
    SchemaFetch { name: String, reason: String },

    /// A schema document was found but is not a usable JSON Schema
    #[error("Failed to compile schema {name}: {message}")]
    SchemaCompile { name: String, message: String },

    /// Event code not declared in the event catalog
    #[error("Unknown event code: {code}")]
    UnknownEventCode { code: String },

    /// Invalid workspace or event configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a read error for a descriptor path
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for a descriptor path
    pub fn parse(path: impl Into<String>, source: serde_yaml_ng::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Create a schema fetch error
    pub fn schema_fetch(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaFetch {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a schema compile error
    pub fn schema_compile(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaCompile {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an unknown event code error
    pub fn unknown_event_code(code: impl Into<String>) -> Self {
        Self::UnknownEventCode { code: code.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error means the schema layer cannot run
    pub fn is_schema_unavailable(&self) -> bool {
        matches!(self, Self::SchemaFetch { .. } | Self::SchemaCompile { .. })
    }
}
