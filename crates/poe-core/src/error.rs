//! Error types for registry, request and manifest construction

use std::path::PathBuf;

/// Structural problems in a unit/adapter registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Scope level declared twice
    #[error("duplicate scope level: {0}")]
    DuplicateScope(String),

    /// Reference to an undeclared scope level
    #[error("unknown scope level `{scope}` referenced by `{referrer}`")]
    UnknownScope {
        /// Missing scope name
        scope: String,
        /// Unit or adapter holding the reference
        referrer: String,
    },

    /// Adapter name declared twice
    #[error("duplicate adapter: {0}")]
    DuplicateAdapter(String),

    /// Adapter whose source and target coincide
    #[error("adapter `{0}` leads from a scope level to itself")]
    SelfAdapter(String),

    /// Second adapter between the same pair of scope levels
    #[error("adapter `{0}` duplicates an existing scope transition")]
    ParallelAdapter(String),

    /// Adapters form a cycle, so scope levels are not a hierarchy
    #[error("adapter graph contains a cycle")]
    AdapterCycle,

    /// Unit name declared twice
    #[error("duplicate unit: {0}")]
    DuplicateUnit(String),

    /// Tag gated on two different features
    #[error("tag `{tag}` is gated on both `{first}` and `{second}`")]
    ConflictingTagGate {
        /// Tag name
        tag: String,
        /// Feature declared first
        first: String,
        /// Feature declared second
        second: String,
    },
}

/// Structurally invalid planning request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Target production never declared anywhere in the registry
    #[error("unknown target production: {0}")]
    UnknownProduction(String),

    /// Target production declared but no unit produces it
    #[error("no registered unit produces `{0}`")]
    NoProducer(String),

    /// Enabled feature not known to the registry
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// Initial tag not known to the registry
    #[error("unknown tag: {0}")]
    UnknownTag(String),
}

/// Failures loading a declarative registry manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Manifest file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File extension is not yaml, yml, json or toml
    #[error("unsupported manifest format: {0}")]
    UnsupportedFormat(String),

    /// YAML parse failure
    #[error("invalid YAML manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse failure
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse failure
    #[error("invalid TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),

    /// Registry section is inconsistent
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    /// Request section is inconsistent
    #[error("request: {0}")]
    Request(#[from] RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::UnknownScope {
            scope: "method".into(),
            referrer: "inline".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown scope level `method` referenced by `inline`"
        );
    }

    #[test]
    fn manifest_error_wraps_request_error() {
        let err = ManifestError::from(RequestError::NoProducer("dll".into()));
        assert!(matches!(err, ManifestError::Request(RequestError::NoProducer(_))));
        assert_eq!(err.to_string(), "request: no registered unit produces `dll`");
    }
}
