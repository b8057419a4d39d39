use k2tf_document::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("invalid naming pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse provider schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider schema contains no resource schemas")]
    NoResources,
}

/// Structural failures that abort the translation of one object.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("root of the object is a {0:?}, not a record")]
    RootNotRecord(crate::source::NodeShape),

    #[error("object has no kind")]
    MissingKind,

    #[error("object has no metadata.name")]
    MissingName,

    #[error("resource type '{0}' is not supported by the target schema")]
    UnsupportedResource(String),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("block tree invariant violated: {0}")]
    Invariant(#[from] TreeError),
}
