use k2tf::QuantityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid field type '{0}'")]
    InvalidType(String),

    #[error("field '{owner}.{field}' refers to unknown type '{name}'")]
    UnknownType {
        owner: String,
        field: String,
        name: String,
    },

    #[error("inline field '{owner}.{field}' must have a record type")]
    InlineNotRecord { owner: String, field: String },

    #[error("inline fields form a cycle: {0}")]
    InlineCycle(String),
}

/// Failure to decode one YAML document. `document` counts from 1.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("document {document}: invalid YAML: {source}")]
    Yaml {
        document: usize,
        source: serde_yaml::Error,
    },

    #[error("document {document}: expected a mapping at the top level")]
    NotAMapping { document: usize },

    #[error("document {document}: missing kind")]
    MissingKind { document: usize },

    #[error("document {document}: unknown kind '{kind}'")]
    UnknownKind { document: usize, kind: String },

    #[error("document {document}: {path}: expected {expected}, found {found}")]
    TypeMismatch {
        document: usize,
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("document {document}: {path}: {source}")]
    InvalidQuantity {
        document: usize,
        path: String,
        source: QuantityError,
    },

    #[error("document {document}: items of a List must be a sequence")]
    ListItems { document: usize },
}

impl DecodeError {
    pub fn document(&self) -> usize {
        match self {
            Self::Yaml { document, .. }
            | Self::NotAMapping { document }
            | Self::MissingKind { document }
            | Self::UnknownKind { document, .. }
            | Self::TypeMismatch { document, .. }
            | Self::InvalidQuantity { document, .. }
            | Self::ListItems { document } => *document,
        }
    }
}
