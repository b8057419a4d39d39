#![doc = include_str!("../README.md")]

pub mod config;
pub mod convert;
pub mod diagnostics;
/// Depth-first translation of source objects into block trees.
pub mod engine;
mod error;
pub mod naming;
pub mod quantity;
pub mod schema;
/// Source object model: records, sequences, mappings and scalars.
pub mod source;

pub use config::EngineConfig;
pub use convert::{ConversionRules, ScalarSite, ValueConverter};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use engine::{Translation, TranslationEngine};
pub use error::{NamingError, SchemaError, TranslateError};
pub use naming::{NameMapper, NameOverride, NamingRules, PathCondition, map_key};
pub use quantity::{Quantity, QuantityError};
pub use schema::{Permissive, ProviderSchema, SchemaOracle, Shape};
pub use source::{
    Field, FieldMeta, IntOrString, NodeShape, Record, Scalar, SourceNode, SourceObject, Wrapper,
};

pub use k2tf_document::{BlockTree, Value};
