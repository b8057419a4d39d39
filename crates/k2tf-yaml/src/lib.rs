#![doc = include_str!("../README.md")]

mod catalog;
mod config;
mod decode;
mod error;

pub use catalog::{Catalog, CatalogField, FieldType};
pub use config::Config;
pub use decode::{Decoded, decode_str, decode_str_with_config};
pub use error::{CatalogError, DecodeError};

#[cfg(test)]
mod tests;
