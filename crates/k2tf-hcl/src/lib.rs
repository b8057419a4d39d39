#![doc = include_str!("../README.md")]

mod config;
mod render;
mod syntax;

pub use config::RenderConfig;
pub use render::{Renderer, to_hcl, write_hcl};
pub use syntax::{is_identifier, quote};
