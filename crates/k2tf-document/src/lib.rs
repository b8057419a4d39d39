#![doc = include_str!("../README.md")]

/// Arena of output blocks and the read-only traversal API.
pub mod tree;

/// Values written into attributes.
pub mod value;

pub use tree::{
    BlockId, BlockNode, BlockRef, BlockState, BlockTree, Disposition, Entry, EntryRef, TreeError,
};
pub use value::{Value, ValueKind};
