/// Configuration for YAML decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Replace a `kind: List` document by its `items`.
    pub expand_lists: bool,
    /// Decode kinds missing from the catalog structurally instead of failing.
    pub allow_unknown_kinds: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expand_lists: true,
            allow_unknown_kinds: false,
        }
    }
}
