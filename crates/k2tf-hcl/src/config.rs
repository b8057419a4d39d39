//! Renderer configuration.

/// Configuration options for the HCL renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Number of spaces per indentation level.
    /// Default: 2
    pub indent_width: usize,

    /// Pad attribute names so that `=` lines up across consecutive
    /// single-line attributes.
    /// Default: true
    pub align_equals: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            align_equals: true,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_align_equals(mut self, align: bool) -> Self {
        self.align_equals = align;
        self
    }
}
