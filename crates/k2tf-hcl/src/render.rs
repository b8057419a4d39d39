use core::fmt::{self, Write};

use k2tf_document::{BlockRef, BlockTree, EntryRef, Value};

use crate::config::RenderConfig;
use crate::syntax::{inline_value, key, quote};

/// One line-level item of a block body or a multi-line object.
#[derive(Clone, Copy)]
enum Item<'t> {
    Attribute(&'t str, &'t Value),
    Block(BlockRef<'t>),
}

/// Writes block trees as HCL.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, tree: &BlockTree) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write(tree, &mut out);
        out
    }

    /// Write the committed root of `tree`. A tree without a root writes
    /// nothing.
    pub fn write<W: Write + ?Sized>(&self, tree: &BlockTree, out: &mut W) -> fmt::Result {
        match tree.root() {
            Some(root) => self.write_block(root, 0, out),
            None => Ok(()),
        }
    }

    fn write_block<W: Write + ?Sized>(
        &self,
        block: BlockRef<'_>,
        depth: usize,
        out: &mut W,
    ) -> fmt::Result {
        self.indent(depth, out)?;
        out.write_str(block.name())?;
        for label in block.labels() {
            write!(out, " {}", quote(label))?;
        }
        out.write_str(" {\n")?;
        let items: Vec<_> = block
            .entries()
            .map(|entry| match entry {
                EntryRef::Attribute { name, value } => Item::Attribute(name, value),
                EntryRef::Block(block) => Item::Block(block),
            })
            .collect();
        self.write_items(&items, depth + 1, out)?;
        self.indent(depth, out)?;
        out.write_str("}\n")
    }

    fn write_items<W: Write + ?Sized>(
        &self,
        items: &[Item<'_>],
        depth: usize,
        out: &mut W,
    ) -> fmt::Result {
        let mut run = Vec::new();
        for item in items {
            match *item {
                Item::Attribute(name, value) if !is_multiline(value) => {
                    run.push((key(name), value));
                }
                Item::Attribute(name, value) => {
                    self.write_run(&mut run, depth, out)?;
                    self.write_object(&key(name), value, depth, out)?;
                }
                Item::Block(block) => {
                    self.write_run(&mut run, depth, out)?;
                    self.write_block(block, depth, out)?;
                }
            }
        }
        self.write_run(&mut run, depth, out)
    }

    /// Write and clear a run of consecutive single-line attributes.
    fn write_run<W: Write + ?Sized>(
        &self,
        run: &mut Vec<(String, &Value)>,
        depth: usize,
        out: &mut W,
    ) -> fmt::Result {
        let width = if self.config.align_equals {
            run.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0)
        } else {
            0
        };
        for (name, value) in run.drain(..) {
            self.indent(depth, out)?;
            writeln!(out, "{name:<width$} = {}", inline_value(value))?;
        }
        Ok(())
    }

    fn write_object<W: Write + ?Sized>(
        &self,
        name: &str,
        value: &Value,
        depth: usize,
        out: &mut W,
    ) -> fmt::Result {
        let Value::Object(map) = value else {
            self.indent(depth, out)?;
            return writeln!(out, "{name} = {}", inline_value(value));
        };
        self.indent(depth, out)?;
        writeln!(out, "{name} = {{")?;
        let items: Vec<_> = map.iter().map(|(k, v)| Item::Attribute(k.as_str(), v)).collect();
        self.write_items(&items, depth + 1, out)?;
        self.indent(depth, out)?;
        out.write_str("}\n")
    }

    fn indent<W: Write + ?Sized>(&self, depth: usize, out: &mut W) -> fmt::Result {
        write!(out, "{:width$}", "", width = depth * self.config.indent_width)
    }
}

fn is_multiline(value: &Value) -> bool {
    matches!(value, Value::Object(map) if !map.is_empty())
}

/// Render `tree` with the default configuration.
pub fn to_hcl(tree: &BlockTree) -> String {
    Renderer::default().render(tree)
}

pub fn write_hcl<W: Write + ?Sized>(tree: &BlockTree, out: &mut W) -> fmt::Result {
    Renderer::default().write(tree, out)
}
