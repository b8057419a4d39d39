use indexmap::IndexMap;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl core::fmt::Display for BlockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Attribute { name: String, value: Value },
    Block(BlockId),
}

/// Where a block is in its lifecycle. Every state except `Open` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Open,
    /// The document root, committed directly.
    Committed,
    /// Attached to the parent scope as a nested block or a map attribute.
    Attached,
    /// Inlined block whose children were written through to an ancestor.
    Flattened,
    /// Closed without a value.
    Dropped,
    /// Closed because the target schema does not know it.
    Rejected,
}

/// How [`BlockTree::close`] finishes an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attach,
    AttachAsMap,
    Flatten,
    Drop,
    Reject,
}

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum TreeError {
    #[error("block {id} is already closed")]
    AlreadyClosed { id: BlockId },
    #[error("block {id} has no parent")]
    NoParent { id: BlockId },
    #[error("parent {parent} of block {id} is already closed")]
    ParentClosed { id: BlockId, parent: BlockId },
    #[error("block {id} is not a root block")]
    NotRoot { id: BlockId },
    #[error("a root block is already committed")]
    RootAlreadyCommitted,
}

#[derive(Debug, Clone)]
pub struct BlockNode {
    /// Normalized target identifier.
    pub name: String,
    /// Block labels, e.g. resource type and name on the root block.
    pub labels: Vec<String>,
    /// Dotted path used for schema lookups.
    pub schema_path: String,
    pub parent: Option<BlockId>,
    pub has_value: bool,
    pub inlined: bool,
    pub unsupported: bool,
    pub is_map: bool,
    pub map_entries: IndexMap<String, Value>,
    scope: BlockId,
    entries: Vec<Entry>,
    state: BlockState,
}

impl BlockNode {
    /// The block that receives writes aimed at this one.
    pub fn scope(&self) -> BlockId {
        self.scope
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == BlockState::Open
    }
}

/// Arena of blocks. Parent and child links are [`BlockId`]s into the arena.
#[derive(Debug, Clone, Default)]
pub struct BlockTree {
    nodes: Vec<BlockNode>,
    root: Option<BlockId>,
}

impl BlockTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        name: String,
        labels: Vec<String>,
        schema_path: String,
        parent: Option<BlockId>,
        inlined: bool,
    ) -> BlockId {
        let id = BlockId(self.nodes.len());
        // Inlined blocks forward to the scope of their parent, which is already
        // resolved through any inlined ancestors.
        let scope = match parent {
            Some(parent) if inlined => self.nodes[parent.0].scope,
            _ => id,
        };
        self.nodes.push(BlockNode {
            name,
            labels,
            schema_path,
            parent,
            has_value: false,
            inlined,
            unsupported: false,
            is_map: false,
            map_entries: IndexMap::new(),
            scope,
            entries: Vec::new(),
            state: BlockState::Open,
        });
        id
    }

    pub fn open_root(
        &mut self,
        name: impl Into<String>,
        labels: Vec<String>,
        schema_path: impl Into<String>,
    ) -> BlockId {
        self.push(name.into(), labels, schema_path.into(), None, false)
    }

    pub fn open_child(
        &mut self,
        parent: BlockId,
        name: impl Into<String>,
        schema_path: impl Into<String>,
        inlined: bool,
    ) -> BlockId {
        self.push(name.into(), Vec::new(), schema_path.into(), Some(parent), inlined)
    }

    pub fn node(&self, id: BlockId) -> &BlockNode {
        &self.nodes[id.0]
    }

    pub fn get_node(&self, id: BlockId) -> Option<&BlockNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: BlockId) -> &mut BlockNode {
        &mut self.nodes[id.0]
    }

    /// Number of blocks ever opened, including dropped ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn scope_of(&self, id: BlockId) -> BlockId {
        self.nodes[id.0].scope
    }

    /// Set an attribute in the scope of `id`, replacing a previous value of the
    /// same name.
    pub fn set_attribute(&mut self, id: BlockId, name: impl Into<String>, value: Value) {
        let scope = self.scope_of(id);
        let name = name.into();
        let entries = &mut self.nodes[scope.0].entries;
        let existing = entries.iter_mut().find_map(|entry| match entry {
            Entry::Attribute { name: n, value: v } if *n == name => Some(v),
            _ => None,
        });
        match existing {
            Some(slot) => *slot = value,
            None => entries.push(Entry::Attribute { name, value }),
        }
    }

    pub fn insert_map_entry(&mut self, id: BlockId, key: impl Into<String>, value: Value) {
        self.nodes[id.0].map_entries.insert(key.into(), value);
    }

    /// Close an open child block. Attached blocks land in the scope of their
    /// parent.
    pub fn close(
        &mut self,
        id: BlockId,
        disposition: Disposition,
    ) -> Result<BlockState, TreeError> {
        let node = &self.nodes[id.0];
        if !node.is_open() {
            return Err(TreeError::AlreadyClosed { id });
        }
        let parent = node.parent.ok_or(TreeError::NoParent { id })?;
        if !self.nodes[parent.0].is_open() {
            return Err(TreeError::ParentClosed { id, parent });
        }

        let state = match disposition {
            Disposition::Attach => {
                let scope = self.scope_of(parent);
                self.nodes[scope.0].entries.push(Entry::Block(id));
                BlockState::Attached
            }
            Disposition::AttachAsMap => {
                let name = node.name.clone();
                let map = node.map_entries.clone();
                self.set_attribute(parent, name, Value::Object(map));
                BlockState::Attached
            }
            Disposition::Flatten => BlockState::Flattened,
            Disposition::Drop => BlockState::Dropped,
            Disposition::Reject => BlockState::Rejected,
        };
        self.nodes[id.0].state = state;
        Ok(state)
    }

    pub fn commit_root(&mut self, id: BlockId) -> Result<(), TreeError> {
        let node = &self.nodes[id.0];
        if !node.is_open() {
            return Err(TreeError::AlreadyClosed { id });
        }
        if node.parent.is_some() {
            return Err(TreeError::NotRoot { id });
        }
        if self.root.is_some() {
            return Err(TreeError::RootAlreadyCommitted);
        }
        self.nodes[id.0].state = BlockState::Committed;
        self.root = Some(id);
        Ok(())
    }

    pub fn root_id(&self) -> Option<BlockId> {
        self.root
    }

    pub fn root(&self) -> Option<BlockRef<'_>> {
        self.root.map(|id| self.block(id))
    }

    pub fn block(&self, id: BlockId) -> BlockRef<'_> {
        BlockRef { tree: self, id }
    }
}

impl PartialEq for BlockTree {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

/// Read-only view of a block for renderers.
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'t> {
    tree: &'t BlockTree,
    id: BlockId,
}

#[derive(Debug, Clone, Copy)]
pub enum EntryRef<'t> {
    Attribute { name: &'t str, value: &'t Value },
    Block(BlockRef<'t>),
}

impl<'t> BlockRef<'t> {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn node(&self) -> &'t BlockNode {
        self.tree.node(self.id)
    }

    pub fn name(&self) -> &'t str {
        &self.node().name
    }

    pub fn labels(&self) -> &'t [String] {
        &self.node().labels
    }

    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'t>> + use<'t> {
        let tree = self.tree;
        self.node().entries.iter().map(move |entry| match entry {
            Entry::Attribute { name, value } => EntryRef::Attribute { name, value },
            Entry::Block(id) => EntryRef::Block(tree.block(*id)),
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'t str, &'t Value)> + use<'t> {
        self.entries().filter_map(|entry| match entry {
            EntryRef::Attribute { name, value } => Some((name, value)),
            EntryRef::Block(_) => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&'t Value> {
        self.attributes().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn blocks<'n>(&self, name: &'n str) -> impl Iterator<Item = BlockRef<'t>> + use<'t, 'n> {
        self.entries().filter_map(move |entry| match entry {
            EntryRef::Block(block) if block.name() == name => Some(block),
            _ => None,
        })
    }

    pub fn block(&self, name: &str) -> Option<BlockRef<'t>> {
        self.blocks(name).next()
    }

    pub fn is_empty(&self) -> bool {
        self.node().entries.is_empty()
    }
}

impl PartialEq for BlockRef<'_> {
    /// Structural comparison, ignoring block ids.
    fn eq(&self, other: &Self) -> bool {
        if self.name() != other.name() || self.labels() != other.labels() {
            return false;
        }
        let (left, right) = (self.node().entries(), other.node().entries());
        left.len() == right.len()
            && self.entries().zip(other.entries()).all(|pair| match pair {
                (
                    EntryRef::Attribute { name: n1, value: v1 },
                    EntryRef::Attribute { name: n2, value: v2 },
                ) => n1 == n2 && v1 == v2,
                (EntryRef::Block(b1), EntryRef::Block(b2)) => b1 == b2,
                _ => false,
            })
    }
}
