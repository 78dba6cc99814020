//! Field descriptors
//!
//! A [`FieldHeader`] describes one wire field: its name, tag and the byte
//! extent of its payload. The skip-addressing invariant holds for every
//! header produced by either codec:
//!
//! ```text
//! data_start + data_size == offset of the next sibling header
//! ```
//!
//! so a reader can always step over a field it does not understand.
//!
//! Decoded streams are arranged in a [`FieldTree`]: an arena of nodes
//! addressed by [`FieldId`]. Children are owned by the arena in insertion
//! order; the parent link is a plain id used for upward navigation only.

use crate::data_type::DataType;
use crate::error::{Result, WireError};
use std::fmt;

/// 32-bit hash of a field name, stored in primary field headers
pub fn field_hash(name: &str) -> i32 {
    name.bytes()
        .fold(0i32, |hash, b| hash.wrapping_mul(31).wrapping_add(i32::from(b)))
}

/// Optional descriptive metadata of a primary field header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    pub unit: Option<String>,
    pub description: Option<String>,
}

impl FieldMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.unit.is_none() && self.description.is_none()
    }
}

/// One field as read from (or written to) the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHeader {
    pub name: String,
    pub hash: i32,
    pub data_type: DataType,
    /// Codec-specific type byte as found on the wire
    pub wire_type: u8,
    /// Offset of the first header byte
    pub header_start: usize,
    /// Offset of the first payload byte
    pub data_start: usize,
    /// Payload bytes, including any nested fields
    pub data_size: usize,
    pub meta: FieldMeta,
}

impl FieldHeader {
    /// Offset immediately after the payload: where the next sibling starts
    pub fn data_end(&self) -> usize {
        self.data_start + self.data_size
    }

    /// Fail with a recoverable `TypeMismatch` unless the tag is `expected`
    pub fn expect_type(&self, expected: DataType) -> Result<()> {
        if self.data_type != expected {
            return Err(self.mismatch(expected));
        }
        Ok(())
    }

    pub(crate) fn mismatch(&self, expected: DataType) -> WireError {
        WireError::TypeMismatch {
            field: self.name.clone(),
            expected,
            found: self.data_type,
        }
    }
}

/// Stable handle of a node in a [`FieldTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A tree node: a header plus its position in the tree
#[derive(Debug, Clone)]
pub struct FieldNode {
    header: FieldHeader,
    parent: Option<FieldId>,
    children: Vec<FieldId>,
}

impl FieldNode {
    pub fn header(&self) -> &FieldHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn data_type(&self) -> DataType {
        self.header.data_type
    }

    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    pub fn children(&self) -> &[FieldId] {
        &self.children
    }
}

/// Field descriptors of one decoded stream
#[derive(Debug, Clone)]
pub struct FieldTree {
    nodes: Vec<FieldNode>,
}

#[allow(clippy::len_without_is_empty)]
impl FieldTree {
    /// Start a tree from its root descriptor
    pub fn new(root: FieldHeader) -> Self {
        Self {
            nodes: vec![FieldNode {
                header: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> FieldId {
        FieldId(0)
    }

    /// Append `header` as the last child of `parent`
    pub fn add_child(&mut self, parent: FieldId, header: FieldHeader) -> FieldId {
        let id = FieldId(self.nodes.len());
        self.nodes.push(FieldNode {
            header,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Node for an id issued by this tree
    pub fn node(&self, id: FieldId) -> &FieldNode {
        &self.nodes[id.0]
    }

    pub fn header(&self, id: FieldId) -> &FieldHeader {
        &self.nodes[id.0].header
    }

    pub fn parent(&self, id: FieldId) -> Option<FieldId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: FieldId) -> &[FieldId] {
        &self.nodes[id.0].children
    }

    /// Direct child of `id` named `name`
    pub fn find_child(&self, id: FieldId, name: &str) -> Option<FieldId> {
        let hash = field_hash(name);
        self.children(id).iter().copied().find(|&child| {
            let header = self.header(child);
            header.hash == hash && header.name == name
        })
    }

    /// Follow a path of child names from the root
    pub fn find_path(&self, path: &[&str]) -> Option<FieldId> {
        path.iter()
            .try_fold(self.root(), |id, name| self.find_child(id, name))
    }

    /// First node named `name`, depth-first
    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.walk().map(|(_, id)| id).find(|&id| self.header(id).name == name)
    }

    /// Number of ancestors
    pub fn depth(&self, id: FieldId) -> usize {
        std::iter::successors(self.parent(id), |&p| self.parent(p)).count()
    }

    /// Node count, root included; never zero
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Depth-first, pre-order traversal yielding `(depth, id)`
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![(0, self.root())],
        }
    }
}

/// Iterator returned by [`FieldTree::walk`]
pub struct Walk<'a> {
    tree: &'a FieldTree,
    stack: Vec<(usize, FieldId)>,
}

impl Iterator for Walk<'_> {
    type Item = (usize, FieldId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        for &child in self.tree.children(id).iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, id))
    }
}

impl fmt::Display for FieldTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, id) in self.walk() {
            let header = self.header(id);
            write!(
                f,
                "{:indent$}{} [{}] start={} size={}",
                "",
                header.name,
                header.data_type,
                header.data_start,
                header.data_size,
                indent = depth * 2
            )?;
            if let Some(unit) = &header.meta.unit {
                write!(f, " unit={}", unit)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
