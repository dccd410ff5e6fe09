use std::io::Write;
use std::path::Path;

use crate::core::error::IndexError;
use crate::storage::block::Block;
use crate::storage::header::FileHeader;
use crate::storage::node::{MAX_KEYS, MIN_DEGREE, Node};
use crate::storage::pager::Pager;

/// A disk-backed B-tree over fixed 512-byte blocks. Node id equals block
/// index; block 0 is the file header. Splits are proactive: a full child
/// is split on the way down, so splits never propagate upward.
pub struct BTreeIndex {
    pager: Pager,
    header: FileHeader,
}

impl BTreeIndex {
    /// Create a fresh index file. Any existing content at `path` is
    /// truncated; the caller decides whether overwriting is acceptable.
    pub fn create(path: &Path) -> Result<Self, IndexError> {
        let mut pager = Pager::create(path)?;
        let header = FileHeader::new();
        pager.write_block(&Block::from_bytes(0, header.to_bytes()))?;

        Ok(Self { pager, header })
    }

    /// Open an existing index file, validating the magic tag.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let mut pager = Pager::open(path)?;

        let block = match pager.read_block(0) {
            Ok(block) => block,
            // A file too short to hold a header cannot begin with the tag.
            Err(IndexError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(IndexError::NotAnIndex(path.to_path_buf()));
            }
            Err(e) => return Err(e),
        };

        let header = FileHeader::from_bytes(&block.data)
            .ok_or_else(|| IndexError::NotAnIndex(path.to_path_buf()))?;

        Ok(Self { pager, header })
    }

    pub fn root_id(&self) -> u64 {
        self.header.root_id
    }

    pub fn next_id(&self) -> u64 {
        self.header.next_id
    }

    fn read_node(&mut self, id: u64) -> Result<Node, IndexError> {
        let block = self.pager.read_block(id)?;
        Ok(Node::from_bytes(&block.data))
    }

    fn write_node(&mut self, node: &Node) -> Result<(), IndexError> {
        self.pager
            .write_block(&Block::from_bytes(node.id, node.to_bytes()))
    }

    fn write_header(&mut self) -> Result<(), IndexError> {
        self.pager
            .write_block(&Block::from_bytes(0, self.header.to_bytes()))
    }

    /// Allocate the next node id and write the empty node block. Header
    /// updates are batched by the caller.
    fn create_node(&mut self, is_leaf: bool) -> Result<Node, IndexError> {
        let node = Node::new(self.header.next_id, is_leaf);
        self.header.next_id += 1;
        self.write_node(&node)?;
        Ok(node)
    }

    pub fn search(&mut self, key: u64) -> Result<Option<(u64, u64)>, IndexError> {
        if self.header.root_id == 0 {
            return Ok(None);
        }
        let root = self.read_node(self.header.root_id)?;
        self.search_node(root, key)
    }

    fn search_node(&mut self, node: Node, key: u64) -> Result<Option<(u64, u64)>, IndexError> {
        let mut i = 0;
        while i < node.key_count && key > node.keys[i] {
            i += 1;
        }
        if i < node.key_count && node.keys[i] == key {
            return Ok(Some((node.keys[i], node.values[i])));
        }
        if node.is_leaf {
            return Ok(None);
        }
        let child = self.read_node(node.children[i])?;
        self.search_node(child, key)
    }

    /// Insert a pair. Duplicate keys are not rejected; both copies remain
    /// reachable by traversal. The header block is rewritten before
    /// returning whenever the root id or the next free id moved.
    pub fn insert(&mut self, key: u64, value: u64) -> Result<(), IndexError> {
        let before = self.header.clone();

        if self.header.root_id == 0 {
            let mut root = self.create_node(true)?;
            root.keys[0] = key;
            root.values[0] = value;
            root.key_count = 1;
            self.write_node(&root)?;
            self.header.root_id = root.id;
        } else {
            let root = self.read_node(self.header.root_id)?;
            if root.key_count == MAX_KEYS {
                let mut new_root = self.create_node(false)?;
                new_root.children[0] = root.id;
                self.split_child(&mut new_root, 0, root)?;
                self.header.root_id = new_root.id;
                self.insert_non_full(new_root, key, value)?;
            } else {
                self.insert_non_full(root, key, value)?;
            }
        }

        if self.header != before {
            self.write_header()?;
        }
        Ok(())
    }

    fn insert_non_full(&mut self, mut node: Node, key: u64, value: u64) -> Result<(), IndexError> {
        if node.is_leaf {
            let mut i = node.key_count;
            while i > 0 && key < node.keys[i - 1] {
                node.keys[i] = node.keys[i - 1];
                node.values[i] = node.values[i - 1];
                i -= 1;
            }
            node.keys[i] = key;
            node.values[i] = value;
            node.key_count += 1;
            return self.write_node(&node);
        }

        let mut i = node.key_count;
        while i > 0 && key < node.keys[i - 1] {
            i -= 1;
        }
        let child = self.read_node(node.children[i])?;
        if child.key_count == MAX_KEYS {
            self.split_child(&mut node, i, child)?;
            if key > node.keys[i] {
                i += 1;
            }
        }
        let child = self.read_node(node.children[i])?;
        self.insert_non_full(child, key, value)
    }

    /// Split the full `child` sitting at `parent.children[index]`. The
    /// median pair moves into the parent; the upper half moves into a
    /// fresh sibling. Writes child, sibling and parent.
    fn split_child(
        &mut self,
        parent: &mut Node,
        index: usize,
        mut child: Node,
    ) -> Result<(), IndexError> {
        let mut sibling = self.create_node(child.is_leaf)?;

        sibling.key_count = MIN_DEGREE - 1;
        for j in 0..MIN_DEGREE - 1 {
            sibling.keys[j] = child.keys[j + MIN_DEGREE];
            sibling.values[j] = child.values[j + MIN_DEGREE];
        }
        if !child.is_leaf {
            for j in 0..MIN_DEGREE {
                sibling.children[j] = child.children[j + MIN_DEGREE];
            }
            // Clear the moved-out slots so a non-leaf block carries exactly
            // key_count + 1 children on disk.
            for j in MIN_DEGREE..child.children.len() {
                child.children[j] = 0;
            }
        }
        child.key_count = MIN_DEGREE - 1;

        let mut j = parent.key_count;
        while j > index {
            parent.children[j + 1] = parent.children[j];
            j -= 1;
        }
        parent.children[index + 1] = sibling.id;

        let mut j = parent.key_count;
        while j > index {
            parent.keys[j] = parent.keys[j - 1];
            parent.values[j] = parent.values[j - 1];
            j -= 1;
        }
        parent.keys[index] = child.keys[MIN_DEGREE - 1];
        parent.values[index] = child.values[MIN_DEGREE - 1];
        parent.key_count += 1;

        self.write_node(&child)?;
        self.write_node(&sibling)?;
        self.write_node(parent)?;
        Ok(())
    }

    /// Write an indented structural dump: one line per node with its id
    /// and occupied key slots, children in order beneath it.
    pub fn dump(&mut self, out: &mut impl Write) -> Result<(), IndexError> {
        if self.header.root_id == 0 {
            return Ok(());
        }
        let root = self.read_node(self.header.root_id)?;
        self.dump_node(out, root, 0)
    }

    fn dump_node(
        &mut self,
        out: &mut impl Write,
        node: Node,
        level: usize,
    ) -> Result<(), IndexError> {
        writeln!(
            out,
            "{}Node {}: {:?}",
            "  ".repeat(level),
            node.id,
            node.active_keys()
        )?;
        if !node.is_leaf {
            for i in 0..=node.key_count {
                let child = self.read_node(node.children[i])?;
                self.dump_node(out, child, level + 1)?;
            }
        }
        Ok(())
    }

    /// Emit every `key,value` pair in key order (in-order interleave:
    /// leftmost child, key 0, next child, key 1, ...). Returns the number
    /// of pairs written.
    pub fn extract(&mut self, out: &mut impl Write) -> Result<usize, IndexError> {
        if self.header.root_id == 0 {
            return Ok(0);
        }
        let root = self.read_node(self.header.root_id)?;
        self.extract_node(out, root)
    }

    fn extract_node(&mut self, out: &mut impl Write, node: Node) -> Result<usize, IndexError> {
        let mut written = 0;

        if node.is_leaf {
            for i in 0..node.key_count {
                writeln!(out, "{},{}", node.keys[i], node.values[i])?;
                written += 1;
            }
            return Ok(written);
        }

        for i in 0..node.key_count {
            let child = self.read_node(node.children[i])?;
            written += self.extract_node(out, child)?;
            writeln!(out, "{},{}", node.keys[i], node.values[i])?;
            written += 1;
        }
        let last = self.read_node(node.children[node.key_count])?;
        written += self.extract_node(out, last)?;

        Ok(written)
    }
}
