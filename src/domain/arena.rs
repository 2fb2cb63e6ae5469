//! Arena-backed font tree with derived directory selection state.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

/// Kind of filesystem entry a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    FontFile,
}

/// Data payload for tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Absolute path, unique per tree
    pub path: PathBuf,
    /// Display label: directory name or file name
    pub name: String,
    pub kind: NodeKind,
}

impl NodeData {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), NodeKind::Directory)
    }

    pub fn font_file(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), NodeKind::FontFile)
    }

    fn new(path: PathBuf, kind: NodeKind) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name, kind }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct FontNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Children in enumeration order: font files first, then sub-directories
    pub children: Vec<Index>,
    checked: bool,
}

impl FontNode {
    /// Authoritative for font files, derived for directories.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn is_directory(&self) -> bool {
        self.data.kind == NodeKind::Directory
    }

    pub fn is_font_file(&self) -> bool {
        self.data.kind == NodeKind::FontFile
    }
}

/// One session's font tree.
///
/// Nodes own their children through the arena; `parent` is only used to walk
/// upwards. The tree is rebuilt wholesale on every refresh.
#[derive(Debug, Default)]
pub struct FontTree {
    arena: Arena<FontNode>,
    root: Option<Index>,
    by_path: HashMap<PathBuf, Index>,
}

impl FontTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, checked: bool, parent: Option<Index>) -> Index {
        let path = data.path.clone();
        let node = FontNode {
            data,
            parent,
            children: Vec::new(),
            checked,
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }
        self.by_path.insert(path, node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&FontNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&FontNode> {
        self.root.and_then(|idx| self.get_node(idx))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Look up a node by its absolute path.
    pub fn find(&self, path: &Path) -> Option<Index> {
        self.by_path.get(path).copied()
    }

    pub fn is_checked(&self, idx: Index) -> bool {
        self.get_node(idx).map(FontNode::is_checked).unwrap_or(false)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order walk over `idx` and everything below it.
    pub fn subtree(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, Some(idx))
    }

    /// Post-order walk over `idx` and everything below it: children before parents.
    pub fn subtree_postorder(&self, idx: Index) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, idx)
    }

    /// Walk from the parent of `idx` up to and including the root.
    pub fn ancestors(&self, idx: Index) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get_node(idx).and_then(|n| n.parent),
        }
    }

    pub fn font_files(&self) -> impl Iterator<Item = (Index, &FontNode)> {
        self.iter().filter(|(_, node)| node.is_font_file())
    }

    /// Paths of all font files currently checked.
    pub fn checked_font_paths(&self) -> Vec<PathBuf> {
        self.font_files()
            .filter(|(_, node)| node.checked)
            .map(|(_, node)| node.data.path.clone())
            .collect()
    }

    /// Checked and total font-file counts below `idx` (inclusive).
    pub fn font_counts(&self, idx: Index) -> (usize, usize) {
        self.subtree(idx)
            .filter(|(_, node)| node.is_font_file())
            .fold((0, 0), |(checked, total), (_, node)| {
                (checked + usize::from(node.checked), total + 1)
            })
    }

    /// True if any direct child of `idx` is a directory.
    pub fn has_subdirectory(&self, idx: Index) -> bool {
        self.get_node(idx)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| self.get_node(c))
                    .any(FontNode::is_directory)
            })
            .unwrap_or(false)
    }

    /// Directory aggregate: at least one child and every child checked.
    pub fn aggregate_checked(&self, idx: Index) -> bool {
        match self.get_node(idx) {
            Some(node) => {
                !node.children.is_empty() && node.children.iter().all(|&c| self.is_checked(c))
            }
            None => false,
        }
    }

    /// Re-derive one directory's state from its children.
    ///
    /// Font files are left alone. Returns true if the state changed.
    pub fn refresh_directory(&mut self, idx: Index) -> bool {
        let is_dir = self.get_node(idx).map(FontNode::is_directory).unwrap_or(false);
        if !is_dir {
            return false;
        }
        let aggregate = self.aggregate_checked(idx);
        match self.arena.get_mut(idx) {
            Some(node) if node.checked != aggregate => {
                node.checked = aggregate;
                true
            }
            _ => false,
        }
    }

    /// Recompute every ancestor of `idx` up to the root.
    ///
    /// Never stops early: an unchanged ancestor can still have a changed
    /// ancestor above it. Returns the number of ancestors that changed.
    #[instrument(level = "trace", skip(self))]
    pub fn rollup_ancestors(&mut self, idx: Index) -> usize {
        let chain: Vec<Index> = self.ancestors(idx).map(|(i, _)| i).collect();
        let mut changed = 0;
        for ancestor in chain {
            if self.refresh_directory(ancestor) {
                changed += 1;
            }
        }
        changed
    }

    /// Assign `checked` to `idx` and every node beneath it.
    ///
    /// Pure data mutation with no side effects. Font files take the value
    /// directly; directories in the subtree are then re-derived bottom-up, so
    /// an empty directory stays unchecked. Returns the font files whose state
    /// actually changed, in pre-order.
    #[instrument(level = "trace", skip(self))]
    pub fn assign_subtree(&mut self, idx: Index, checked: bool) -> Vec<Index> {
        let order: Vec<Index> = self.subtree(idx).map(|(i, _)| i).collect();
        let mut changed = Vec::new();

        for node_idx in order {
            if let Some(node) = self.arena.get_mut(node_idx) {
                if node.is_font_file() && node.checked != checked {
                    node.checked = checked;
                    changed.push(node_idx);
                }
            }
        }

        let directories: Vec<Index> = self
            .subtree_postorder(idx)
            .filter(|(_, node)| node.is_directory())
            .map(|(i, _)| i)
            .collect();
        for dir_idx in directories {
            self.refresh_directory(dir_idx);
        }

        trace!(changed = changed.len(), "assign_subtree");
        changed
    }

    /// True if any node strictly below `idx` is checked. Stops at the first hit.
    pub fn has_checked_descendant(&self, idx: Index) -> bool {
        self.subtree(idx).skip(1).any(|(_, node)| node.checked)
    }

    /// Every directory satisfies the aggregate rule.
    pub fn is_consistent(&self) -> bool {
        self.iter()
            .filter(|(_, node)| node.is_directory())
            .all(|(idx, node)| node.checked == self.aggregate_checked(idx))
    }
}

pub struct TreeIterator<'a> {
    tree: &'a FontTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a FontTree, start: Option<Index>) -> Self {
        Self {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a FontNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a FontTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a FontTree, start: Index) -> Self {
        Self {
            tree,
            stack: vec![(start, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a FontNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

pub struct Ancestors<'a> {
    tree: &'a FontTree,
    next: Option<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (Index, &'a FontNode);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.tree.get_node(idx)?;
        self.next = node.parent;
        Some((idx, node))
    }
}
