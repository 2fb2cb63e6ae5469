//! Checkbox-style rendering of a font tree.

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;

use crate::domain::{FontNode, FontTree};

pub trait TreeRender {
    /// Build a `termtree::Tree` with checkbox labels; `Display` it for text.
    ///
    /// Collapsed mode expands directories that contain sub-directories and
    /// folds leaf folders into a single row with a font count.
    fn to_tree(&self, expand_all: bool) -> Tree<String>;
}

impl TreeRender for FontTree {
    fn to_tree(&self, expand_all: bool) -> Tree<String> {
        match self.root() {
            Some(root) => render_node(self, root, expand_all),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

fn render_node(tree: &FontTree, idx: Index, expand_all: bool) -> Tree<String> {
    let Some(node) = tree.get_node(idx) else {
        return Tree::new(String::new());
    };

    if node.is_font_file() {
        return Tree::new(label(node, None));
    }

    let expand = expand_all || tree.has_subdirectory(idx) || node.children.is_empty();
    if !expand {
        return Tree::new(label(node, Some(tree.font_counts(idx))));
    }

    let leaves: Vec<_> = node
        .children
        .iter()
        .map(|&child| render_node(tree, child, expand_all))
        .collect();
    Tree::new(label(node, None)).with_leaves(leaves)
}

fn label(node: &FontNode, counts: Option<(usize, usize)>) -> String {
    let mark = if node.is_checked() {
        "[x]".green().to_string()
    } else {
        "[ ]".normal().to_string()
    };
    let name = if node.is_directory() {
        format!("{}/", node.data.name).blue().bold().to_string()
    } else {
        node.data.name.clone()
    };
    match counts {
        Some((checked, total)) => format!("{mark} {name} ({checked}/{total} fonts)"),
        None => format!("{mark} {name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeData;

    fn sample() -> FontTree {
        let mut tree = FontTree::new();
        let root = tree.insert_node(NodeData::directory("/F"), false, None);
        tree.insert_node(NodeData::font_file("/F/top.ttf"), true, Some(root));
        let a = tree.insert_node(NodeData::directory("/F/A"), false, Some(root));
        tree.insert_node(NodeData::font_file("/F/A/x.ttf"), true, Some(a));
        tree.insert_node(NodeData::font_file("/F/A/y.ttf"), false, Some(a));
        tree
    }

    #[test]
    fn given_collapsed_view_when_rendering_then_leaf_folder_shows_counts() {
        colored::control::set_override(false);
        let rendered = sample().to_tree(false).to_string();

        assert!(rendered.contains("[x] top.ttf"));
        assert!(rendered.contains("[ ] A/ (1/2 fonts)"));
        assert!(!rendered.contains("x.ttf"));
    }

    #[test]
    fn given_expanded_view_when_rendering_then_lists_every_font() {
        colored::control::set_override(false);
        let rendered = sample().to_tree(true).to_string();

        assert!(rendered.contains("[x] x.ttf"));
        assert!(rendered.contains("[ ] y.ttf"));
        assert!(!rendered.contains("fonts)"));
    }

    #[test]
    fn given_expanded_view_when_building_tree_then_root_has_two_children() {
        colored::control::set_override(false);
        let tree = sample().to_tree(true);

        assert_eq!(tree.leaves.len(), 2);
        assert_eq!(tree.leaves[1].leaves.len(), 2);
    }

    #[test]
    fn given_empty_tree_when_building_then_placeholder_root() {
        let tree = FontTree::new().to_tree(false);
        assert_eq!(tree.root, "Empty tree");
        assert!(tree.leaves.is_empty());
    }
}
