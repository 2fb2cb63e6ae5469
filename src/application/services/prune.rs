//! Stale entry pruning after a deselection.

use generational_arena::Index;
use tracing::trace;

use crate::domain::FontTree;

/// Result of one pruning climb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Highest node found with no checked descendant
    pub stale_root: Option<Index>,
}

/// Climbs from a deselected node while whole subtrees have gone stale.
///
/// Directories never own registrations, so releasing a stale directory
/// touches no store entry; the climb only establishes how far the
/// deselection reached.
#[derive(Debug, Default, Clone, Copy)]
pub struct StalePruner;

impl StalePruner {
    pub fn new() -> Self {
        Self
    }

    /// Walk up from `start` towards the root.
    ///
    /// Stops at the first node that still has a checked descendant: every
    /// node above it contains that descendant too.
    pub fn prune(&self, tree: &FontTree, start: Index) -> PruneOutcome {
        let mut outcome = PruneOutcome::default();
        let mut current = Some(start);

        while let Some(idx) = current {
            if tree.has_checked_descendant(idx) {
                break;
            }
            self.release_directory(tree, idx);
            outcome.stale_root = Some(idx);
            current = tree.get_node(idx).and_then(|node| node.parent);
        }
        outcome
    }

    fn release_directory(&self, tree: &FontTree, idx: Index) {
        if let Some(node) = tree.get_node(idx) {
            trace!("stale subtree: {}", node.data.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeData;

    #[test]
    fn given_checked_sibling_when_pruning_then_stops_at_first_ancestor() {
        let mut tree = FontTree::new();
        let root = tree.insert_node(NodeData::directory("/F"), false, None);
        let dir = tree.insert_node(NodeData::directory("/F/A"), false, Some(root));
        tree.insert_node(NodeData::font_file("/F/A/a.ttf"), false, Some(dir));
        tree.insert_node(NodeData::font_file("/F/A/b.ttf"), true, Some(dir));

        let outcome = StalePruner::new().prune(&tree, dir);

        assert_eq!(outcome, PruneOutcome { stale_root: None });
    }

    #[test]
    fn given_fully_stale_chain_when_pruning_then_climbs_to_root() {
        let mut tree = FontTree::new();
        let root = tree.insert_node(NodeData::directory("/F"), false, None);
        let a = tree.insert_node(NodeData::directory("/F/A"), false, Some(root));
        let b = tree.insert_node(NodeData::directory("/F/A/B"), false, Some(a));
        tree.insert_node(NodeData::font_file("/F/A/B/x.ttf"), false, Some(b));

        let outcome = StalePruner::new().prune(&tree, b);

        assert_eq!(outcome.stale_root, Some(root));
    }

    #[test]
    fn given_checked_font_higher_up_when_pruning_then_stops_there() {
        let mut tree = FontTree::new();
        let root = tree.insert_node(NodeData::directory("/F"), false, None);
        tree.insert_node(NodeData::font_file("/F/keep.ttf"), true, Some(root));
        let a = tree.insert_node(NodeData::directory("/F/A"), false, Some(root));
        tree.insert_node(NodeData::font_file("/F/A/x.ttf"), false, Some(a));

        let outcome = StalePruner::new().prune(&tree, a);

        assert_eq!(outcome.stale_root, Some(a));
    }
}
