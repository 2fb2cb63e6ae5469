//! Registry service
//!
//! Entry point for collaborators: refresh a tree from the store, toggle nodes,
//! and summarise registration status.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, info, instrument};

use crate::application::services::builder::FontTreeBuilder;
use crate::application::services::selection::{SelectionService, ToggleReport};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, FontMatcher, FontTree, RegistrationEntry, RegistrationSnapshot};
use crate::infrastructure::traits::{FileSystem, RegistrationStore};

/// Registration status of a built tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatus {
    pub root: PathBuf,
    pub fonts_total: usize,
    pub fonts_registered: usize,
    /// Entries under this tool's naming scheme pointing outside the tree
    pub outside_tree: Vec<RegistrationEntry>,
}

pub struct RegistryService {
    store: Arc<dyn RegistrationStore>,
    builder: FontTreeBuilder,
    selection: SelectionService,
}

impl RegistryService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn RegistrationStore>,
        matcher: FontMatcher,
    ) -> Self {
        Self {
            builder: FontTreeBuilder::new(fs, matcher),
            selection: SelectionService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Point-in-time read of the store.
    pub fn snapshot(&self) -> ApplicationResult<RegistrationSnapshot> {
        self.store
            .snapshot()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "read registration store".to_string(),
                source: Box::new(e),
            })
    }

    /// Discard any previous state and build a fresh tree below `root`.
    #[instrument(level = "debug", skip(self))]
    pub fn refresh(&self, root: &Path) -> ApplicationResult<FontTree> {
        let snapshot = self.snapshot()?;
        let tree = self.builder.build(root, &snapshot)?;
        info!("loaded {} nodes from {}", tree.len(), root.display());
        Ok(tree)
    }

    pub fn toggle(&self, tree: &mut FontTree, node: Index, checked: bool) -> ToggleReport {
        self.selection.toggle(tree, node, checked)
    }

    /// Toggle the node at `path`.
    pub fn toggle_path(
        &self,
        tree: &mut FontTree,
        path: &Path,
        checked: bool,
    ) -> ApplicationResult<ToggleReport> {
        let node = tree
            .find(path)
            .ok_or_else(|| DomainError::NodeNotFound(path.to_path_buf()))?;
        debug!("toggle_path: {} -> {}", path.display(), checked);
        Ok(self.toggle(tree, node, checked))
    }

    pub fn status(&self, tree: &FontTree) -> ApplicationResult<RegistryStatus> {
        let snapshot = self.snapshot()?;
        let root = tree
            .root_node()
            .map(|n| n.data.path.clone())
            .unwrap_or_default();
        let (fonts_registered, fonts_total) = tree
            .root()
            .map(|idx| tree.font_counts(idx))
            .unwrap_or((0, 0));
        let outside_tree = snapshot
            .own_entries()
            .filter(|entry| tree.find(&entry.path).is_none())
            .collect();

        Ok(RegistryStatus {
            root,
            fonts_total,
            fonts_registered,
            outside_tree,
        })
    }
}
