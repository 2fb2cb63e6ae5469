//! Selection propagation
//!
//! One user toggle becomes one cascade: a pure state assignment over the
//! subtree, then a single pass of store writes for the font files whose state
//! actually changed, then the ancestor rollup and, for deselections, the
//! stale-subtree climb.

use std::path::PathBuf;
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::application::services::prune::StalePruner;
use crate::domain::{FontTree, NodeKind, RegistrationEntry};
use crate::infrastructure::traits::RegistrationStore;

/// Store write that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    pub name: String,
    pub message: String,
}

/// Everything one toggle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleReport {
    /// Registration names inserted, in visit order
    pub inserted: Vec<String>,
    /// Registration names deleted, in visit order
    pub deleted: Vec<String>,
    /// Store writes that failed; the tree keeps the requested state regardless
    pub failures: Vec<StoreFailure>,
    /// Ancestors whose derived state flipped
    pub ancestors_changed: usize,
    /// Highest directory left without any checked descendant
    pub stale_root: Option<PathBuf>,
}

impl ToggleReport {
    /// Number of store calls issued, successful or not.
    pub fn store_calls(&self) -> usize {
        self.inserted.len() + self.deleted.len() + self.failures.len()
    }

    pub fn is_noop(&self) -> bool {
        self.store_calls() == 0 && self.ancestors_changed == 0
    }
}

/// Applies user toggles to a tree and mirrors font-file changes into the store.
pub struct SelectionService {
    store: Arc<dyn RegistrationStore>,
    pruner: StalePruner,
}

impl SelectionService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            store,
            pruner: StalePruner::new(),
        }
    }

    /// Set `node` to `checked` and run the full cascade.
    ///
    /// Never fails: store errors are logged and collected in the report while
    /// the tree keeps the requested state. Unknown indices yield an empty
    /// report.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn toggle(&self, tree: &mut FontTree, node: Index, checked: bool) -> ToggleReport {
        let mut report = ToggleReport::default();
        let Some(kind) = tree.get_node(node).map(|n| n.data.kind) else {
            warn!("toggle: node {:?} is not part of this tree", node);
            return report;
        };

        let changed = tree.assign_subtree(node, checked);
        for idx in changed {
            if let Some(font) = tree.get_node(idx) {
                let path = font.data.path.clone();
                self.write_registration(&path, checked, &mut report);
            }
        }

        report.ancestors_changed = tree.rollup_ancestors(node);

        if !checked {
            let start = match kind {
                NodeKind::FontFile => tree.get_node(node).and_then(|n| n.parent),
                NodeKind::Directory => Some(node),
            };
            if let Some(start) = start {
                let outcome = self.pruner.prune(tree, start);
                report.stale_root = outcome
                    .stale_root
                    .and_then(|idx| tree.get_node(idx))
                    .map(|n| n.data.path.clone());
            }
        }

        debug!(
            "toggle: +{} -{} failed={} ancestors_changed={}",
            report.inserted.len(),
            report.deleted.len(),
            report.failures.len(),
            report.ancestors_changed
        );
        report
    }

    fn write_registration(&self, path: &std::path::Path, checked: bool, report: &mut ToggleReport) {
        let RegistrationEntry { name, path } = RegistrationEntry::for_font(path);
        let result = if checked {
            self.store.insert(&name, &path)
        } else {
            self.store.delete(&name)
        };

        match result {
            Ok(()) if checked => report.inserted.push(name),
            Ok(()) => report.deleted.push(name),
            Err(e) => {
                warn!("registration store write for '{}' failed: {}", name, e);
                report.failures.push(StoreFailure {
                    name,
                    message: e.to_string(),
                });
            }
        }
    }
}
