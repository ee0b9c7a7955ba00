use nxgradle_core::fs::FileSystem;
use nxgradle_core::output::ReportEntry;
use nxgradle_core::paths::path_key;
use nxgradle_core::NodesError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Introspection report: project root directory to report entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodesReport {
    nodes: BTreeMap<String, ReportEntry>,
}

impl NodesReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, root: String, entry: ReportEntry) {
        self.nodes.insert(root, entry);
    }

    pub fn get(&self, root: &str) -> Option<&ReportEntry> {
        self.nodes.get(root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Entries of `other` replace entries of `self` with the same root.
    pub fn merge(&mut self, other: NodesReport) {
        self.nodes.extend(other.nodes);
    }

    /// Finds the entry for a project root given either as the report key
    /// itself or relative to the workspace root.
    pub fn find_project(&self, project_root: &str, workspace_root: &Path) -> Option<&ReportEntry> {
        if let Some(entry) = self.get(project_root) {
            return Some(entry);
        }

        let absolute = if project_root.is_empty() || project_root == "." {
            workspace_root.to_path_buf()
        } else {
            workspace_root.join(project_root)
        };
        self.get(&path_key(&absolute))
    }

    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, NodesError> {
        let content = fs.read_to_string(path).map_err(|source| NodesError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| NodesError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), NodesError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| NodesError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(dir) = path.parent() {
            fs.create_dir_all(dir).map_err(|source| NodesError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs.write(path, &json).map_err(|source| NodesError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), projects = self.len(), "Wrote nodes report");
        Ok(())
    }
}
