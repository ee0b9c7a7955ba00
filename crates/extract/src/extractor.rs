use crate::fingerprint::project_fingerprint;
use crate::options::GradlePluginOptions;
use crate::store::{CacheStore, TargetsCache};
use nxgradle_core::output::{CreateNodesResult, ProjectNode};
use nxgradle_core::paths::to_slash_rooted;
use nxgradle_core::{FileSystem, NodesError};
use nxgradle_introspect::NodesReport;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns build configuration files into project nodes, backed by an
/// introspection report and a fingerprint-keyed targets cache.
pub struct Extractor<'a> {
    fs: &'a dyn FileSystem,
    report: &'a NodesReport,
    workspace_root: PathBuf,
}

impl<'a> Extractor<'a> {
    pub fn new(fs: &'a dyn FileSystem, report: &'a NodesReport, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            report,
            workspace_root: workspace_root.into(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Creates nodes for every file, in input order. The cache is written back
    /// even when a file fails; the first failure is returned afterwards.
    pub fn create_nodes(
        &self,
        files: &[String],
        options: GradlePluginOptions,
        store: &dyn CacheStore,
    ) -> Result<Vec<(String, CreateNodesResult)>, NodesError> {
        let start = Instant::now();
        let options = options.normalize();
        let cache = TargetsCache::load(store)?;
        let cached_before = cache.len();

        info!(
            files = files.len(),
            workspace_root = %self.workspace_root.display(),
            "Creating nodes"
        );

        let results: Vec<Result<(String, CreateNodesResult), NodesError>> = files
            .par_iter()
            .map(|file| {
                self.create_nodes_for_file(file, &options, &cache)
                    .map(|result| (file.clone(), result))
            })
            .collect();

        let persisted = cache.persist(store);

        let mut nodes = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(entry) => nodes.push(entry),
                Err(e) => {
                    warn!(error = %e, "Failed to create nodes");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        persisted?;

        info!(
            files = files.len(),
            projects = nodes.iter().filter(|(_, r)| !r.is_empty()).count(),
            new_cache_entries = cache.len() - cached_before,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Created nodes"
        );

        Ok(nodes)
    }

    /// Node creation for one build file, given workspace-relative or absolute.
    /// `options` are expected to be normalized.
    pub fn create_nodes_for_file(
        &self,
        file: &str,
        options: &GradlePluginOptions,
        cache: &TargetsCache,
    ) -> Result<CreateNodesResult, NodesError> {
        let project_root = project_root_of(file);

        let fingerprint = project_fingerprint(self.fs, &self.workspace_root, &project_root, options)
            .map_err(|source| NodesError::Fingerprint {
                root: project_root.clone(),
                source,
            })?;

        let node = cache.get_or_insert_with(&fingerprint, || {
            let found = self
                .report
                .find_project(&project_root, &self.workspace_root)
                .cloned()
                .map(ProjectNode::from);
            debug!(
                file,
                root = %project_root,
                found = found.is_some(),
                "Targets cache miss"
            );
            found
        });

        let Some(node) = node else {
            debug!(file, root = %project_root, "No project in report");
            return Ok(CreateNodesResult::empty());
        };

        let mut node = apply_target_names(node, options);
        node.root = Some(project_root.clone());
        Ok(CreateNodesResult::single(project_root, node))
    }
}

/// Directory containing `file`, `.` for files at the workspace root. An
/// absolute file keeps an absolute root.
pub fn project_root_of(file: &str) -> String {
    match Path::new(file).parent().map(to_slash_rooted) {
        Some(root) if !root.is_empty() => root,
        _ => ".".to_string(),
    }
}

/// Moves each target whose task has a configured target name to that key.
/// When two targets land on the same key, the later one in key order wins.
pub fn apply_target_names(mut node: ProjectNode, options: &GradlePluginOptions) -> ProjectNode {
    let mut renamed = BTreeMap::new();
    for (name, target) in std::mem::take(&mut node.targets) {
        let key = options
            .target_name_for(&name)
            .map(str::to_string)
            .unwrap_or(name);
        renamed.insert(key, target);
    }
    node.targets = renamed;
    node
}
