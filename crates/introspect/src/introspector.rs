use crate::command::CommandPrefix;
use crate::model::{BuildProject, GradleTask, ProjectTree};
use crate::report::NodesReport;
use anyhow::Result;
use nxgradle_core::output::{
    gradle_technologies, Dependency, ProjectConfiguration, ProjectMetadata, ReportEntry,
    TargetMetadata, TargetOptions, TargetSpec,
};
use nxgradle_core::paths::{path_key, replace_root_in_path};
use nxgradle_core::{FileSystem, NodesError, NxGradleConfig, Platform};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("Project tree has no root project")]
    MissingRootProject,

    #[error(transparent)]
    Nodes(#[from] NodesError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedProject {
    pub project_dir: String,
    pub reason: String,
}

/// Outcome of introspecting one project. Only `Node` outcomes reach the report.
#[derive(Debug)]
pub enum ProjectOutcome {
    Node { root: String, entry: ReportEntry },
    Skipped(SkippedProject),
}

#[derive(Debug)]
pub struct Introspection {
    pub root_project_name: String,
    pub report: NodesReport,
    pub skipped: Vec<SkippedProject>,
}

pub struct Introspector {
    workspace_root: PathBuf,
    platform: Platform,
}

impl Introspector {
    pub fn new(workspace_root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            platform,
        }
    }

    pub fn from_config(config: &NxGradleConfig) -> Self {
        Self::new(config.workspace_root.clone(), config.platform)
    }

    pub fn introspect(&self, tree: &dyn ProjectTree) -> Result<Introspection, IntrospectError> {
        let start = Instant::now();
        let root = tree
            .root_project()
            .ok_or(IntrospectError::MissingRootProject)?;
        let root_project_name = root.name().to_string();
        let cwd = path_key(root.project_dir());

        let projects = tree.all_projects();
        info!(
            root = %root_project_name,
            projects = projects.len(),
            "Introspecting project tree"
        );

        let outcomes: Vec<ProjectOutcome> = projects
            .par_iter()
            .map(|project| self.process_project(project.as_ref(), &cwd))
            .collect();

        let mut report = NodesReport::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                ProjectOutcome::Node { root, entry } => report.insert(root, entry),
                ProjectOutcome::Skipped(project) => skipped.push(project),
            }
        }

        info!(
            projects = report.len(),
            skipped = skipped.len(),
            duration_ms = start.elapsed().as_millis(),
            "Introspection complete"
        );

        Ok(Introspection {
            root_project_name,
            report,
            skipped,
        })
    }

    /// Introspects the tree and writes the report next to the other
    /// workspace caches, returning the report location.
    pub fn introspect_to_file(
        &self,
        tree: &dyn ProjectTree,
        fs: &dyn FileSystem,
        config: &NxGradleConfig,
    ) -> Result<(Introspection, PathBuf), IntrospectError> {
        let introspection = self.introspect(tree)?;
        let path = config.report_path(&introspection.root_project_name);
        introspection.report.write(fs, &path)?;
        info!(path = %path.display(), "Report written");
        Ok((introspection, path))
    }

    pub fn process_project(&self, project: &dyn BuildProject, cwd: &str) -> ProjectOutcome {
        let project_dir = path_key(project.project_dir());
        match self.project_entry(project, cwd) {
            Ok(entry) => {
                debug!(
                    project = %project.name(),
                    targets = entry.project.targets.len(),
                    "Introspected project"
                );
                ProjectOutcome::Node {
                    root: project_dir,
                    entry,
                }
            }
            Err(e) => {
                warn!(project = %project_dir, error = %e, "Skipping project");
                ProjectOutcome::Skipped(SkippedProject {
                    project_dir,
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    fn project_entry(&self, project: &dyn BuildProject, cwd: &str) -> Result<ReportEntry> {
        let source = path_key(project.project_dir());
        let source_file = path_key(project.build_file());

        let dependencies = project
            .child_project_dirs()?
            .into_iter()
            .chain(project.included_build_dirs()?)
            .map(|target| Dependency {
                source: source.clone(),
                target: path_key(&target),
                source_file: source_file.clone(),
            })
            .collect();

        let tasks = project.tasks()?;
        let prefix = CommandPrefix::new(self.platform, project.build_tree_path());
        let (targets, target_groups) =
            self.process_targets(project.project_dir(), &tasks, &prefix, cwd);

        Ok(ReportEntry {
            dependencies,
            project: ProjectConfiguration {
                name: project.name().to_string(),
                targets,
                metadata: ProjectMetadata {
                    target_groups,
                    technologies: gradle_technologies(),
                },
            },
        })
    }

    fn process_targets(
        &self,
        project_root: &Path,
        tasks: &[GradleTask],
        prefix: &CommandPrefix,
        cwd: &str,
    ) -> (BTreeMap<String, TargetSpec>, BTreeMap<String, Vec<String>>) {
        let mut targets = BTreeMap::new();
        let mut target_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for task in tasks {
            if let Some(group) = task.group.as_deref().filter(|g| !g.trim().is_empty()) {
                target_groups
                    .entry(group.to_string())
                    .or_default()
                    .push(task.name.clone());
            }

            let depends_on: Vec<String> = task
                .depends_on
                .iter()
                .map(|dep| format!("{}:{}", dep.project, dep.name))
                .collect();

            let target = TargetSpec {
                command: prefix.task_command(&task.name),
                options: TargetOptions {
                    cwd: cwd.to_string(),
                },
                inputs: self.relocate(&task.inputs, project_root),
                outputs: self.relocate(&task.outputs, project_root),
                // Cacheability is left to the orchestrator.
                cache: true,
                depends_on: non_empty(depends_on),
                metadata: TargetMetadata {
                    description: task.description.clone(),
                    technologies: gradle_technologies(),
                },
            };

            targets.insert(task.name.clone(), target);
        }

        (targets, target_groups)
    }

    fn relocate(&self, paths: &[PathBuf], project_root: &Path) -> Option<Vec<String>> {
        non_empty(
            paths
                .iter()
                .filter_map(|p| replace_root_in_path(p, project_root, &self.workspace_root))
                .collect(),
        )
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
