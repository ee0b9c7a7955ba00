//! Realized Gradle project tree
//!
//! The introspector only sees a project tree through [`ProjectTree`] and
//! [`BuildProject`]. [`GradleBuildModel`] implements both over the JSON
//! document the Gradle side dumps after configuring the build.

use anyhow::{anyhow, Result};
use nxgradle_core::fs::FileSystem;
use nxgradle_core::NodesError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference to a task in any project of the build, by project name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub project: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradleTask {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    #[serde(default)]
    pub depends_on: Vec<TaskRef>,
}

impl GradleTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            description: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
        }
    }
}

/// One project of a realized build. Accessors that realize Gradle state can
/// fail; a failure skips only this project.
pub trait BuildProject: Send + Sync {
    fn name(&self) -> &str;

    fn project_dir(&self) -> &Path;

    fn build_file(&self) -> &Path;

    /// Fully-qualified path of the project in the build tree, e.g. `:libs:core`.
    fn build_tree_path(&self) -> &str;

    fn child_project_dirs(&self) -> Result<Vec<PathBuf>>;

    /// Root directories of the builds included by the build this project belongs to.
    fn included_build_dirs(&self) -> Result<Vec<PathBuf>>;

    fn tasks(&self) -> Result<Vec<GradleTask>>;
}

pub trait ProjectTree: Send + Sync {
    fn root_project(&self) -> Option<Box<dyn BuildProject + '_>>;

    /// Every project of the tree, including the projects of included builds.
    fn all_projects(&self) -> Vec<Box<dyn BuildProject + '_>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub build_tree_path: Option<String>,
    pub project_dir: PathBuf,
    pub build_file: PathBuf,
    #[serde(default)]
    pub child_projects: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<GradleTask>,
    /// Set when the Gradle side could not realize the project's tasks.
    #[serde(default)]
    pub tasks_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradleBuildModel {
    #[serde(default = "default_root_path")]
    pub root_project: String,
    #[serde(default)]
    pub projects: Vec<ProjectModel>,
    #[serde(default)]
    pub included_builds: Vec<GradleBuildModel>,
}

fn default_root_path() -> String {
    ":".to_string()
}

impl GradleBuildModel {
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

    fn project(&self, path: &str) -> Option<&ProjectModel> {
        self.projects.iter().find(|p| p.path == path)
    }

    fn root(&self) -> Option<&ProjectModel> {
        self.project(&self.root_project)
    }

    fn collect_projects<'a>(&'a self, out: &mut Vec<Box<dyn BuildProject + 'a>>) {
        for project in &self.projects {
            out.push(Box::new(ProjectHandle {
                build: self,
                project,
            }));
        }
        for included in &self.included_builds {
            included.collect_projects(out);
        }
    }
}

impl ProjectTree for GradleBuildModel {
    fn root_project(&self) -> Option<Box<dyn BuildProject + '_>> {
        self.root().map(|project| {
            Box::new(ProjectHandle {
                build: self,
                project,
            }) as Box<dyn BuildProject + '_>
        })
    }

    fn all_projects(&self) -> Vec<Box<dyn BuildProject + '_>> {
        let mut projects = Vec::new();
        self.collect_projects(&mut projects);
        projects
    }
}

/// A project seen together with the build that owns it.
struct ProjectHandle<'a> {
    build: &'a GradleBuildModel,
    project: &'a ProjectModel,
}

impl BuildProject for ProjectHandle<'_> {
    fn name(&self) -> &str {
        &self.project.name
    }

    fn project_dir(&self) -> &Path {
        &self.project.project_dir
    }

    fn build_file(&self) -> &Path {
        &self.project.build_file
    }

    fn build_tree_path(&self) -> &str {
        self.project
            .build_tree_path
            .as_deref()
            .unwrap_or(&self.project.path)
    }

    fn child_project_dirs(&self) -> Result<Vec<PathBuf>> {
        self.project
            .child_projects
            .iter()
            .map(|path| {
                self.build
                    .project(path)
                    .map(|child| child.project_dir.clone())
                    .ok_or_else(|| {
                        anyhow!(
                            "Unknown child project '{}' of '{}'",
                            path,
                            self.project.path
                        )
                    })
            })
            .collect()
    }

    fn included_build_dirs(&self) -> Result<Vec<PathBuf>> {
        self.build
            .included_builds
            .iter()
            .map(|included| {
                included
                    .root()
                    .map(|root| root.project_dir.clone())
                    .ok_or_else(|| {
                        anyhow!(
                            "Included build has no root project '{}'",
                            included.root_project
                        )
                    })
            })
            .collect()
    }

    fn tasks(&self) -> Result<Vec<GradleTask>> {
        match &self.project.tasks_error {
            Some(error) => Err(anyhow!(
                "Failed to realize tasks of '{}': {}",
                self.project.path,
                error
            )),
            None => Ok(self.project.tasks.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxgradle_core::MockFileSystem;

    const MODEL: &str = r#"{
        "rootProject": ":",
        "projects": [
            {
                "name": "R",
                "path": ":",
                "projectDir": "/ws/R",
                "buildFile": "/ws/R/build.gradle",
                "childProjects": [":lib"],
                "tasks": [{"name": "build", "group": "build"}]
            },
            {
                "name": "lib",
                "path": ":lib",
                "projectDir": "/ws/R/lib",
                "buildFile": "/ws/R/lib/build.gradle",
                "tasksError": "Could not resolve plugin"
            }
        ],
        "includedBuilds": [
            {
                "rootProject": ":",
                "projects": [
                    {
                        "name": "conventions",
                        "path": ":",
                        "buildTreePath": ":conventions",
                        "projectDir": "/ws/conventions",
                        "buildFile": "/ws/conventions/build.gradle.kts"
                    }
                ]
            }
        ]
    }"#;

    fn model() -> GradleBuildModel {
        serde_json::from_str(MODEL).unwrap()
    }

    #[test]
    fn test_root_project() {
        let model = model();
        let root = model.root_project().unwrap();

        assert_eq!(root.name(), "R");
        assert_eq!(root.build_tree_path(), ":");
        assert_eq!(root.child_project_dirs().unwrap(), vec![PathBuf::from("/ws/R/lib")]);
        assert_eq!(
            root.included_build_dirs().unwrap(),
            vec![PathBuf::from("/ws/conventions")]
        );
    }

    #[test]
    fn test_all_projects_walks_included_builds() {
        let model = model();
        let names: Vec<String> = model
            .all_projects()
            .iter()
            .map(|p| p.name().to_string())
            .collect();

        assert_eq!(names, vec!["R", "lib", "conventions"]);
    }

    #[test]
    fn test_included_build_uses_build_tree_path() {
        let model = model();
        let projects = model.all_projects();

        assert_eq!(projects[2].build_tree_path(), ":conventions");
        assert_eq!(projects[1].build_tree_path(), ":lib");
    }

    #[test]
    fn test_tasks_error_surfaces_as_failure() {
        let model = model();
        let projects = model.all_projects();

        let err = projects[1].tasks().unwrap_err();
        assert!(err.to_string().contains("Could not resolve plugin"));
        assert_eq!(projects[0].tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_child_is_an_error() {
        let mut model = model();
        model.projects[0].child_projects.push(":missing".to_string());

        let root = model.root_project().unwrap();
        assert!(root.child_project_dirs().is_err());
    }

    #[test]
    fn test_missing_root_project() {
        let mut model = model();
        model.root_project = ":nope".to_string();

        assert!(model.root_project().is_none());
    }

    #[test]
    fn test_load_reports_offending_path() {
        let fs = MockFileSystem::new();
        fs.add_file("model.json", "{ not json");

        let err = GradleBuildModel::load(&fs, Path::new("/mock/model.json")).unwrap_err();
        assert!(matches!(err, NodesError::Parse { .. }));
        assert!(err.to_string().contains("/mock/model.json"));

        let err = GradleBuildModel::load(&fs, Path::new("/mock/absent.json")).unwrap_err();
        assert!(matches!(err, NodesError::Read { .. }));
    }
}
