use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Technology tag attached to every project and target.
pub const GRADLE_TECHNOLOGY: &str = "Gradle";

pub fn gradle_technologies() -> BTreeSet<String> {
    BTreeSet::from([GRADLE_TECHNOLOGY.to_string()])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOptions {
    pub cwd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
}

/// A single invocable target derived from a Gradle task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    pub command: String,
    pub options: TargetOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<String>>,
    pub cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: TargetMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default)]
    pub target_groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
}

/// Project-level edge from a parent project to a child or an included build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub source: String,
    pub target: String,
    pub source_file: String,
}

/// The `project` half of a report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    pub name: String,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,
    #[serde(default)]
    pub metadata: ProjectMetadata,
}

/// One project of an introspection report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub project: ProjectConfiguration,
}

/// Canonical project node as handed to the orchestrator and stored in the
/// targets cache. `root` is only set on emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl From<ReportEntry> for ProjectNode {
    fn from(entry: ReportEntry) -> Self {
        let ReportEntry {
            dependencies,
            project,
        } = entry;

        Self {
            name: project.name,
            root: None,
            targets: project.targets,
            metadata: project.metadata,
            dependencies,
        }
    }
}

/// Result of node creation for one build configuration file; serializes to
/// `{}` when the file has no owning project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNodesResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<BTreeMap<String, ProjectNode>>,
}

impl CreateNodesResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(root: String, node: ProjectNode) -> Self {
        Self {
            projects: Some(BTreeMap::from([(root, node)])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.as_ref().map_or(true, |p| p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build_target() -> TargetSpec {
        TargetSpec {
            command: "./gradlew :build".to_string(),
            options: TargetOptions {
                cwd: "R".to_string(),
            },
            inputs: None,
            outputs: None,
            cache: true,
            depends_on: None,
            metadata: TargetMetadata {
                description: None,
                technologies: gradle_technologies(),
            },
        }
    }

    #[test]
    fn test_report_entry_wire_format() {
        let entry = ReportEntry {
            dependencies: vec![Dependency {
                source: "R".to_string(),
                target: "R/lib".to_string(),
                source_file: "R/build.gradle".to_string(),
            }],
            project: ProjectConfiguration {
                name: "R".to_string(),
                targets: BTreeMap::from([("build".to_string(), build_target())]),
                metadata: ProjectMetadata {
                    target_groups: BTreeMap::from([(
                        "build".to_string(),
                        vec!["build".to_string()],
                    )]),
                    technologies: gradle_technologies(),
                },
            },
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "dependencies": [{"source": "R", "target": "R/lib", "sourceFile": "R/build.gradle"}],
                "project": {
                    "name": "R",
                    "targets": {
                        "build": {
                            "command": "./gradlew :build",
                            "cache": true,
                            "options": {"cwd": "R"},
                            "metadata": {"technologies": ["Gradle"]}
                        }
                    },
                    "metadata": {"targetGroups": {"build": ["build"]}, "technologies": ["Gradle"]}
                }
            })
        );
    }

    #[test]
    fn test_target_spec_uses_camel_case_depends_on() {
        let mut target = build_target();
        target.depends_on = Some(vec!["R:assemble".to_string()]);
        target.inputs = Some(vec!["{projectRoot}/src".to_string()]);

        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value["dependsOn"], json!(["R:assemble"]));
        assert_eq!(value["inputs"], json!(["{projectRoot}/src"]));
        assert!(value.get("outputs").is_none());
    }

    #[test]
    fn test_empty_create_nodes_result_serializes_to_empty_object() {
        let result = CreateNodesResult::empty();

        assert!(result.is_empty());
        assert_eq!(serde_json::to_string(&result).unwrap(), "{}");
    }

    #[test]
    fn test_project_node_from_report_entry_has_no_root() {
        let entry = ReportEntry {
            dependencies: vec![],
            project: ProjectConfiguration {
                name: "lib".to_string(),
                targets: BTreeMap::from([("build".to_string(), build_target())]),
                metadata: ProjectMetadata::default(),
            },
        };

        let node = ProjectNode::from(entry);
        assert_eq!(node.name, "lib");
        assert!(node.root.is_none());
        assert!(node.targets.contains_key("build"));

        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("root").is_none());
    }
}
