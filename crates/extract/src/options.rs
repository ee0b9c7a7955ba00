//! Plugin options
//!
//! `testTargetName`, `classesTargetName` and `buildTargetName` always carry a
//! value after normalization. Any other `<task>TargetName` key renames the
//! target of that task when present and non-empty.

use nxgradle_core::{FileSystem, NodesError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

pub const PLUGIN_NAME: &str = "@nx/gradle";
const TARGET_NAME_SUFFIX: &str = "TargetName";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradlePluginOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes_target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_target_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GradlePluginOptions {
    pub fn normalize(mut self) -> Self {
        self.test_target_name.get_or_insert_with(|| "test".to_string());
        self.classes_target_name
            .get_or_insert_with(|| "classes".to_string());
        self.build_target_name.get_or_insert_with(|| "build".to_string());
        self
    }

    /// Configured target name for a task, if any.
    pub fn target_name_for(&self, task_name: &str) -> Option<&str> {
        let name = match task_name {
            "test" => self.test_target_name.as_deref(),
            "classes" => self.classes_target_name.as_deref(),
            "build" => self.build_target_name.as_deref(),
            _ => self
                .extra
                .get(&format!("{}{}", task_name, TARGET_NAME_SUFFIX))
                .and_then(Value::as_str),
        };
        name.filter(|n| !n.is_empty())
    }

    pub fn set_target_name(&mut self, task_name: &str, target_name: impl Into<String>) {
        let target_name = target_name.into();
        match task_name {
            "test" => self.test_target_name = Some(target_name),
            "classes" => self.classes_target_name = Some(target_name),
            "build" => self.build_target_name = Some(target_name),
            _ => {
                self.extra.insert(
                    format!("{}{}", task_name, TARGET_NAME_SUFFIX),
                    Value::String(target_name),
                );
            }
        }
    }

    /// Stable hash of the options; partitions the targets cache.
    pub fn hash(&self) -> Result<String, NodesError> {
        Ok(hex::encode(Sha256::digest(self.canonical_json()?.as_bytes())))
    }

    /// Field order is fixed and `extra` is a BTreeMap, so equal options
    /// serialize identically.
    pub(crate) fn canonical_json(&self) -> Result<String, NodesError> {
        serde_json::to_string(self).map_err(|source| NodesError::Options { source })
    }

    /// Reads the options of the Gradle plugin entry in `nx.json`. A missing
    /// `nx.json` or plugin entry yields default options.
    pub fn from_nx_json(fs: &dyn FileSystem, workspace_root: &Path) -> Result<Self, NodesError> {
        let path = workspace_root.join("nx.json");
        if !fs.exists(&path) {
            return Ok(Self::default());
        }

        let content = fs.read_to_string(&path).map_err(|source| NodesError::Read {
            path: path.clone(),
            source,
        })?;
        let nx_json: Value = serde_json::from_str(&content).map_err(|source| NodesError::Parse {
            path: path.clone(),
            source,
        })?;

        let Some(options) = nx_json["plugins"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|plugin| {
                plugin.as_str() == Some(PLUGIN_NAME)
                    || plugin["plugin"].as_str() == Some(PLUGIN_NAME)
            })
            .and_then(|plugin| plugin.get("options"))
        else {
            return Ok(Self::default());
        };

        serde_json::from_value(options.clone()).map_err(|source| NodesError::Parse { path, source })
    }
}
