use anyhow::{Context, Result};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use nxgradle_core::paths::to_slash;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::extractor::project_root_of;

pub const GRADLE_BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];
pub const GRADLE_WRAPPER_FILES: &[&str] = &["gradlew", "gradlew.bat"];

const EXCLUDED_DIRS: &[&str] = &[".nx", "build", ".gradle", "node_modules"];

/// Gradle-related files of a workspace, workspace-relative with `/`
/// separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradleConfigFiles {
    pub build_files: Vec<String>,
    pub gradlew_files: Vec<String>,
    pub project_roots: BTreeSet<String>,
}

impl GradleConfigFiles {
    /// Directories holding a wrapper, i.e. the roots of independent builds.
    pub fn gradle_roots(&self) -> BTreeSet<String> {
        self.gradlew_files
            .iter()
            .map(|f| project_root_of(f))
            .collect()
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn is_build_file(path: &str) -> bool {
    GRADLE_BUILD_FILES.contains(&file_name(path))
}

pub fn is_wrapper_file(path: &str) -> bool {
    GRADLE_WRAPPER_FILES.contains(&file_name(path))
}

pub fn split_config_files(files: &[String]) -> GradleConfigFiles {
    let mut split = GradleConfigFiles::default();
    for file in files {
        if is_build_file(file) {
            split.project_roots.insert(project_root_of(file));
            split.build_files.push(file.clone());
        } else if is_wrapper_file(file) {
            split.gradlew_files.push(file.clone());
        }
    }
    split
}

/// Finds build and wrapper files below `workspace_root`, honouring
/// `.gitignore`. Returned paths are sorted.
pub fn discover_config_files(workspace_root: &Path) -> Result<Vec<String>> {
    let mut override_builder = OverrideBuilder::new(workspace_root);
    for excluded in EXCLUDED_DIRS {
        override_builder
            .add(&format!("!{}/", excluded))
            .with_context(|| format!("Invalid exclude pattern for {}", excluded))?;
    }
    let overrides = override_builder
        .build()
        .context("Failed to build exclude patterns")?;

    let mut files = Vec::new();
    for result in WalkBuilder::new(workspace_root)
        .hidden(false)
        .git_ignore(true)
        .require_git(false)
        .overrides(overrides)
        .build()
    {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(workspace_root) else {
            continue;
        };
        let relative = to_slash(relative);
        if is_build_file(&relative) || is_wrapper_file(&relative) {
            debug!(file = %relative, "Found Gradle file");
            files.push(relative);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_split_config_files() {
        let files = vec![
            "gradlew".to_string(),
            "build.gradle".to_string(),
            "lib/build.gradle.kts".to_string(),
            "tools/gradlew.bat".to_string(),
            "settings.gradle".to_string(),
        ];

        let split = split_config_files(&files);

        assert_eq!(split.build_files, vec!["build.gradle", "lib/build.gradle.kts"]);
        assert_eq!(split.gradlew_files, vec!["gradlew", "tools/gradlew.bat"]);
        assert_eq!(
            split.project_roots,
            BTreeSet::from([".".to_string(), "lib".to_string()])
        );
        assert_eq!(
            split.gradle_roots(),
            BTreeSet::from([".".to_string(), "tools".to_string()])
        );
    }

    #[test]
    fn test_discover_config_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "gradlew");
        touch(root, "build.gradle");
        touch(root, "settings.gradle");
        touch(root, "app/build.gradle.kts");
        touch(root, "app/src/main/kotlin/App.kt");
        touch(root, "app/build/tmp/build.gradle");
        touch(root, ".nx/cache/build.gradle");
        touch(root, "node_modules/pkg/build.gradle");

        let files = discover_config_files(root).unwrap();

        assert_eq!(files, vec!["app/build.gradle.kts", "build.gradle", "gradlew"]);
    }

    #[test]
    fn test_discover_honours_gitignore() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "build.gradle");
        touch(root, "generated/build.gradle");
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();

        let files = discover_config_files(root).unwrap();

        assert_eq!(files, vec!["build.gradle"]);
    }
}
