use crate::options::GradlePluginOptions;
use anyhow::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use nxgradle_core::fs::{FileSystem, FileType};
use nxgradle_core::paths::to_slash;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Directories whose contents never influence the project model.
const IGNORED_DIRS: &[&str] = &[".git", ".gradle", ".nx", "build", "node_modules"];

/// Invocation context folded into every fingerprint, so a plugin upgrade
/// invalidates entries produced by an older node format.
const CONTEXT: &str = concat!("@nx/gradle@", env!("CARGO_PKG_VERSION"));

/// Cache key for a project: its root, every file below it (path and content),
/// the normalized options and the invocation context. Files matched by a
/// `.gitignore` inside the workspace are left out, as are the directories in
/// `IGNORED_DIRS`.
pub fn project_fingerprint(
    fs: &dyn FileSystem,
    workspace_root: &Path,
    project_root: &str,
    options: &GradlePluginOptions,
) -> Result<String> {
    let absolute_root = if project_root.is_empty() || project_root == "." {
        workspace_root.to_path_buf()
    } else if Path::new(project_root).is_absolute() {
        PathBuf::from(project_root)
    } else {
        workspace_root.join(project_root)
    };

    let mut matchers = Vec::new();
    let ancestors: Vec<&Path> = absolute_root
        .ancestors()
        .skip(1)
        .take_while(|dir| dir.starts_with(workspace_root))
        .collect();
    for dir in ancestors.into_iter().rev() {
        if let Some(gitignore) = load_gitignore(fs, dir)? {
            matchers.push(gitignore);
        }
    }

    let mut files = Vec::new();
    collect_files(fs, &absolute_root, &mut matchers, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    hasher.update(CONTEXT.as_bytes());
    hasher.update([0u8]);
    hasher.update(project_root.as_bytes());
    hasher.update([0u8]);

    for file in &files {
        let relative = file.strip_prefix(workspace_root).unwrap_or(file);
        let content = fs.read(file)?;
        hasher.update(to_slash(relative).as_bytes());
        hasher.update([0u8]);
        hasher.update(Sha256::digest(&content));
    }

    hasher.update(options.canonical_json()?.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

fn collect_files(
    fs: &dyn FileSystem,
    dir: &Path,
    matchers: &mut Vec<Gitignore>,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let local = load_gitignore(fs, dir)?;
    let pushed = local.is_some();
    matchers.extend(local);

    let result = collect_entries(fs, dir, matchers, out);

    if pushed {
        matchers.pop();
    }
    result
}

fn collect_entries(
    fs: &dyn FileSystem,
    dir: &Path,
    matchers: &mut Vec<Gitignore>,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        match entry.file_type() {
            FileType::File if !is_ignored(matchers, &entry.path, false) => out.push(entry.path),
            FileType::Directory
                if !IGNORED_DIRS.contains(&entry.file_name())
                    && !is_ignored(matchers, &entry.path, true) =>
            {
                collect_files(fs, &entry.path, matchers, out)?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// The `.gitignore` of `dir`, if it has one.
fn load_gitignore(fs: &dyn FileSystem, dir: &Path) -> Result<Option<Gitignore>> {
    let file = dir.join(".gitignore");
    if !fs.is_file(&file) {
        return Ok(None);
    }

    let content = fs.read_to_string(&file)?;
    let mut builder = GitignoreBuilder::new(dir);
    for line in content.lines() {
        builder.add_line(Some(file.clone()), line)?;
    }
    Ok(Some(builder.build()?))
}

/// The deepest `.gitignore` with an opinion on `path` decides, so a nested
/// `!pattern` re-includes what a parent excluded.
fn is_ignored(matchers: &[Gitignore], path: &Path, is_dir: bool) -> bool {
    for matcher in matchers.iter().rev() {
        match matcher.matched(path, is_dir) {
            Match::Ignore(_) => return true,
            Match::Whitelist(_) => return false,
            Match::None => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxgradle_core::MockFileSystem;

    fn workspace() -> MockFileSystem {
        let fs = MockFileSystem::with_root(PathBuf::from("/ws"));
        fs.add_file("build.gradle", "plugins { id 'base' }");
        fs.add_file("settings.gradle", "include 'lib'");
        fs.add_file("lib/build.gradle", "plugins { id 'java' }");
        fs.add_file("lib/src/main/java/Lib.java", "class Lib {}");
        fs.add_file("lib/build/classes/Lib.class", "binary");
        fs.add_file(".nx/workspace-data/gradle-abc.hash", "{}");
        fs
    }

    fn options() -> GradlePluginOptions {
        GradlePluginOptions::default().normalize()
    }

    fn fingerprint(fs: &MockFileSystem, root: &str) -> String {
        project_fingerprint(fs, Path::new("/ws"), root, &options()).unwrap()
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let fs = workspace();

        assert_eq!(fingerprint(&fs, "lib"), fingerprint(&fs, "lib"));
        assert_ne!(fingerprint(&fs, "lib"), fingerprint(&fs, "."));
    }

    #[test]
    fn test_content_change_invalidates_owning_project() {
        let fs = workspace();
        let before_lib = fingerprint(&fs, "lib");
        let before_root = fingerprint(&fs, ".");

        fs.add_file("lib/src/main/java/Lib.java", "class Lib { int x; }");

        assert_ne!(fingerprint(&fs, "lib"), before_lib);
        assert_ne!(fingerprint(&fs, "."), before_root);
    }

    #[test]
    fn test_ignored_directories_do_not_affect_fingerprint() {
        let fs = workspace();
        let before = fingerprint(&fs, ".");

        fs.add_file("lib/build/classes/Other.class", "binary");
        fs.add_file(".nx/workspace-data/gradle-def.hash", "{}");
        fs.add_file(".gradle/8.5/fileHashes.bin", "bin");

        assert_eq!(fingerprint(&fs, "."), before);
    }

    #[test]
    fn test_options_are_part_of_the_key() {
        let fs = workspace();
        let mut renamed = options();
        renamed.set_target_name("test", "unitTest");

        let default_key = fingerprint(&fs, "lib");
        let renamed_key = project_fingerprint(&fs, Path::new("/ws"), "lib", &renamed).unwrap();

        assert_ne!(default_key, renamed_key);
    }

    #[test]
    fn test_gitignored_files_do_not_affect_fingerprint() {
        let fs = workspace();
        fs.add_file(".gitignore", "nodes.json\n*.log\n");
        let before_root = fingerprint(&fs, ".");
        let before_lib = fingerprint(&fs, "lib");

        fs.add_file("nodes.json", "{}");
        fs.add_file("lib/debug.log", "trace");

        assert_eq!(fingerprint(&fs, "."), before_root);
        assert_eq!(fingerprint(&fs, "lib"), before_lib);

        fs.add_file("lib/notes.md", "# notes");

        assert_ne!(fingerprint(&fs, "lib"), before_lib);
    }

    #[test]
    fn test_nested_gitignore_applies_below_its_directory() {
        let fs = workspace();
        fs.add_file("lib/.gitignore", "generated/\n");
        fs.add_file("generated/Root.java", "class Root {}");
        let before_lib = fingerprint(&fs, "lib");
        let before_root = fingerprint(&fs, ".");

        fs.add_file("lib/generated/Gen.java", "class Gen {}");
        assert_eq!(fingerprint(&fs, "lib"), before_lib);
        assert_eq!(fingerprint(&fs, "."), before_root);

        fs.add_file("generated/Root.java", "class Root { int x; }");
        assert_ne!(fingerprint(&fs, "."), before_root);
    }

    #[test]
    fn test_negated_pattern_in_nested_gitignore() {
        let fs = workspace();
        fs.add_file(".gitignore", "*.properties\n");
        fs.add_file("lib/.gitignore", "!gradle.properties\n");
        let before = fingerprint(&fs, "lib");

        fs.add_file("lib/local.properties", "sdk.dir=/opt");
        assert_eq!(fingerprint(&fs, "lib"), before);

        fs.add_file("lib/gradle.properties", "version=1.0");
        assert_ne!(fingerprint(&fs, "lib"), before);
    }

    #[test]
    fn test_absolute_project_root() {
        let fs = workspace();

        let absolute = fingerprint(&fs, "/ws/lib");
        assert_eq!(absolute, fingerprint(&fs, "/ws/lib"));

        fs.add_file("lib/src/main/java/Lib.java", "class Lib { int y; }");
        assert_ne!(fingerprint(&fs, "/ws/lib"), absolute);
    }

    #[test]
    fn test_missing_project_root_is_an_error() {
        let fs = workspace();

        assert!(project_fingerprint(&fs, Path::new("/ws"), "missing", &options()).is_err());
    }
}
