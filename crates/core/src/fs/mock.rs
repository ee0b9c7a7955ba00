use super::{DirEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
}

/// In-memory file system. Relative paths resolve against `root`.
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    root: PathBuf,
    read_only: RwLock<Vec<PathBuf>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            root,
            read_only: RwLock::new(Vec::new()),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        Self::ensure_parents(&mut files, &path);
    }

    /// Makes every write under `path` fail.
    pub fn deny_writes(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.read_only.write().unwrap().push(path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files.read().unwrap().contains_key(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.file_type == FileType::File)
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(self.read_to_string(path)?.into_bytes())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();

        if !files.contains_key(&path) {
            return Err(anyhow!("Directory not found: {:?}", path));
        }

        let mut entries = Vec::new();
        for (file_path, entry) in files.iter() {
            if file_path.parent() == Some(path.as_path()) {
                let name = file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string();

                entries.push(DirEntry {
                    path: file_path.clone(),
                    name,
                    file_type: entry.file_type,
                });
            }
        }

        Ok(entries)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let normalized = self.normalize_path(path);
        if self
            .read_only
            .read()
            .unwrap()
            .iter()
            .any(|denied| normalized.starts_with(denied))
        {
            return Err(anyhow!("Permission denied: {:?}", normalized));
        }

        let parent_exists = normalized
            .parent()
            .map(|p| self.is_dir(p))
            .unwrap_or(false);
        if !parent_exists {
            return Err(anyhow!("Parent directory missing: {:?}", normalized));
        }

        self.add_file(normalized, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("build.gradle", "plugins {}");

        assert!(fs.exists(Path::new("/mock/build.gradle")));
        assert!(fs.is_file(Path::new("/mock/build.gradle")));
    }

    #[test]
    fn test_add_dir() {
        let fs = MockFileSystem::new();
        fs.add_dir("lib");

        assert!(fs.exists(Path::new("/mock/lib")));
        assert!(fs.is_dir(Path::new("/mock/lib")));
    }

    #[test]
    fn test_read_dir() {
        let fs = MockFileSystem::new();
        fs.add_dir("lib");
        fs.add_file("build.gradle", "content");
        fs.add_file("lib/build.gradle", "nested");

        let entries = fs.read_dir(Path::new("/mock")).unwrap();
        let mut names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();
        names.sort();

        assert_eq!(names, vec!["build.gradle", "lib"]);
    }

    #[test]
    fn test_write_requires_parent() {
        let fs = MockFileSystem::new();

        assert!(fs.write(Path::new("/mock/.nx/cache/a.json"), "{}").is_err());

        fs.create_dir_all(Path::new("/mock/.nx/cache")).unwrap();
        fs.write(Path::new("/mock/.nx/cache/a.json"), "{}").unwrap();
        assert_eq!(
            fs.read_to_string(Path::new("/mock/.nx/cache/a.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_deny_writes() {
        let fs = MockFileSystem::new();
        fs.add_dir(".nx");
        fs.deny_writes(".nx");

        let err = fs.write(Path::new("/mock/.nx/x.json"), "{}").unwrap_err();
        assert!(err.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_with_root() {
        let fs = MockFileSystem::with_root(PathBuf::from("/repo"));
        fs.add_file("lib/build.gradle.kts", "plugins {}");

        assert!(fs.exists(Path::new("/repo/lib/build.gradle.kts")));
        assert_eq!(fs.read(Path::new("lib/build.gradle.kts")).unwrap(), b"plugins {}");
    }
}
