//! Relocatable path tokens
//!
//! Absolute paths never reach a cacheable artifact. A path under the owning
//! project becomes `{projectRoot}/...`, a path elsewhere under the workspace
//! becomes `{workspaceRoot}/...`, and anything else is dropped.

use std::path::{Component, Path, PathBuf};

pub const PROJECT_ROOT_TOKEN: &str = "{projectRoot}";
pub const WORKSPACE_ROOT_TOKEN: &str = "{workspaceRoot}";

/// Rewrites `path` relative to the project root, falling back to the
/// workspace root. All three paths are normalized lexically first, and
/// containment is checked per component.
pub fn replace_root_in_path(path: &Path, project_root: &Path, workspace_root: &Path) -> Option<String> {
    let path = normalize_lexically(path);

    if let Some(rest) = relative_to(&path, &normalize_lexically(project_root)) {
        return Some(with_token(PROJECT_ROOT_TOKEN, rest));
    }
    if let Some(rest) = relative_to(&path, &normalize_lexically(workspace_root)) {
        return Some(with_token(WORKSPACE_ROOT_TOKEN, rest));
    }
    None
}

/// Remainder of `path` below `root`, only when it consists of plain names.
fn relative_to<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    let rest = path.strip_prefix(root).ok()?;
    rest.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(rest)
}

/// Folds `.` and `..` without touching the file system. A `..` directly
/// below the root stays at the root; leading `..` of a relative path is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn with_token(token: &str, rest: &Path) -> String {
    let rest = to_slash(rest);
    if rest.is_empty() {
        token.to_string()
    } else {
        format!("{}/{}", token, rest)
    }
}

/// Joins the normal components of `path` with `/` regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Like [`to_slash`], but keeps the root of an absolute path.
pub fn to_slash_rooted(path: &Path) -> String {
    let mut rendered = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => rendered.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => rendered.push('/'),
            _ => {}
        }
    }
    rendered.push_str(&to_slash(path));
    rendered
}

/// Renders a path the way it is keyed in reports and dependency edges.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
