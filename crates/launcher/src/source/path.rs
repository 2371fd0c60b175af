//! Path normalization for import resolution.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path: removes `.` components and folds `..` into
/// the preceding component where one exists. The filesystem is not touched.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Resolves an import path written inside `importing_file`.
///
/// Relative paths are taken relative to the importing file's directory.
pub fn resolve_import_path(importing_file: &Path, raw: &Path) -> PathBuf {
    if raw.is_absolute() {
        return normalize_path(raw);
    }
    let base = importing_file.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_current_and_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c.xml")),
            PathBuf::from("/a/c.xml")
        );
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn resolves_relative_to_importing_file() {
        assert_eq!(
            resolve_import_path(Path::new("/links/root.xml"), Path::new("sub/more.xml")),
            PathBuf::from("/links/sub/more.xml")
        );
        assert_eq!(
            resolve_import_path(Path::new("/links/sub/more.xml"), Path::new("../root.xml")),
            PathBuf::from("/links/root.xml")
        );
        assert_eq!(
            resolve_import_path(Path::new("/links/root.xml"), Path::new("/etc/other.xml")),
            PathBuf::from("/etc/other.xml")
        );
        assert_eq!(
            resolve_import_path(Path::new("root.xml"), Path::new("other.xml")),
            PathBuf::from("other.xml")
        );
    }
}
