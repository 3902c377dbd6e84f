//! Lexical path normalization.
//!
//! The `root` directive is compared before the directory exists (and the
//! warnings check must not touch the filesystem beyond `nginx/conf`), so
//! equivalence is decided on the path text alone: `.` segments vanish and
//! `name/..` pairs cancel.

use std::path::{Component, Path, PathBuf};

/// Normalize `path` without consulting the filesystem.
///
/// - `""`, `"."`, `"./fred/.."` → `"."`
/// - `"a/./b/../c"` → `"a/c"`
/// - `"../x"` keeps its leading `..`
/// - `"/.."` → `"/"`
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// True when `path` names the directory it is relative to.
pub fn is_current_dir(path: &Path) -> bool {
    clean(path) == Path::new(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_dot_are_current_dir() {
        assert!(is_current_dir(Path::new("")));
        assert!(is_current_dir(Path::new(".")));
        assert!(is_current_dir(Path::new("./")));
    }

    #[test]
    fn cancelled_segments_are_current_dir() {
        assert!(is_current_dir(Path::new("./fred/..")));
        assert!(is_current_dir(Path::new("a/b/../..")));
    }

    #[test]
    fn real_directories_are_not_current_dir() {
        assert!(!is_current_dir(Path::new("somedir")));
        assert!(!is_current_dir(Path::new("./somedir")));
        assert!(!is_current_dir(Path::new("..")));
    }

    #[test]
    fn clean_collapses_inner_segments() {
        assert_eq!(clean(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(clean(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(clean(Path::new("/tmp/build/..")), PathBuf::from("/tmp"));
        assert_eq!(clean(Path::new("/..")), PathBuf::from("/"));
    }
}
