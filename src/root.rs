//! Content root resolution.
//!
//! The `root` directive names the directory (relative to the build directory)
//! whose contents are served. An empty `root` means the build directory
//! itself. Anything else must exist, be a directory, and stay inside the
//! build directory: a leading `/` is dropped and `..` may not climb out.

use crate::directives::Configuration;
use crate::output::{EventSink, FinalizeEvent};
use crate::paths;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RootError {
    #[error("the application Staticfile specifies a root directory {0} that does not exist")]
    NotFound(PathBuf),
    #[error("the application Staticfile specifies a root directory {0} that is a plain file")]
    PlainFile(PathBuf),
    #[error(
        "the application Staticfile specifies a root directory {0} that is outside the build directory"
    )]
    OutsideBuildDir(PathBuf),
    #[error("the application Staticfile specifies a root directory {path} that cannot be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `root` as a path relative to the build directory, with any leading `/`
/// or drive prefix removed.
fn relative_root(root_dir: &str) -> PathBuf {
    Path::new(root_dir)
        .components()
        .filter(|c| {
            matches!(
                c,
                Component::Normal(_) | Component::CurDir | Component::ParentDir
            )
        })
        .collect()
}

/// Resolve and validate the content root.
///
/// Reports the root folder before validating, so the line is present even
/// when resolution fails.
pub fn resolve_root(
    build_dir: &Path,
    config: &Configuration,
    sink: &mut dyn EventSink,
) -> Result<PathBuf, RootError> {
    let relative = relative_root(&config.root_dir);
    let root = if relative.as_os_str().is_empty() {
        build_dir.to_path_buf()
    } else {
        build_dir.join(&relative)
    };
    sink.emit(FinalizeEvent::RootFolder(root.clone()));

    if config.root_dir.is_empty() {
        return Ok(root);
    }

    if matches!(
        paths::clean(&relative).components().next(),
        Some(Component::ParentDir)
    ) {
        return Err(RootError::OutsideBuildDir(root));
    }

    match root.metadata() {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(RootError::NotFound(root)),
        Err(source) => Err(RootError::Io { path: root, source }),
        Ok(meta) if !meta.is_dir() => Err(RootError::PlainFile(root)),
        Ok(_) => Ok(root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::format_events;
    use std::fs;
    use tempfile::TempDir;

    fn resolve(tmp: &TempDir, root_dir: &str) -> (Result<PathBuf, RootError>, String) {
        let config = Configuration {
            root_dir: root_dir.to_string(),
            ..Default::default()
        };
        let mut events = Vec::new();
        let result = resolve_root(tmp.path(), &config, &mut events);
        (result, format_events(&events).join("\n"))
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let (result, log) = resolve(&tmp, "not_exist");

        assert!(log.contains("-----> Root folder"));
        assert!(log.contains("not_exist"));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("the application Staticfile specifies a root directory"));
        assert!(message.contains("that does not exist"));
    }

    #[test]
    fn plain_file_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("actually_a_file"), "xxx").unwrap();
        let (result, log) = resolve(&tmp, "actually_a_file");

        assert!(log.contains("-----> Root folder"));
        assert!(log.contains("actually_a_file"));
        let err = result.unwrap_err();
        assert!(matches!(err, RootError::PlainFile(_)));
        let message = err.to_string();
        assert!(message.contains("the application Staticfile specifies a root directory"));
        assert!(message.contains("that is a plain file"));
    }

    #[test]
    fn existing_directory_resolves_to_joined_path() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("a_directory")).unwrap();
        let (result, log) = resolve(&tmp, "a_directory");

        assert!(log.contains("-----> Root folder"));
        assert!(log.contains("a_directory"));
        assert_eq!(result.unwrap(), tmp.path().join("a_directory"));
    }

    #[test]
    fn nested_directory_resolves() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("site/dist")).unwrap();
        let (result, _) = resolve(&tmp, "site/dist");
        assert_eq!(result.unwrap(), tmp.path().join("site").join("dist"));
    }

    #[test]
    fn empty_root_is_the_build_dir() {
        let tmp = TempDir::new().unwrap();
        let (result, log) = resolve(&tmp, "");

        assert!(log.contains("-----> Root folder"));
        assert!(log.contains(&tmp.path().display().to_string()));
        assert_eq!(result.unwrap(), tmp.path());
    }

    // =========================================================================
    // Staying inside the build directory
    // =========================================================================

    #[test]
    fn absolute_root_is_joined_onto_build_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("dist")).unwrap();
        let (result, _) = resolve(&tmp, "/dist");
        assert_eq!(result.unwrap(), tmp.path().join("dist"));
    }

    #[test]
    fn absolute_path_of_another_dir_stays_under_build_dir() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let (result, log) = resolve(&tmp, &elsewhere.path().display().to_string());

        assert!(log.contains(&tmp.path().display().to_string()));
        let err = result.unwrap_err();
        assert!(matches!(&err, RootError::NotFound(p) if p.starts_with(tmp.path())));
    }

    #[test]
    fn slash_root_is_the_build_dir() {
        let tmp = TempDir::new().unwrap();
        let (result, _) = resolve(&tmp, "/");
        assert_eq!(result.unwrap(), tmp.path());
    }

    #[test]
    fn parent_dir_root_is_rejected() {
        let tmp = TempDir::new().unwrap();
        for root in ["..", "../x", "a/../../x", "/../x"] {
            let (result, log) = resolve(&tmp, root);
            let err = result.unwrap_err();
            assert!(matches!(err, RootError::OutsideBuildDir(_)), "root {root:?}");
            assert!(err.to_string().contains("outside the build directory"));
            assert!(log.contains("-----> Root folder"));
        }
    }

    #[test]
    fn inner_parent_segments_that_stay_inside_are_allowed() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("site")).unwrap();
        fs::create_dir(tmp.path().join("dist")).unwrap();
        let (result, _) = resolve(&tmp, "site/../dist");
        assert!(result.unwrap().ends_with("site/../dist"));
    }

    // =========================================================================
    // Unreadable roots
    // =========================================================================

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_not_reported_as_missing() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("loop", tmp.path().join("loop")).unwrap();
        let (result, _) = resolve(&tmp, "loop");

        let err = result.unwrap_err();
        assert!(matches!(err, RootError::Io { .. }), "{err:?}");
        assert!(err.to_string().contains("cannot be read"));
    }

    #[test]
    fn path_through_a_file_is_not_reported_as_missing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("plain.txt"), "xxx").unwrap();
        let (result, _) = resolve(&tmp, "plain.txt/inner");
        assert!(matches!(result.unwrap_err(), RootError::Io { .. }));
    }
}
