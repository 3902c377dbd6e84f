//! Relocation of application content into `public/`.
//!
//! nginx serves `<build>/public`. Everything in the content root that is
//! application content moves there; build and deploy metadata stays where it
//! is.
//!
//! ## Classification
//!
//! Each top-level entry of the content root is classified by name alone
//! ([`classify`]), so the policy can be tested without a filesystem:
//!
//! | Entry | Placement |
//! |---|---|
//! | metadata ([`METADATA`]) | stays |
//! | other dot-entries | moves only with `host_dot_files` |
//! | everything else | moves |
//!
//! ## Relocation
//!
//! Moves are renames, never copies. Entries are first moved into a staging
//! directory created inside the build directory, which then replaces any
//! existing `public/` wholesale. A content root that already is `public/` is
//! left untouched. If a step fails, the staging directory is left in place
//! with whatever was already moved.

use crate::directives::{Configuration, STATICFILE, STATICFILE_AUTH};
use crate::nginx::{PUBLIC_DIR, RUNTIME_DIR};
use crate::paths;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Build and deploy metadata that never becomes served content.
pub const METADATA: &[&str] = &[
    STATICFILE,
    STATICFILE_AUTH,
    "manifest.yml",
    ".profile",
    "stackato.yml",
    ".profile.d",
    ".cloudfoundry",
    RUNTIME_DIR,
];

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not list content root: {0}")]
    Walk(#[from] walkdir::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PartitionError + '_ {
    move |source| PartitionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Left where it is.
    Skip,
    /// Moved into `public/`.
    Move,
}

/// Decide what happens to a top-level entry of the content root.
pub fn classify(name: &str, host_dot_files: bool) -> Placement {
    if METADATA.contains(&name) {
        return Placement::Skip;
    }
    if name.starts_with('.') && !host_dot_files {
        return Placement::Skip;
    }
    Placement::Move
}

/// Top-level entry names of `dir` that should move, in name order.
fn entries_to_move(dir: &Path, host_dot_files: bool) -> Result<Vec<OsString>, PartitionError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let name = entry.file_name();
        match classify(&name.to_string_lossy(), host_dot_files) {
            Placement::Move => names.push(name.to_os_string()),
            Placement::Skip => {
                tracing::trace!(entry = %name.to_string_lossy(), "left in place");
            }
        }
    }
    Ok(names)
}

/// Move application content from `content_root` into `<build>/public`.
pub fn partition(
    build_dir: &Path,
    content_root: &Path,
    config: &Configuration,
) -> Result<(), PartitionError> {
    let public_dir = build_dir.join(PUBLIC_DIR);
    if paths::clean(content_root) == paths::clean(&public_dir) {
        return Ok(());
    }

    let names = entries_to_move(content_root, config.host_dot_files)?;
    relocate(build_dir, content_root, &names)
}

/// Rename `names` from `content_root` into a staging directory, then swap it
/// in as `<build>/public`.
///
/// The staging directory is not cleaned up on failure: whatever was already
/// moved stays in `<build>/.public-*` for the operator to recover.
fn relocate(
    build_dir: &Path,
    content_root: &Path,
    names: &[OsString],
) -> Result<(), PartitionError> {
    let public_dir = build_dir.join(PUBLIC_DIR);
    let staging = tempfile::Builder::new()
        .prefix(".public-")
        .tempdir_in(build_dir)
        .map_err(io_err(build_dir))?
        .keep();

    let result = stage_and_swap(content_root, names, &staging, &public_dir);
    if result.is_err() {
        tracing::warn!(
            staging = %staging.display(),
            "partition interrupted, moved entries left in staging"
        );
    }
    result
}

fn stage_and_swap(
    content_root: &Path,
    names: &[OsString],
    staging: &Path,
    public_dir: &Path,
) -> Result<(), PartitionError> {
    for name in names {
        let from = content_root.join(name);
        fs::rename(&from, staging.join(name)).map_err(io_err(&from))?;
        tracing::debug!(entry = %name.to_string_lossy(), "moved to public");
    }

    match fs::symlink_metadata(public_dir) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(public_dir).map_err(io_err(public_dir))?
        }
        Ok(_) => fs::remove_file(public_dir).map_err(io_err(public_dir))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(public_dir)(err)),
    }
    fs::rename(staging, public_dir).map_err(io_err(public_dir))?;

    Ok(())
}
