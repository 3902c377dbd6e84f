//! Pipeline driver.
//!
//! ```text
//! 1. Load       Staticfile       →  Configuration
//! 2. Root       root directive   →  content root (validated)
//! 3. Warnings   build dir        →  operator warnings
//! 4. Partition  content root     →  <build>/public
//! 5. Render     Configuration    →  <build>/nginx/conf
//! ```
//!
//! Partitioning runs before rendering: a custom `nginx.conf` or `mime.types`
//! shipped with the app is picked up from `public/`, where the partitioner
//! moved it. Warnings run before rendering, which creates `nginx/conf`.

use crate::directives::{self, Configuration, DirectiveError, DirectiveSource};
use crate::nginx::{self, RenderError};
use crate::output::EventSink;
use crate::partition::{self, PartitionError};
use crate::root::{self, RootError};
use crate::warnings;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("could not load Staticfile: {0}")]
    Directives(#[from] DirectiveError),
    #[error(transparent)]
    Root(#[from] RootError),
    #[error("could not move files into public: {0}")]
    Partition(#[from] PartitionError),
    #[error("could not write nginx config: {0}")]
    Render(#[from] RenderError),
}

/// Run the full pipeline against `build_dir`.
///
/// Returns the configuration the nginx config was rendered from.
pub fn finalize(
    build_dir: &Path,
    source: &dyn DirectiveSource,
    sink: &mut dyn EventSink,
) -> Result<Configuration, FinalizeError> {
    let config = directives::load(build_dir, source, sink)?;
    let content_root = root::resolve_root(build_dir, &config, sink)?;
    warnings::check_warnings(build_dir, &config, sink);

    partition::partition(build_dir, &content_root, &config)?;
    tracing::debug!(root = %content_root.display(), "content partitioned");

    nginx::render(build_dir, &config, sink)?;
    Ok(config)
}

/// Load, resolve and warn without touching the filesystem.
pub fn check(
    build_dir: &Path,
    source: &dyn DirectiveSource,
    sink: &mut dyn EventSink,
) -> Result<Configuration, FinalizeError> {
    let config = directives::load(build_dir, source, sink)?;
    root::resolve_root(build_dir, &config, sink)?;
    warnings::check_warnings(build_dir, &config, sink);
    Ok(config)
}
