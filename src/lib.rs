//! # Staticfile Finalizer
//!
//! Build-time finalizer for static sites served by nginx. It reads the app's
//! `Staticfile`, moves the servable content into `public/`, and writes an
//! nginx configuration tailored to the directives it found. It runs once per
//! deployment and leaves a self-contained runtime tree behind:
//!
//! ```text
//! <build>/
//! ├── Staticfile            # directives (stays)
//! ├── Staticfile.auth       # basic auth credentials (stays)
//! ├── public/               # served content
//! └── nginx/
//!     ├── conf/
//!     │   ├── nginx.conf    # rendered, with ERB tags for boot-time settings
//!     │   ├── mime.types
//!     │   └── .htpasswd     # only with Staticfile.auth
//!     └── logs/
//! ```
//!
//! # Architecture: Five-Step Pipeline
//!
//! ```text
//! 1. Load       Staticfile     →  Configuration     (YAML → typed record)
//! 2. Root       root directive →  content root      (validated directory)
//! 3. Warnings   build dir      →  operator warnings (never fatal)
//! 4. Partition  content root   →  public/           (renames, not copies)
//! 5. Render     Configuration  →  nginx/conf/       (typed template → text)
//! ```
//!
//! Each step reports what it enabled through an [`output::EventSink`], so
//! tests assert on event values and the binary prints them as banner lines.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`directives`] | Step 1: `Staticfile` decoding and coercion into [`directives::Configuration`] |
//! | [`status_codes`] | `4xx`-style status code pattern expansion |
//! | [`root`] | Step 2: content root resolution |
//! | [`warnings`] | Step 3: misconfiguration warnings |
//! | [`partition`] | Step 4: moves content into `public/`, leaving metadata behind |
//! | [`nginx`] | Step 5: nginx config, `mime.types` and `.htpasswd` |
//! | [`template`] | Typed nginx template nodes with boot-time conditionals |
//! | [`paths`] | Lexical path normalization |
//! | [`output`] | Operator-facing events and their display lines |
//! | [`finalize`] | Runs the pipeline in order |
//!
//! # Design Decisions
//!
//! ## Boot-Time Settings Stay Conditional
//!
//! HTTP/2 and the HTTPS redirect can be switched on either by a directive or
//! by an environment variable at container boot. A directive renders the
//! setting unconditionally; otherwise the config carries an
//! `<% if ENV["..."] %>` block that the boot step expands. The
//! [`template::Node::WhenEnv`] node keeps this choice structural instead of
//! string splicing.
//!
//! ## Lenient Directive Values
//!
//! Staticfiles in the wild use `ssi: true`, `ssi: "true"` and
//! `ssi: enabled` interchangeably. Every scalar is kept as text and coerced
//! per directive, and unknown keys are ignored.

pub mod directives;
pub mod finalize;
pub mod nginx;
pub mod output;
pub mod partition;
pub mod paths;
pub mod root;
pub mod status_codes;
pub mod template;
pub mod warnings;

#[cfg(test)]
pub(crate) mod test_helpers;
