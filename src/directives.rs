//! Staticfile directive loading.
//!
//! The `Staticfile` at the top of the application directory is a flat YAML
//! mapping. It is decoded loosely into [`RawDirectives`] (every scalar kept as
//! text) and then normalized into the strict [`Configuration`] that every later
//! stage reads.
//!
//! ## Directives
//!
//! ```yaml
//! root: dist                          # content root, relative to the app dir
//! host_dot_files: true
//! location_include: includes/*.conf
//! directory: visible                  # any non-empty value enables autoindex
//! ssi: enabled
//! pushstate: enabled
//! http_strict_transport_security: true
//! http_strict_transport_security_include_subdomains: true
//! http_strict_transport_security_preload: true
//! enable_http2: true
//! force_https: true
//! status_codes:
//!   404: /404.html
//!   5xx: /oops.html                   # expanded to every registered 5xx code
//! ```
//!
//! ## Coercion Rules
//!
//! | Directive | Enabled when |
//! |---|---|
//! | `directory` | any non-empty value |
//! | `ssi`, `pushstate` | `"true"` or `"enabled"` |
//! | everything else boolean | exactly `"true"` |
//!
//! Note the asymmetry: `directory` is looser than every other switch, and
//! existing Staticfiles rely on values like `directory: visible`.
//!
//! Basic auth is not a directive: it is on when `Staticfile.auth` exists next
//! to the `Staticfile`, whatever the `Staticfile` itself contains or whether
//! it exists at all.

use crate::output::{Enabled, EventSink, FinalizeEvent};
use crate::status_codes;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directive file name, looked up directly inside the build directory.
pub const STATICFILE: &str = "Staticfile";
/// Basic-auth credentials file, next to the directive file.
pub const STATICFILE_AUTH: &str = "Staticfile.auth";

#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl DirectiveError {
    /// The directive file does not exist. This is the one recoverable case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectiveError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Directives as written, before coercion. Absent keys are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawDirectives {
    #[serde(rename = "root", deserialize_with = "scalar")]
    pub root_dir: String,
    #[serde(deserialize_with = "scalar")]
    pub host_dot_files: String,
    #[serde(deserialize_with = "scalar")]
    pub location_include: String,
    #[serde(rename = "directory", deserialize_with = "scalar")]
    pub directory_index: String,
    #[serde(deserialize_with = "scalar")]
    pub ssi: String,
    #[serde(rename = "pushstate", deserialize_with = "scalar")]
    pub push_state: String,
    #[serde(rename = "http_strict_transport_security", deserialize_with = "scalar")]
    pub hsts: String,
    #[serde(
        rename = "http_strict_transport_security_include_subdomains",
        deserialize_with = "scalar"
    )]
    pub hsts_include_sub_domains: String,
    #[serde(
        rename = "http_strict_transport_security_preload",
        deserialize_with = "scalar"
    )]
    pub hsts_preload: String,
    #[serde(deserialize_with = "scalar")]
    pub enable_http2: String,
    #[serde(deserialize_with = "scalar")]
    pub force_https: String,
    #[serde(deserialize_with = "scalar_map")]
    pub status_codes: BTreeMap<String, String>,
}

/// Text form of a YAML scalar; `~`/empty values become `""`.
fn scalar_text(value: Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(format!("expected a scalar value, found {other:?}")),
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    scalar_text(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

fn scalar_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(BTreeMap::new()),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .map(|(k, v)| -> Result<(String, String), String> {
                Ok((scalar_text(k)?, scalar_text(v)?))
            })
            .collect::<Result<_, _>>()
            .map_err(de::Error::custom),
        other => Err(de::Error::custom(format!(
            "expected a mapping of status codes to pages, found {other:?}"
        ))),
    }
}

/// Decode directive text. Empty and comment-only documents are all-default.
pub fn parse_directives(content: &str) -> Result<RawDirectives, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(RawDirectives::default());
    }
    let value: Value = serde_yaml::from_str(content)?;
    if value.is_null() {
        return Ok(RawDirectives::default());
    }
    serde_yaml::from_value(value)
}

/// Where raw directives come from.
///
/// The production source reads YAML from disk ([`YamlFile`]); tests swap in
/// a source that returns canned results.
pub trait DirectiveSource {
    fn load(&self, path: &Path) -> Result<RawDirectives, DirectiveError>;
}

/// Reads and decodes a YAML directive file.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFile;

impl DirectiveSource for YamlFile {
    fn load(&self, path: &Path) -> Result<RawDirectives, DirectiveError> {
        let content = fs::read_to_string(path).map_err(|source| DirectiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_directives(&content).map_err(|source| DirectiveError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Strict, read-only configuration for one finalize run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Configuration {
    /// Content root relative to the build directory; empty means the build
    /// directory itself.
    pub root_dir: String,
    pub host_dot_files: bool,
    /// Extra nginx fragment included in `location /`; empty means none.
    pub location_include: String,
    pub directory_index: bool,
    pub ssi: bool,
    pub push_state: bool,
    /// Parent HSTS switch. The two sub-flags only shape the header value and
    /// never turn it on by themselves.
    pub hsts: bool,
    pub hsts_include_sub_domains: bool,
    pub hsts_preload: bool,
    pub enable_http2: bool,
    pub force_https: bool,
    /// Status-code list (already expanded) → custom page path.
    pub status_codes: BTreeMap<String, String>,
    /// Whether `Staticfile.auth` was present on disk when loading.
    pub auth_file_found: bool,
    /// Whether the rendered config protects `location /` with basic auth.
    pub basic_auth: bool,
}

fn is_true(raw: &str) -> bool {
    raw == "true"
}

fn is_true_or_enabled(raw: &str) -> bool {
    raw == "true" || raw == "enabled"
}

impl Configuration {
    /// Apply the coercion rules, reporting each enabled directive in
    /// directive order.
    pub fn from_directives(raw: RawDirectives, sink: &mut dyn EventSink) -> Self {
        let mut config = Configuration {
            root_dir: raw.root_dir,
            ..Configuration::default()
        };
        let mut enable = |what: Enabled| sink.emit(FinalizeEvent::Enabled(what));

        if is_true(&raw.host_dot_files) {
            config.host_dot_files = true;
            enable(Enabled::HostDotFiles);
        }
        if !raw.location_include.is_empty() {
            enable(Enabled::LocationInclude(raw.location_include.clone()));
            config.location_include = raw.location_include;
        }
        if !raw.directory_index.is_empty() {
            config.directory_index = true;
            enable(Enabled::DirectoryIndex);
        }
        if is_true_or_enabled(&raw.ssi) {
            config.ssi = true;
            enable(Enabled::Ssi);
        }
        if is_true_or_enabled(&raw.push_state) {
            config.push_state = true;
            enable(Enabled::PushState);
        }
        if is_true(&raw.hsts) {
            config.hsts = true;
            enable(Enabled::Hsts);
        }
        if is_true(&raw.hsts_include_sub_domains) {
            config.hsts_include_sub_domains = true;
            enable(Enabled::HstsIncludeSubDomains);
        }
        if is_true(&raw.hsts_preload) {
            config.hsts_preload = true;
            enable(Enabled::HstsPreload);
        }
        if is_true(&raw.enable_http2) {
            config.enable_http2 = true;
            enable(Enabled::Http2);
        }
        if is_true(&raw.force_https) {
            config.force_https = true;
            enable(Enabled::ForceHttps);
        }
        if !raw.status_codes.is_empty() {
            config.status_codes = status_codes::expand(raw.status_codes);
            enable(Enabled::StatusCodes);
        }

        config
    }
}

/// Load the configuration for `build_dir`.
///
/// A missing `Staticfile` yields defaults; any other load failure is fatal.
/// Basic auth is switched on by the existence of `Staticfile.auth` alone.
pub fn load(
    build_dir: &Path,
    source: &dyn DirectiveSource,
    sink: &mut dyn EventSink,
) -> Result<Configuration, DirectiveError> {
    let staticfile = build_dir.join(STATICFILE);
    let raw = match source.load(&staticfile) {
        Ok(raw) => raw,
        Err(err) if err.is_not_found() => {
            tracing::debug!(path = %staticfile.display(), "no Staticfile, using defaults");
            RawDirectives::default()
        }
        Err(err) => return Err(err),
    };

    let mut config = Configuration::from_directives(raw, sink);

    if build_dir.join(STATICFILE_AUTH).exists() {
        config.auth_file_found = true;
        config.basic_auth = true;
        sink.emit(FinalizeEvent::Enabled(Enabled::BasicAuth));
    }

    Ok(config)
}
