//! nginx configuration rendering.
//!
//! Writes everything nginx needs under the runtime directory:
//!
//! ```text
//! <build>/nginx/
//! ├── conf/
//! │   ├── nginx.conf     # generated from the Configuration (or user override)
//! │   ├── mime.types     # public/mime.types if present, else the built-in table
//! │   └── .htpasswd      # copy of Staticfile.auth, only with basic auth
//! └── logs/
//! ```
//!
//! ## Generated vs. Overridden
//!
//! A `nginx.conf` in `public/` replaces the generated file wholesale (and is
//! removed from `public/` so it is not served). This bypasses every
//! Staticfile directive, so it is reported as deprecated. `.htpasswd` is
//! still written for a custom config to reference.
//!
//! ## Build-time vs. Boot-time Switches
//!
//! `enable_http2` and `force_https` in the Staticfile hard-wire the listener
//! and the HTTPS redirect. Left unset, both are deferred to the
//! `ENABLE_HTTP2` / `FORCE_HTTPS` environment variables at boot through
//! [`Node::WhenEnv`].
//!
//! The `X-Forwarded-*` maps are always emitted: the redirect target needs
//! `$best_host`/`$best_prefix` whether the redirect is fixed or deferred.

use crate::directives::{Configuration, STATICFILE_AUTH};
use crate::output::{EventSink, FinalizeEvent};
use crate::template::{self, Node, env_value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory nginx runs from (`nginx -p`), relative to the build directory.
pub const RUNTIME_DIR: &str = "nginx";
/// Served content directory, relative to the build directory.
pub const PUBLIC_DIR: &str = "public";
/// Credentials file name inside `nginx/conf`.
pub const HTPASSWD: &str = ".htpasswd";

const DEFAULT_MIME_TYPES: &str = include_str!("../static/mime.types");

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `<build>/nginx/conf`
pub fn conf_dir(build_dir: &Path) -> PathBuf {
    build_dir.join(RUNTIME_DIR).join("conf")
}

/// The built-in `mime.types` table written when the app ships none.
pub fn default_mime_types() -> &'static str {
    DEFAULT_MIME_TYPES
}

// ============================================================================
// Template
// ============================================================================

/// `listen` directive: fixed when HTTP/2 is enabled in the Staticfile,
/// otherwise decided by `ENABLE_HTTP2` at boot.
pub fn listener(enable_http2: bool) -> Node {
    let http2 = Node::line(format!("listen {} http2;", env_value("PORT")));
    if enable_http2 {
        http2
    } else {
        Node::when_env(
            "ENABLE_HTTP2",
            vec![http2],
            vec![Node::line(format!("listen {};", env_value("PORT")))],
        )
    }
}

/// 301 to HTTPS for requests that did not arrive over HTTPS.
pub fn https_redirect(force_https: bool) -> Node {
    let redirect = Node::block(
        "if ($best_proto != \"https\")",
        vec![Node::line(
            "return 301 https://$best_host$best_prefix$request_uri;",
        )],
    );
    if force_https {
        redirect
    } else {
        Node::when_env("FORCE_HTTPS", vec![redirect], vec![])
    }
}

/// Map the first comma-separated value of `X-Forwarded-<header>` to
/// `$best_<name>`, falling back to `fallback` when the header is absent.
fn forwarded_map(header: &str, name: &str, fallback: &str) -> Node {
    Node::block(
        format!("map $http_x_forwarded_{header} $best_{name}"),
        vec![
            Node::line("\"~^([^,]+),?.*$\" $1;"),
            Node::line(format!("''               {fallback};")),
        ],
    )
}

pub fn forwarded_maps() -> Vec<Node> {
    vec![
        forwarded_map("host", "host", "$host"),
        forwarded_map("prefix", "prefix", "''"),
        forwarded_map("proto", "proto", "''"),
    ]
}

/// `Strict-Transport-Security` header value, or `None` when HSTS is off.
/// The sub-flags only matter when the parent flag is on.
pub fn hsts_header(config: &Configuration) -> Option<String> {
    if !config.hsts {
        return None;
    }
    let mut value = String::from("max-age=31536000");
    if config.hsts_include_sub_domains {
        value.push_str("; includeSubDomains");
    }
    if config.hsts_preload {
        value.push_str("; preload");
    }
    Some(value)
}

fn root_location(config: &Configuration) -> Node {
    let mut body = Vec::new();

    if config.push_state {
        body.push(Node::block(
            "if (!-e $request_filename)",
            vec![Node::line("rewrite ^(.*)$ / break;")],
        ));
    }

    body.push(Node::line("index index.html index.htm Default.htm;"));

    if config.directory_index {
        body.push(Node::line("autoindex on;"));
        body.push(Node::line("absolute_redirect off;"));
    }

    if config.basic_auth {
        body.push(Node::line("auth_basic \"Restricted\";  #For Basic Auth"));
        body.push(Node::line(format!(
            "auth_basic_user_file {}/{RUNTIME_DIR}/conf/{HTPASSWD};",
            env_value("APP_ROOT")
        )));
    }

    if config.ssi {
        body.push(Node::line("ssi on;"));
    }

    if let Some(value) = hsts_header(config) {
        body.push(Node::line(format!(
            "add_header Strict-Transport-Security \"{value}\";"
        )));
    }

    if !config.location_include.is_empty() {
        body.push(Node::line(format!("include {};", config.location_include)));
    }

    for (codes, page) in &config.status_codes {
        body.push(Node::line(format!("error_page {codes} {page};")));
    }

    Node::block("location /", body)
}

fn dotfile_deny() -> Node {
    Node::block(
        "location ~ /\\.",
        vec![Node::line("deny all;"), Node::line("return 404;")],
    )
}

/// The whole nginx configuration as a template tree.
pub fn server_template(config: &Configuration) -> Vec<Node> {
    let app_root = env_value("APP_ROOT");

    let mut server = vec![
        listener(config.enable_http2),
        Node::line("server_name localhost;"),
        Node::Blank,
        Node::line(format!("root {app_root}/{PUBLIC_DIR};")),
        Node::Blank,
        https_redirect(config.force_https),
        Node::Blank,
        root_location(config),
    ];
    if !config.host_dot_files {
        server.push(Node::Blank);
        server.push(dotfile_deny());
    }

    let mut http = vec![
        Node::line("charset utf-8;"),
        Node::line(
            "log_format cloudfoundry '$http_x_forwarded_for - $http_referer - [$time_local] \"$request\" $status $body_bytes_sent';",
        ),
        Node::line(format!(
            "access_log {app_root}/{RUNTIME_DIR}/logs/access.log cloudfoundry;"
        )),
        Node::line("default_type application/octet-stream;"),
        Node::line("include mime.types;"),
        Node::line("sendfile on;"),
        Node::Blank,
        Node::line("gzip on;"),
        Node::line("gzip_disable \"msie6\";"),
        Node::line("gzip_comp_level 6;"),
        Node::line("gzip_min_length 1100;"),
        Node::line("gzip_buffers 16 8k;"),
        Node::line("gzip_proxied any;"),
        Node::line("gunzip on;"),
        Node::line("gzip_static always;"),
        Node::line(
            "gzip_types text/plain text/css text/js text/xml text/javascript application/javascript application/x-javascript application/json application/xml application/xml+rss;",
        ),
        Node::line("gzip_vary on;"),
        Node::Blank,
        Node::line("tcp_nopush on;"),
        Node::line("keepalive_timeout 30;"),
        Node::line(format!(
            "port_in_redirect off; # Ensure that redirects don't include the internal container PORT - {}",
            env_value("PORT")
        )),
        Node::line("server_tokens off;"),
        Node::Blank,
    ];
    http.extend(forwarded_maps());
    http.push(Node::Blank);
    http.push(Node::block("server", server));

    vec![
        Node::line("worker_processes 1;"),
        Node::line("daemon off;"),
        Node::Blank,
        Node::line(format!(
            "error_log {app_root}/{RUNTIME_DIR}/logs/error.log;"
        )),
        Node::block("events", vec![Node::line("worker_connections 1024;")]),
        Node::Blank,
        Node::block("http", http),
    ]
}

/// Render the configuration text for `config`.
pub fn render_config(config: &Configuration) -> String {
    template::render(&server_template(config))
}

// ============================================================================
// Files
// ============================================================================

/// Write `nginx.conf`, `mime.types` and (with basic auth) `.htpasswd` into
/// `<build>/nginx/conf`, reading overrides from `<build>/public`.
pub fn render(
    build_dir: &Path,
    config: &Configuration,
    sink: &mut dyn EventSink,
) -> Result<(), RenderError> {
    let conf_dir = conf_dir(build_dir);
    let logs_dir = build_dir.join(RUNTIME_DIR).join("logs");
    let public_dir = build_dir.join(PUBLIC_DIR);

    fs::create_dir_all(&conf_dir).map_err(io_err(&conf_dir))?;
    fs::create_dir_all(&logs_dir).map_err(io_err(&logs_dir))?;

    let nginx_conf = conf_dir.join("nginx.conf");
    let custom_conf = public_dir.join("nginx.conf");
    if custom_conf.is_file() {
        sink.emit(FinalizeEvent::CustomNginxConfDeprecated);
        fs::copy(&custom_conf, &nginx_conf).map_err(io_err(&custom_conf))?;
        fs::remove_file(&custom_conf).map_err(io_err(&custom_conf))?;
        tracing::debug!(from = %custom_conf.display(), "using custom nginx.conf");
    } else {
        fs::write(&nginx_conf, render_config(config)).map_err(io_err(&nginx_conf))?;
        tracing::debug!(path = %nginx_conf.display(), "wrote generated nginx.conf");
    }

    if config.basic_auth {
        let credentials = build_dir.join(STATICFILE_AUTH);
        let htpasswd = conf_dir.join(HTPASSWD);
        fs::copy(&credentials, &htpasswd).map_err(io_err(&credentials))?;
        tracing::debug!(path = %htpasswd.display(), "wrote basic auth credentials");
    }

    let mime_types = conf_dir.join("mime.types");
    let custom_mime_types = public_dir.join("mime.types");
    if custom_mime_types.is_file() {
        fs::copy(&custom_mime_types, &mime_types).map_err(io_err(&custom_mime_types))?;
        tracing::debug!(from = %custom_mime_types.display(), "using custom mime.types");
    } else {
        fs::write(&mime_types, DEFAULT_MIME_TYPES).map_err(io_err(&mime_types))?;
    }

    Ok(())
}
