//! Operator-facing output for the finalize pipeline.
//!
//! Every notable action is reported as a [`FinalizeEvent`]. Formatting is
//! separate from delivery: [`format_event`] is a pure function from one event
//! to its display lines, and an [`EventSink`] decides where events go.
//!
//! # Output Format
//!
//! Steps start with a fixed banner, warnings are indented and tagged:
//!
//! ```text
//! -----> Enabling hosting of dotfiles
//! -----> Enabling HSTS
//! -----> Enabling basic authentication using Staticfile.auth
//! -----> Root folder /tmp/app/dist
//!        **WARNING** overriding nginx.conf is deprecated and highly discouraged, ...
//! ```
//!
//! A directive left at its default produces no event, so no line.

use std::path::PathBuf;

/// Prefix of every step line.
pub const STEP_BANNER: &str = "-----> ";
/// Prefix of every warning line.
pub const WARNING_BANNER: &str = "       **WARNING** ";
/// Indentation of warning continuation lines.
const CONTINUATION: &str = "       ";

/// A directive that was switched on by the Staticfile (or, for basic auth, by
/// the presence of `Staticfile.auth`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enabled {
    HostDotFiles,
    LocationInclude(String),
    DirectoryIndex,
    Ssi,
    PushState,
    Hsts,
    HstsIncludeSubDomains,
    HstsPreload,
    Http2,
    ForceHttps,
    StatusCodes,
    BasicAuth,
}

impl Enabled {
    fn describe(&self) -> String {
        match self {
            Enabled::HostDotFiles => "hosting of dotfiles".to_string(),
            Enabled::LocationInclude(path) => format!("location include file {path}"),
            Enabled::DirectoryIndex => {
                "directory index for folders without index.html files".to_string()
            }
            Enabled::Ssi => "SSI".to_string(),
            Enabled::PushState => "pushstate".to_string(),
            Enabled::Hsts => "HSTS".to_string(),
            Enabled::HstsIncludeSubDomains => "HSTS includeSubDomains".to_string(),
            Enabled::HstsPreload => "HSTS Preload".to_string(),
            Enabled::Http2 => "HTTP/2".to_string(),
            Enabled::ForceHttps => "HTTPS redirect".to_string(),
            Enabled::StatusCodes => "custom pages for status_codes".to_string(),
            Enabled::BasicAuth => "basic authentication using Staticfile.auth".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeEvent {
    /// A directive differs from its default.
    Enabled(Enabled),
    /// The content root about to be validated, as given (not canonicalized).
    RootFolder(PathBuf),
    /// `nginx/conf` exists but `root` is unset or equivalent to `.`.
    NginxConfDirWithoutRoot,
    /// A user-supplied `nginx.conf` replaced the generated configuration.
    CustomNginxConfDeprecated,
}

/// Format one event as display lines.
pub fn format_event(event: &FinalizeEvent) -> Vec<String> {
    match event {
        FinalizeEvent::Enabled(what) => {
            vec![format!("{STEP_BANNER}Enabling {}", what.describe())]
        }
        FinalizeEvent::RootFolder(path) => {
            vec![format!("{STEP_BANNER}Root folder {}", path.display())]
        }
        FinalizeEvent::NginxConfDirWithoutRoot => vec![
            format!(
                "{WARNING_BANNER}You have an nginx/conf directory, but have not set *root*, or have set it to '.'."
            ),
            format!(
                "{CONTINUATION}If you are using the nginx/conf directory for nginx configuration, you probably need to also set the *root* directive."
            ),
        ],
        FinalizeEvent::CustomNginxConfDeprecated => vec![format!(
            "{WARNING_BANNER}overriding nginx.conf is deprecated and highly discouraged, as it breaks the functionality of the Staticfile and Staticfile.auth configuration directives. Please use the NGINX buildpack available at: https://github.com/cloudfoundry/nginx-buildpack"
        )],
    }
}

/// Destination for pipeline events.
pub trait EventSink {
    fn emit(&mut self, event: FinalizeEvent);
}

/// Collects events in order; used by tests and by callers that render later.
impl EventSink for Vec<FinalizeEvent> {
    fn emit(&mut self, event: FinalizeEvent) {
        self.push(event);
    }
}

/// Prints each event to stdout as it happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl EventSink for Console {
    fn emit(&mut self, event: FinalizeEvent) {
        for line in format_event(&event) {
            println!("{}", line);
        }
    }
}

/// Format a whole event log, one display line per element.
pub fn format_events(events: &[FinalizeEvent]) -> Vec<String> {
    events.iter().flat_map(format_event).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_lines_carry_the_banner() {
        let lines = format_event(&FinalizeEvent::Enabled(Enabled::HostDotFiles));
        assert_eq!(lines, vec!["-----> Enabling hosting of dotfiles"]);
    }

    #[test]
    fn location_include_names_the_path() {
        let lines = format_event(&FinalizeEvent::Enabled(Enabled::LocationInclude(
            "a/b/c".into(),
        )));
        assert_eq!(lines, vec!["-----> Enabling location include file a/b/c"]);
    }

    #[test]
    fn hsts_variants_are_distinct_lines() {
        let lines = format_events(&[
            FinalizeEvent::Enabled(Enabled::Hsts),
            FinalizeEvent::Enabled(Enabled::HstsIncludeSubDomains),
            FinalizeEvent::Enabled(Enabled::HstsPreload),
        ]);
        assert_eq!(
            lines,
            vec![
                "-----> Enabling HSTS",
                "-----> Enabling HSTS includeSubDomains",
                "-----> Enabling HSTS Preload",
            ]
        );
    }

    #[test]
    fn root_folder_shows_the_path() {
        let lines = format_event(&FinalizeEvent::RootFolder(PathBuf::from("/tmp/app/dist")));
        assert_eq!(lines, vec!["-----> Root folder /tmp/app/dist"]);
    }

    #[test]
    fn nginx_conf_warning_is_two_lines() {
        let lines = format_event(&FinalizeEvent::NginxConfDirWithoutRoot);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(
            "**WARNING** You have an nginx/conf directory, but have not set *root*, or have set it to '.'."
        ));
        assert!(lines[1].contains(
            "If you are using the nginx/conf directory for nginx configuration, you probably need to also set the *root* directive."
        ));
    }

    #[test]
    fn deprecation_warning_is_one_line() {
        let lines = format_event(&FinalizeEvent::CustomNginxConfDeprecated);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(WARNING_BANNER));
        assert!(lines[0].contains("overriding nginx.conf is deprecated"));
        assert!(lines[0].contains("https://github.com/cloudfoundry/nginx-buildpack"));
    }

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink: Vec<FinalizeEvent> = Vec::new();
        sink.emit(FinalizeEvent::Enabled(Enabled::Ssi));
        sink.emit(FinalizeEvent::Enabled(Enabled::PushState));
        assert_eq!(
            sink,
            vec![
                FinalizeEvent::Enabled(Enabled::Ssi),
                FinalizeEvent::Enabled(Enabled::PushState),
            ]
        );
    }
}
