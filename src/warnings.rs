//! Post-hoc sanity checks that warn but never fail the run.

use crate::directives::Configuration;
use crate::nginx;
use crate::output::{EventSink, FinalizeEvent};
use crate::paths;
use std::path::Path;

/// Warn when the app ships an `nginx/conf` directory but serves from the
/// build directory itself.
///
/// That combination usually means `root` was forgotten: the custom nginx
/// files would be published as content.
pub fn check_warnings(build_dir: &Path, config: &Configuration, sink: &mut dyn EventSink) {
    let has_conf_dir = nginx::conf_dir(build_dir).is_dir();
    if has_conf_dir && paths::is_current_dir(Path::new(&config.root_dir)) {
        sink.emit(FinalizeEvent::NginxConfDirWithoutRoot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn warnings_for(root_dir: &str, with_conf_dir: bool) -> Vec<FinalizeEvent> {
        let tmp = TempDir::new().unwrap();
        if with_conf_dir {
            fs::create_dir_all(tmp.path().join("nginx").join("conf")).unwrap();
        }
        let config = Configuration {
            root_dir: root_dir.to_string(),
            ..Default::default()
        };
        let mut events = Vec::new();
        check_warnings(tmp.path(), &config, &mut events);
        events
    }

    #[test]
    fn warns_when_root_is_unset_or_dot() {
        for root in ["", ".", "./fred/..", "./x/.."] {
            assert_eq!(
                warnings_for(root, true),
                vec![FinalizeEvent::NginxConfDirWithoutRoot],
                "root {root:?}"
            );
        }
    }

    #[test]
    fn silent_when_root_points_elsewhere() {
        for root in ["somedir", "./somedir", "a/b/.."] {
            assert!(warnings_for(root, true).is_empty(), "root {root:?}");
        }
    }

    #[test]
    fn silent_without_nginx_conf_dir() {
        assert!(warnings_for("", false).is_empty());
    }

    #[test]
    fn nginx_conf_as_file_does_not_warn() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nginx")).unwrap();
        fs::write(tmp.path().join("nginx").join("conf"), "not a dir").unwrap();
        let mut events = Vec::new();
        check_warnings(tmp.path(), &Configuration::default(), &mut events);
        assert!(events.is_empty());
    }
}
