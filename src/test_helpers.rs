//! Shared test utilities for the finalizer test suite.
//!
//! Generated nginx configuration is compared after normalization, so tests
//! can write expected fragments as indented raw strings:
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let conf = read_nginx_conf(tmp.path());
//! assert!(conf.contains(&strip_leading_whitespace(r"
//!     location ~ /\. {
//!       deny all;
//!     }
//! ")));
//! ```

use std::fs;
use std::path::Path;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `contents` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
}

// =========================================================================
// Normalization
// =========================================================================

/// Trim each line's indentation and drop blank lines.
///
/// Every kept line ends in `\n`, so a normalized fragment can be searched
/// for inside a normalized document.
pub fn strip_leading_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Read `<build>/nginx/conf/nginx.conf`, normalized.
pub fn read_nginx_conf(build_dir: &Path) -> String {
    let path = build_dir.join("nginx").join("conf").join("nginx.conf");
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
    strip_leading_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_drops_indentation_and_blank_lines() {
        let text = "\n    a {\n      b;\n\n    }\n";
        assert_eq!(strip_leading_whitespace(text), "a {\nb;\n}\n");
    }

    #[test]
    fn strip_keeps_inner_spacing() {
        assert_eq!(
            strip_leading_whitespace("  ''               $host;"),
            "''               $host;\n"
        );
    }
}
