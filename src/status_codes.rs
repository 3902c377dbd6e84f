//! Status-code class shorthand for the `status_codes` directive.
//!
//! Users may write `4xx: /errors/client.html` instead of listing every client
//! error. A key of the form `<digit>xx` is replaced by the space-separated list
//! of registered codes in that class, which is exactly what nginx's
//! `error_page` directive accepts.
//!
//! ```text
//! 5xx  →  "500 501 502 503 504 505 506 507 508 510 511"
//! 404  →  "404"                (not a pattern, passed through)
//! ```

use std::collections::BTreeMap;

const INFORMATIONAL: &[u16] = &[100, 101, 102, 103];
const SUCCESS: &[u16] = &[200, 201, 202, 203, 204, 205, 206, 207, 208, 226];
const REDIRECTION: &[u16] = &[300, 301, 302, 303, 304, 305, 307, 308];
const CLIENT_ERROR: &[u16] = &[
    400, 401, 402, 403, 404, 405, 406, 407, 408, 409, 410, 411, 412, 413, 414, 415, 416, 417, 418,
    421, 422, 423, 424, 426, 428, 429, 431, 451,
];
const SERVER_ERROR: &[u16] = &[500, 501, 502, 503, 504, 505, 506, 507, 508, 510, 511];

/// Registered codes for a class digit, ascending. `None` for classes with no
/// registered codes (`0xx`, `6xx`..`9xx`).
pub fn class_codes(class: u8) -> Option<&'static [u16]> {
    match class {
        1 => Some(INFORMATIONAL),
        2 => Some(SUCCESS),
        3 => Some(REDIRECTION),
        4 => Some(CLIENT_ERROR),
        5 => Some(SERVER_ERROR),
        _ => None,
    }
}

/// Return the class digit if `key` is exactly one ASCII digit followed by `xx`.
fn pattern_class(key: &str) -> Option<u8> {
    match key.as_bytes() {
        [d @ b'0'..=b'9', b'x', b'x'] => Some(d - b'0'),
        _ => None,
    }
}

/// Expand a single key. Non-pattern keys, and patterns for classes without
/// registered codes, come back unchanged.
pub fn expand_key(key: &str) -> String {
    pattern_class(key)
        .and_then(class_codes)
        .map(|codes| {
            codes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| key.to_string())
}

/// Expand every pattern key of a `status_codes` mapping. Page paths are
/// carried over untouched.
pub fn expand(status_codes: BTreeMap<String, String>) -> BTreeMap<String, String> {
    status_codes
        .into_iter()
        .map(|(key, page)| (expand_key(&key), page))
        .collect()
}
