//! File extensions and the built-in content-type table.

use std::collections::BTreeMap;

/// Content type sent for an allowed extension without a configured mapping.
pub const DEFAULT_MIME: &str = "application/octet-stream";

const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
];

/// Table used when the configuration does not list `content_types`.
pub fn default_table() -> BTreeMap<String, String> {
    DEFAULT_TYPES
        .iter()
        .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
        .collect()
}

/// Returns the text after the last `.` of the final path segment, or `""`.
///
/// ```
/// # use staticd::http::mime::extension_of;
/// assert_eq!(extension_of("/docs/index.html"), "html");
/// assert_eq!(extension_of("/archive.tar.gz"), "gz");
/// assert_eq!(extension_of("/v1.2/README"), "");
/// ```
pub fn extension_of(uri: &str) -> &str {
    let segment = uri.rsplit('/').next().unwrap_or(uri);
    match segment.rfind('.') {
        Some(idx) => &segment[idx + 1..],
        None => "",
    }
}
