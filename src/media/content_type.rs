//! Extension based MIME type resolution.

/// Content type used when the extension is not a known image type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Known image extensions (lowercase, without the dot).
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
];

/// Resolve the MIME type of an object from its key.
///
/// The key is lowercased and everything after the last `.` is looked up in a
/// fixed table. A key without a `.` is looked up whole, which never matches,
/// so it resolves to [`DEFAULT_CONTENT_TYPE`].
///
/// # Example
///
/// ```
/// use image_gateway::media::resolve_content_type;
///
/// assert_eq!(resolve_content_type("PHOTO.PNG"), "image/png");
/// assert_eq!(resolve_content_type("archive"), "application/octet-stream");
/// ```
pub fn resolve_content_type(key: &str) -> &'static str {
    let lower = key.to_lowercase();
    let ext = lower.rsplit('.').next().unwrap_or(&lower);

    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
