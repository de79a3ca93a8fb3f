//! MIME type lookup for preview formats.
//!
//! A request such as `/notifier/digest.txt` asks for the `text/plain` part of a
//! multipart message; this module maps between such extensions and media types.

#![forbid(unsafe_code)]

/// Fallback media type for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

const MIME_TABLE: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("md", "text/markdown"),
    ("ics", "text/calendar"),
    ("csv", "text/csv"),
    ("css", "text/css"),
    ("xml", "application/xml"),
    ("json", "application/json"),
    ("js", "application/javascript"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("eml", "message/rfc822"),
];

/// Media type for a format extension (with or without a leading dot).
///
/// Unknown extensions map to [`OCTET_STREAM`].
#[must_use]
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map_or(OCTET_STREAM, |(_, mime)| *mime)
}

/// Preferred extension for a media type, if it is one we know.
///
/// Parameters (`; charset=...`) are ignored. The first table entry wins, so
/// `text/html` maps to `html` rather than `htm`.
#[must_use]
pub fn extension_for_mime_type(content_type: &str) -> Option<&'static str> {
    let essence = media_type(content_type);
    MIME_TABLE
        .iter()
        .find(|(_, mime)| *mime == essence)
        .map(|(ext, _)| *ext)
}

/// The `type/subtype` essence of a content type, lowercased, without parameters.
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// True when `content_type` names the media type `wanted`, ignoring case and parameters.
#[must_use]
pub fn content_type_matches(content_type: &str, wanted: &str) -> bool {
    let essence = media_type(content_type);
    !essence.is_empty() && essence == media_type(wanted)
}
