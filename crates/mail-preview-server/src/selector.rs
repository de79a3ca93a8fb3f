//! Picking the part of a message to display for a requested format.

#![forbid(unsafe_code)]

use std::ptr;

use mail_preview_core::{Message, extension_for_mime_type, mime_type_for_extension};
use serde::Serialize;

/// The part of `message` to render for `format`.
///
/// Single-part messages are returned as-is. For multipart messages the format
/// is mapped to a MIME type and the first part of that type wins; when no part
/// matches, the first part is used.
#[must_use]
pub fn select_body_part<'a>(message: &'a Message, format: &str) -> &'a Message {
    if !message.is_multipart() {
        return message;
    }
    let parts = message.parts();
    let Some(first) = parts.first() else {
        return message;
    };
    let wanted = mime_type_for_extension(format);
    parts
        .iter()
        .find(|part| part.has_content_type(wanted))
        .unwrap_or(first)
}

/// A format the email page can switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alternative {
    /// URL extension (`html`, `txt`).
    pub format: String,
    pub content_type: String,
    /// True for the part currently displayed.
    pub selected: bool,
}

/// One entry per part of `message` whose media type has a known extension.
///
/// The first part claiming an extension owns it, matching what
/// [`select_body_part`] returns for that format. Single-part messages have no
/// alternatives.
#[must_use]
pub fn alternatives(message: &Message, body_part: &Message) -> Vec<Alternative> {
    let mut out: Vec<Alternative> = Vec::new();
    for part in message.parts() {
        let Some(ext) = extension_for_mime_type(part.content_type()) else {
            continue;
        };
        if out.iter().any(|alt| alt.format == ext) {
            continue;
        }
        out.push(Alternative {
            format: ext.to_string(),
            content_type: part.content_type().to_string(),
            selected: ptr::eq(part, body_part),
        });
    }
    out
}
