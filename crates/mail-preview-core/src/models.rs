//! Message model for previewed email.
//!
//! A [`Message`] is the artifact an action produces: headers, a body, and, for
//! multipart mail, an ordered list of sub-messages. It deserializes from the
//! `actions` table of a preview definition file and serializes into template
//! contexts.

#![forbid(unsafe_code)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::mime::{content_type_matches, media_type};

/// Content type assumed when a message does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

/// A generated email message, possibly multipart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Any other headers, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Self>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            subject: None,
            from: Vec::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            date: None,
            headers: IndexMap::new(),
            content_type: default_content_type(),
            body: String::new(),
            parts: Vec::new(),
        }
    }
}

impl Message {
    /// A single-part message with the given content type and body.
    #[must_use]
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// A `multipart/alternative` message wrapping `parts` in order.
    #[must_use]
    pub fn multipart(parts: Vec<Self>) -> Self {
        Self {
            content_type: "multipart/alternative".to_string(),
            parts,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_from(mut self, address: impl Into<String>) -> Self {
        self.from.push(address.into());
        self
    }

    #[must_use]
    pub fn with_to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// True when the message is composed of parts.
    ///
    /// A message declaring a `multipart/*` content type counts even before any
    /// parts are attached.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty() || media_type(&self.content_type).starts_with("multipart/")
    }

    #[must_use]
    pub fn parts(&self) -> &[Self] {
        &self.parts
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// True when this message's media type equals `mime_type`.
    #[must_use]
    pub fn has_content_type(&self, mime_type: &str) -> bool {
        content_type_matches(&self.content_type, mime_type)
    }

    /// True for `text/html` bodies, which the email page embeds instead of quoting.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.has_content_type("text/html")
    }
}
