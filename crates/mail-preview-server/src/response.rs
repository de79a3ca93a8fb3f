//! Building handler responses: the preview index, email pages, and 404s.

#![forbid(unsafe_code)]

use mail_preview_core::{Message, Result};
use serde::Serialize;

use crate::registry::ViewerRegistry;
use crate::selector::Alternative;
use crate::templates::{EMAIL_TEMPLATE, INDEX_TEMPLATE, Templates};

/// Content type of rendered preview pages.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
/// Content type of 404 responses.
pub const NOT_FOUND_CONTENT_TYPE: &str = "text/html";
/// Header telling an enclosing router to try the next handler.
pub const CASCADE_HEADER: &str = "X-Cascade";
pub const CASCADE_PASS: &str = "pass";

const NOT_FOUND_BODY: &str = "Not Found";

/// A complete HTTP-style response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PreviewResponse {
    fn html(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    /// Value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// True when the handler declined the request.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.status == 404 && self.header(CASCADE_HEADER) == Some(CASCADE_PASS)
    }

    /// Drop the body, keeping status and headers (for `HEAD`).
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body.clear();
        self
    }
}

/// One entry on the preview index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// `<slug>.<action>`
    pub label: String,
    /// `<mount prefix>/<slug>/<action>`
    pub url: String,
}

/// Every (viewer, action) pair in `registry`, sorted by label.
#[must_use]
pub fn index_links(registry: &ViewerRegistry, mount_prefix: &str) -> Vec<Link> {
    let mut links: Vec<Link> = registry
        .all_viewers()
        .iter()
        .flat_map(|viewer| {
            viewer.actions().into_iter().map(move |action| Link {
                label: format!("{}.{action}", viewer.slug()),
                url: format!("{mount_prefix}/{}/{action}", viewer.slug()),
            })
        })
        .collect();
    links.sort_by(|a, b| a.label.cmp(&b.label));
    links
}

#[derive(Serialize)]
struct IndexCtx<'a> {
    links: &'a [Link],
}

/// Render the preview index.
pub fn build_index(templates: &Templates, links: &[Link]) -> Result<PreviewResponse> {
    let html = templates.render(INDEX_TEMPLATE, IndexCtx { links })?;
    Ok(PreviewResponse::html(200, HTML_CONTENT_TYPE, html))
}

#[derive(Debug, Serialize)]
struct HeaderView {
    name: String,
    value: String,
}

fn header_views(message: &Message) -> Vec<HeaderView> {
    let mut out = Vec::new();
    let mut push = |name: &str, value: String| {
        if !value.is_empty() {
            out.push(HeaderView {
                name: name.to_string(),
                value,
            });
        }
    };
    push("Subject", message.subject.clone().unwrap_or_default());
    push("Date", message.date.clone().unwrap_or_default());
    push("From", message.from.join(", "));
    push("Reply-To", message.reply_to.join(", "));
    push("To", message.to.join(", "));
    push("Cc", message.cc.join(", "));
    push("Bcc", message.bcc.join(", "));
    for (name, value) in &message.headers {
        push(name, value.clone());
    }
    out
}

#[derive(Serialize)]
struct EmailCtx<'a> {
    name: &'a str,
    mail: &'a Message,
    body_part: &'a Message,
    is_html: bool,
    headers: Vec<HeaderView>,
    alternatives: &'a [Alternative],
    base_url: &'a str,
}

/// Render one email.
///
/// `base_url` is the action URL without an extension; alternative formats
/// link to `<base_url>.<ext>`.
pub fn build_email_page(
    templates: &Templates,
    action: &str,
    message: &Message,
    body_part: &Message,
    alternatives: &[Alternative],
    base_url: &str,
) -> Result<PreviewResponse> {
    let ctx = EmailCtx {
        name: action,
        mail: message,
        body_part,
        is_html: body_part.is_html(),
        headers: header_views(message),
        alternatives,
        base_url,
    };
    let html = templates.render(EMAIL_TEMPLATE, ctx)?;
    Ok(PreviewResponse::html(200, HTML_CONTENT_TYPE, html))
}

/// `404 Not Found`. A pass-through 404 also carries `X-Cascade: pass`.
#[must_use]
pub fn build_not_found(pass_through: bool) -> PreviewResponse {
    let mut response = PreviewResponse::html(404, NOT_FOUND_CONTENT_TYPE, NOT_FOUND_BODY);
    if pass_through {
        response
            .headers
            .push((CASCADE_HEADER.to_string(), CASCADE_PASS.to_string()));
    }
    response
}
