//! Viewer identity normalization.
//!
//! A viewer is addressed two ways: by its hierarchical identity
//! (`Admin::WelcomeMailer`) and by the slug used in URLs
//! (`admin/welcome_mailer`). Both conversions are pure string functions.

#![forbid(unsafe_code)]

/// Separator between namespace levels in an identity.
pub const IDENTITY_SEPARATOR: &str = "::";

/// Convert a URL slug into identity form.
///
/// `admin/welcome_mailer` → `Admin::WelcomeMailer`. Empty segments are dropped,
/// so leading/trailing/doubled slashes do not produce empty namespace levels.
#[must_use]
pub fn slug_to_identity(slug: &str) -> String {
    slug.split('/')
        .filter(|segment| !segment.is_empty())
        .map(camelize_segment)
        .collect::<Vec<_>>()
        .join(IDENTITY_SEPARATOR)
}

fn camelize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for word in segment.split('_') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Convert an identity into its URL slug.
///
/// `Admin::WelcomeMailer` → `admin/welcome_mailer`, `HTMLMailer` → `html_mailer`.
/// Names already in slug form pass through; empty levels are dropped either way.
#[must_use]
pub fn identity_to_slug(identity: &str) -> String {
    identity
        .split(IDENTITY_SEPARATOR)
        .flat_map(|segment| segment.split('/'))
        .filter(|segment| !segment.is_empty())
        .map(underscore_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn underscore_segment(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        if c == '-' {
            out.push('_');
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Canonical registry key for a declared viewer name.
///
/// Declared names may use acronyms (`HTMLMailer`) that do not survive a
/// slug round trip; the canonical form is what the name's slug resolves to.
/// Always equal to `slug_to_identity(&identity_to_slug(name))`.
#[must_use]
pub fn canonical_identity(name: &str) -> String {
    slug_to_identity(&identity_to_slug(name))
}
