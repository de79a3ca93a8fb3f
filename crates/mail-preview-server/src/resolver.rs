//! Request path resolution.
//!
//! A preview path has the shape `/<viewer slug>/<action>[.<ext>]`, where the
//! viewer slug is one or more word segments (`comments/notify_mailer`).
//! Paths that do not have this shape are declined (pass-through 404) so an
//! enclosing router can try another handler; well-shaped paths naming an
//! unknown viewer or action are a definite 404.

#![forbid(unsafe_code)]

use std::sync::{Arc, LazyLock};

use mail_preview_core::{Error, Result, slug_to_identity};
use regex::Regex;

use crate::registry::{ViewerRegistry, ViewerType};

static PREVIEW_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/?((?:\w+/)+)(\w+)(?:\.(\w+))?$").expect("preview path regex")
});

/// The pieces of a well-shaped preview path, before registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMatch<'a> {
    /// Viewer slug without the trailing slash (`comments/notify_mailer`).
    pub viewer_slug: &'a str,
    pub action: &'a str,
    pub format: Option<&'a str>,
}

/// Split `path_info` into viewer slug, action, and optional format.
///
/// Returns `None` when the path does not have the preview shape.
#[must_use]
pub fn parse_preview_path(path_info: &str) -> Option<PathMatch<'_>> {
    let caps = PREVIEW_PATH.captures(path_info)?;
    let viewer_slug = caps.get(1)?.as_str().trim_end_matches('/');
    let action = caps.get(2)?.as_str();
    let format = caps.get(3).map(|m| m.as_str());
    Some(PathMatch {
        viewer_slug,
        action,
        format,
    })
}

/// A path that names a registered viewer and one of its actions.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub viewer: Arc<ViewerType>,
    pub action: String,
    pub format: String,
}

/// How the handler should answer a path.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The mount root: list every preview.
    Index,
    Resolved(ResolvedRequest),
    /// `pass_through` is set when the path is not a preview path at all.
    NotFound { pass_through: bool },
}

impl Resolution {
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(self, Self::Index)
    }
}

/// Resolve `path_info` against `registry`.
///
/// `Ok(None)` is the index; dispatch misses are reported as
/// [`Error::UnrecognizedPath`], [`Error::UnknownViewer`], or [`Error::UnknownAction`].
pub fn resolve_request(
    path_info: &str,
    registry: &ViewerRegistry,
    default_format: &str,
) -> Result<Option<ResolvedRequest>> {
    if path_info.is_empty() || path_info == "/" {
        return Ok(None);
    }

    let Some(parsed) = parse_preview_path(path_info) else {
        return Err(Error::UnrecognizedPath(path_info.to_string()));
    };

    let identity = slug_to_identity(parsed.viewer_slug);
    let Some(viewer) = registry.get(&identity) else {
        return Err(Error::UnknownViewer(identity));
    };
    if !viewer.has_action(parsed.action) {
        return Err(Error::UnknownAction {
            viewer: identity,
            action: parsed.action.to_string(),
        });
    }

    Ok(Some(ResolvedRequest {
        viewer,
        action: parsed.action.to_string(),
        format: parsed.format.unwrap_or(default_format).to_string(),
    }))
}

/// Classify `path_info` for the handler.
#[must_use]
pub fn resolve(path_info: &str, registry: &ViewerRegistry, default_format: &str) -> Resolution {
    match resolve_request(path_info, registry, default_format) {
        Ok(None) => Resolution::Index,
        Ok(Some(resolved)) => Resolution::Resolved(resolved),
        Err(e) => {
            tracing::debug!(path = path_info, error = %e, "preview path not resolved");
            Resolution::NotFound {
                pass_through: e.is_pass_through(),
            }
        }
    }
}
