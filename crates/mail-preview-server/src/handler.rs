//! The preview request handler.
//!
//! [`MailPreview`] is a mountable, synchronous handler: it takes a
//! [`PreviewRequest`] whose `path_info` is relative to the mount point and
//! returns a [`PreviewResponse`]. Requests it does not own come back as a
//! pass-through 404 (`X-Cascade: pass`) so the caller can try another route.

#![forbid(unsafe_code)]

use std::sync::Arc;

use mail_preview_core::config::normalize_mount_prefix;
use mail_preview_core::{Config, Message, Result};

use crate::loader::ViewerLoader;
use crate::registry::{ViewerRegistry, ViewerType};
use crate::resolver::{Resolution, ResolvedRequest, resolve};
use crate::response::{
    PreviewResponse, build_email_page, build_index, build_not_found, index_links,
};
use crate::selector::{alternatives, select_body_part};
use crate::templates::Templates;

/// An incoming request, already split at the mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub method: String,
    /// Path below the mount point (`/admin/welcome_mailer/welcome.txt`).
    pub path_info: String,
    /// The mount point itself (`/rails/mail_view`), `""` at the root.
    pub script_name: String,
}

impl PreviewRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, path_info: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path_info: path_info.into(),
            script_name: String::new(),
        }
    }

    #[must_use]
    pub fn get(path_info: impl Into<String>) -> Self {
        Self::new("GET", path_info)
    }

    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    /// Split a full request URI at `mount_prefix`.
    ///
    /// The query string is dropped. Returns `None` when the URI is not under
    /// the mount point.
    #[must_use]
    pub fn from_mounted_uri(method: &str, uri: &str, mount_prefix: &str) -> Option<Self> {
        let (path, _query) = split_path_query(uri);
        let prefix = normalize_mount_prefix(mount_prefix);
        let path_info = if prefix.is_empty() {
            path
        } else {
            let rest = path.strip_prefix(&prefix)?;
            if !(rest.is_empty() || rest.starts_with('/')) {
                return None;
            }
            rest
        };
        Some(Self {
            method: method.to_string(),
            path_info: path_info.to_string(),
            script_name: prefix,
        })
    }

    fn is_get_or_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET") || self.is_head()
    }

    fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}

fn split_path_query(uri: &str) -> (&str, Option<&str>) {
    let mut parts = uri.splitn(2, '?');
    let path = parts.next().unwrap_or("/");
    (path, parts.next())
}

/// The mail preview handler.
#[derive(Debug, Clone)]
pub struct MailPreview {
    registry: Arc<ViewerRegistry>,
    loader: Option<Arc<ViewerLoader>>,
    templates: Templates,
    default_format: String,
}

impl MailPreview {
    /// A handler over `registry` with embedded templates and no discovery.
    #[must_use]
    pub fn new(registry: Arc<ViewerRegistry>) -> Self {
        Self {
            registry,
            loader: None,
            templates: Templates::embedded(),
            default_format: mail_preview_core::config::DEFAULT_FORMAT.to_string(),
        }
    }

    /// A handler over the global registry, configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let loader = ViewerLoader::from_config(config)?;
        Ok(Self::new(ViewerRegistry::global())
            .with_loader(loader)
            .with_templates(Templates::from_config(config)?)
            .with_default_format(config.default_format.clone()))
    }

    /// Discover preview definition files before each request.
    #[must_use]
    pub fn with_loader(mut self, loader: ViewerLoader) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    /// Format used when a path has no extension.
    #[must_use]
    pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = format.into();
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ViewerRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn loader(&self) -> Option<&ViewerLoader> {
        self.loader.as_deref()
    }

    #[must_use]
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Format rendered when a path has no extension.
    #[must_use]
    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Run discovery, if a loader is attached.
    pub fn load_viewers(&self) {
        if let Some(loader) = &self.loader {
            loader.ensure_loaded(&self.registry);
        }
    }

    /// Answer one request.
    ///
    /// Dispatch misses become 404 responses. Template and action failures are
    /// returned as errors.
    pub fn call(&self, request: &PreviewRequest) -> Result<PreviewResponse> {
        if !request.is_get_or_head() {
            tracing::debug!(method = %request.method, "declining non-GET preview request");
            return Ok(build_not_found(true));
        }

        self.load_viewers();

        let response = match resolve(&request.path_info, &self.registry, &self.default_format) {
            Resolution::Index => {
                let links = index_links(&self.registry, &request.script_name);
                build_index(&self.templates, &links)?
            }
            Resolution::Resolved(resolved) => self.render_mail(&resolved, &request.script_name)?,
            Resolution::NotFound { pass_through } => build_not_found(pass_through),
        };

        if request.is_head() {
            return Ok(response.without_body());
        }
        Ok(response)
    }

    fn render_mail(&self, resolved: &ResolvedRequest, script_name: &str) -> Result<PreviewResponse> {
        tracing::debug!(
            viewer = resolved.viewer.identity(),
            action = %resolved.action,
            format = %resolved.format,
            "rendering preview"
        );
        let message = resolved.viewer.invoke(&resolved.action)?;
        self.render_message(
            &resolved.viewer,
            &resolved.action,
            &resolved.format,
            &message,
            script_name,
        )
    }

    /// Render the page for an already invoked `action` of `viewer`, showing
    /// the part of `message` that matches `format`.
    pub fn render_message(
        &self,
        viewer: &ViewerType,
        action: &str,
        format: &str,
        message: &Message,
        script_name: &str,
    ) -> Result<PreviewResponse> {
        let body_part = select_body_part(message, format);
        let alternatives = alternatives(message, body_part);
        let base_url = format!("{script_name}/{}/{action}", viewer.slug());
        build_email_page(
            &self.templates,
            action,
            message,
            body_part,
            &alternatives,
            &base_url,
        )
    }
}
