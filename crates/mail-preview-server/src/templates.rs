//! Template rendering for the preview pages.
//!
//! The index and email templates are embedded at compile time so the handler
//! works without any files on disk. A configured templates directory can
//! replace either of them.

#![forbid(unsafe_code)]

use std::path::Path;

use include_dir::{Dir, include_dir};
use mail_preview_core::{Config, Error, Result};
use minijinja::{AutoEscape, Environment};

static TEMPLATE_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Template for the list of available previews.
pub const INDEX_TEMPLATE: &str = "index.html";
/// Template for a single rendered email.
pub const EMAIL_TEMPLATE: &str = "email.html";

const OVERRIDABLE: [&str; 2] = [INDEX_TEMPLATE, EMAIL_TEMPLATE];

fn auto_escape(name: &str) -> AutoEscape {
    let is_html = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
    if is_html {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

fn template_error(err: &minijinja::Error) -> Error {
    Error::Template(format!("{err:#}"))
}

/// A template environment holding the index and email templates.
#[derive(Debug, Clone)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// The built-in templates.
    #[must_use]
    pub fn embedded() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(auto_escape);

        for file in TEMPLATE_DIR.files() {
            let Some(name) = file.path().to_str() else {
                continue;
            };
            let contents =
                std::str::from_utf8(file.contents()).unwrap_or("<!-- invalid utf-8 template -->");
            if let Err(e) = env.add_template(name, contents) {
                tracing::warn!(template = name, error = %e, "skipping embedded template");
            }
        }

        Self { env }
    }

    /// The built-in templates, with `index.html` and/or `email.html` replaced
    /// by files of the same name in `dir`.
    ///
    /// A missing file keeps the built-in; an unreadable or invalid one is an error.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut templates = Self::embedded();
        for name in OVERRIDABLE {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(&path)?;
            templates
                .env
                .add_template_owned(name.to_string(), source)
                .map_err(|e| template_error(&e))?;
            tracing::debug!(template = name, path = %path.display(), "using template override");
        }
        Ok(templates)
    }

    /// Templates for `config`: overrides from `templates_dir` when set.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.templates_dir {
            Some(dir) => Self::with_overrides(dir),
            None => Ok(Self::embedded()),
        }
    }

    /// Render template `name` with `ctx`.
    pub fn render<S: serde::Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let tpl = self
            .env
            .get_template(name)
            .map_err(|e| template_error(&e))?;
        tpl.render(ctx).map_err(|e| template_error(&e))
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::embedded()
    }
}
