//! Configuration for Mail Preview.
//!
//! Values come from the process environment first, then from a `.env` file in
//! the working directory. Every key is prefixed with `MAIL_PREVIEW_`.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default directory scanned for preview definition files.
pub const DEFAULT_PREVIEWS_ROOT: &str = "app/mailers";
/// Default glob (relative to the previews root) selecting definition files.
pub const DEFAULT_PREVIEW_GLOB: &str = "**/*.json5";
/// Format used when a preview path carries no `.ext` suffix.
pub const DEFAULT_FORMAT: &str = "html";

/// Main configuration struct for Mail Preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory walked by the viewer loader.
    pub previews_root: PathBuf,
    /// Glob matched against paths relative to `previews_root`.
    pub preview_glob: String,
    /// Optional directory whose `index.html` / `email.html` replace the embedded templates.
    pub templates_dir: Option<PathBuf>,
    /// Re-run discovery on every request (default: true).
    pub reload_on_request: bool,
    /// Format assumed when the request path has no extension.
    pub default_format: String,
    /// Prefix used for links when no script name is supplied (CLI and static export).
    pub mount_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            previews_root: PathBuf::from(DEFAULT_PREVIEWS_ROOT),
            preview_glob: DEFAULT_PREVIEW_GLOB.to_string(),
            templates_dir: None,
            reload_on_request: true,
            default_format: DEFAULT_FORMAT.to_string(),
            mount_prefix: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_value("MAIL_PREVIEW_ROOT")
            && !v.trim().is_empty()
        {
            config.previews_root = PathBuf::from(v.trim());
        }
        if let Some(v) = env_value("MAIL_PREVIEW_GLOB")
            && !v.trim().is_empty()
        {
            config.preview_glob = v.trim().to_string();
        }
        config.templates_dir = env_value("MAIL_PREVIEW_TEMPLATES_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        config.reload_on_request = env_bool("MAIL_PREVIEW_RELOAD", config.reload_on_request);
        if let Some(v) = env_value("MAIL_PREVIEW_DEFAULT_FORMAT") {
            let format = v.trim().trim_start_matches('.').to_ascii_lowercase();
            if !format.is_empty() {
                config.default_format = format;
            }
        }
        if let Some(v) = env_value("MAIL_PREVIEW_MOUNT_PREFIX") {
            config.mount_prefix = normalize_mount_prefix(&v);
        }

        config
    }
}

/// Normalize a mount prefix: leading slash, no trailing slash, `""` for root.
#[must_use]
pub fn normalize_mount_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

static DOTENV_VALUES: OnceLock<HashMap<String, String>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_ENV_OVERRIDES: std::cell::RefCell<HashMap<String, String>> =
        std::cell::RefCell::new(HashMap::new());
}

#[cfg(test)]
fn test_env_override_value(key: &str) -> Option<String> {
    TEST_ENV_OVERRIDES.with(|cell| cell.borrow().get(key).cloned())
}

fn dotenv_values() -> &'static HashMap<String, String> {
    DOTENV_VALUES.get_or_init(|| load_dotenv_file(Path::new(".env")))
}

/// Read a value from the real environment first, falling back to .env.
#[must_use]
pub fn env_value(key: &str) -> Option<String> {
    #[cfg(test)]
    if let Some(v) = test_env_override_value(key) {
        return Some(v);
    }
    env::var(key).ok().or_else(|| dotenv_values().get(key).cloned())
}

fn load_dotenv_file(path: &Path) -> HashMap<String, String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    let values = parse_dotenv_contents(&contents);
    tracing::debug!(path = %path.display(), keys = values.len(), "loaded .env file");
    values
}

/// Parse `KEY=value` lines, skipping comments and blank lines.
///
/// Accepts an optional `export ` prefix and strips one layer of matching quotes.
#[must_use]
pub fn parse_dotenv_contents(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    map
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => true,
        "0" | "false" | "f" | "no" | "n" => false,
        _ => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env_value(key).map_or(default, |v| parse_bool(&v, default))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestEnvOverrideGuard {
        previous: Vec<(String, Option<String>)>,
    }

    impl TestEnvOverrideGuard {
        fn set(vars: &[(&str, &str)]) -> Self {
            let mut previous = Vec::new();
            TEST_ENV_OVERRIDES.with(|cell| {
                let mut map = cell.borrow_mut();
                for (key, value) in vars {
                    let old = map.get(*key).cloned();
                    previous.push(((*key).to_string(), old));
                    map.insert((*key).to_string(), (*value).to_string());
                }
            });
            Self { previous }
        }
    }

    impl Drop for TestEnvOverrideGuard {
        fn drop(&mut self) {
            TEST_ENV_OVERRIDES.with(|cell| {
                let mut map = cell.borrow_mut();
                for (key, value) in self.previous.drain(..) {
                    match value {
                        Some(v) => {
                            map.insert(key, v);
                        }
                        None => {
                            map.remove(&key);
                        }
                    }
                }
            });
        }
    }

    #[test]
    fn defaults_match_rails_layout() {
        let config = Config::default();
        assert_eq!(config.previews_root, PathBuf::from("app/mailers"));
        assert_eq!(config.preview_glob, "**/*.json5");
        assert!(config.templates_dir.is_none());
        assert!(config.reload_on_request);
        assert_eq!(config.default_format, "html");
        assert_eq!(config.mount_prefix, "");
    }

    #[test]
    fn from_env_reads_overrides() {
        let _guard = TestEnvOverrideGuard::set(&[
            ("MAIL_PREVIEW_ROOT", "previews"),
            ("MAIL_PREVIEW_GLOB", "*.preview.json5"),
            ("MAIL_PREVIEW_TEMPLATES_DIR", "tpl"),
            ("MAIL_PREVIEW_RELOAD", "no"),
            ("MAIL_PREVIEW_DEFAULT_FORMAT", ".TXT"),
            ("MAIL_PREVIEW_MOUNT_PREFIX", "rails/mail_view/"),
        ]);
        let config = Config::from_env();
        assert_eq!(config.previews_root, PathBuf::from("previews"));
        assert_eq!(config.preview_glob, "*.preview.json5");
        assert_eq!(config.templates_dir, Some(PathBuf::from("tpl")));
        assert!(!config.reload_on_request);
        assert_eq!(config.default_format, "txt");
        assert_eq!(config.mount_prefix, "/rails/mail_view");
    }

    #[test]
    fn blank_values_keep_defaults() {
        let _guard = TestEnvOverrideGuard::set(&[
            ("MAIL_PREVIEW_ROOT", "  "),
            ("MAIL_PREVIEW_TEMPLATES_DIR", ""),
            ("MAIL_PREVIEW_RELOAD", "maybe"),
            ("MAIL_PREVIEW_DEFAULT_FORMAT", ""),
        ]);
        let config = Config::from_env();
        assert_eq!(config.previews_root, PathBuf::from(DEFAULT_PREVIEWS_ROOT));
        assert!(config.templates_dir.is_none());
        assert!(config.reload_on_request);
        assert_eq!(config.default_format, DEFAULT_FORMAT);
    }

    #[test]
    fn normalize_mount_prefix_variants() {
        assert_eq!(normalize_mount_prefix(""), "");
        assert_eq!(normalize_mount_prefix("/"), "");
        assert_eq!(normalize_mount_prefix("mail_view"), "/mail_view");
        assert_eq!(normalize_mount_prefix("/mail_view/"), "/mail_view");
        assert_eq!(normalize_mount_prefix(" /a/b "), "/a/b");
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for v in ["1", "true", "T", "yes", "Y"] {
            assert!(parse_bool(v, false), "{v}");
        }
        for v in ["0", "false", "f", "NO", "n"] {
            assert!(!parse_bool(v, true), "{v}");
        }
        assert!(parse_bool("garbage", true));
    }

    #[test]
    fn dotenv_parsing_handles_comments_exports_and_quotes() {
        let map = parse_dotenv_contents(
            "# comment\n\nexport MAIL_PREVIEW_ROOT=\"spec/mailers\"\nMAIL_PREVIEW_GLOB='*.json5'\nbogus\n=novalue\n",
        );
        assert_eq!(map.get("MAIL_PREVIEW_ROOT").map(String::as_str), Some("spec/mailers"));
        assert_eq!(map.get("MAIL_PREVIEW_GLOB").map(String::as_str), Some("*.json5"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn debug_lists_every_field() {
        let rendered = format!("{:?}", Config::default());
        assert!(rendered.contains("previews_root"));
        assert!(rendered.contains("mount_prefix"));
    }
}
