//! Discovery of preview definition files.
//!
//! Walks the previews root (default `app/mailers`), loads every file matching
//! the preview glob, and registers the viewer it defines. A definition file is
//! JSON5:
//!
//! ```json5
//! {
//!   // optional; derived from the file path when absent
//!   name: "Admin::WelcomeMailer",
//!   actions: {
//!     welcome: { subject: "Welcome", content_type: "text/plain", body: "Hi!" },
//!   },
//! }
//! ```
//!
//! A broken file never takes down discovery: its failure is logged, recorded in
//! the [`LoadReport`], and the remaining files are still loaded.

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::{GlobBuilder, GlobMatcher};
use indexmap::IndexMap;
use mail_preview_core::{Config, Error, Message, Result};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::registry::{ViewerRegistry, ViewerType};

/// On-disk shape of a preview definition.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PreviewDefinition {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    actions: IndexMap<String, Message>,
}

/// A definition file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Definition files matched by the glob.
    pub scanned: usize,
    /// Identities newly inserted into the registry by this pass.
    pub registered: Vec<String>,
    /// Files whose viewer was already registered.
    pub already_registered: usize,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Finds preview definition files and registers their viewers.
#[derive(Debug)]
pub struct ViewerLoader {
    root: PathBuf,
    glob: GlobMatcher,
    reload_on_request: bool,
    first_pass: OnceLock<LoadReport>,
}

impl ViewerLoader {
    /// Loader over `root`, selecting files whose root-relative path matches `pattern`.
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                Error::InvalidDefinition(format!("invalid preview glob {pattern:?}: {e}"))
            })?
            .compile_matcher();
        Ok(Self {
            root: root.into(),
            glob,
            reload_on_request: true,
            first_pass: OnceLock::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(&config.previews_root, &config.preview_glob)?
            .with_reload_on_request(config.reload_on_request))
    }

    /// When disabled, only the first [`ensure_loaded`](Self::ensure_loaded) call scans.
    #[must_use]
    pub fn with_reload_on_request(mut self, reload: bool) -> Self {
        self.reload_on_request = reload;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure every discoverable viewer is registered.
    ///
    /// Safe to call on every request: registration is insert-if-absent, so
    /// repeated passes never duplicate viewers.
    pub fn ensure_loaded(&self, registry: &ViewerRegistry) -> LoadReport {
        if self.reload_on_request {
            return self.scan(registry);
        }
        self.first_pass.get_or_init(|| self.scan(registry)).clone()
    }

    /// Matching definition files under the root, sorted by path.
    ///
    /// Directory entries that cannot be read are reported as failures.
    pub fn discover(&self) -> (Vec<PathBuf>, Vec<LoadFailure>) {
        let mut files = Vec::new();
        let mut failures = Vec::new();
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "previews root does not exist");
            return (files, failures);
        }

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    failures.push(LoadFailure {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if self.glob.is_match(relative) {
                files.push(entry.into_path());
            }
        }
        (files, failures)
    }

    /// Load one definition file into a viewer without registering it.
    pub fn load_file(&self, path: &Path) -> Result<ViewerType> {
        let wrap = |e: Error| Error::PreviewLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let contents = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
        let definition: PreviewDefinition =
            json5::from_str(&contents).map_err(|e| wrap(e.into()))?;

        let name = match definition.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.name_from_path(path).map_err(wrap)?,
        };
        let mut builder = ViewerType::builder(name);
        for (action, message) in definition.actions {
            builder = builder.fixture(action, message);
        }
        builder.build().map_err(wrap)
    }

    /// Viewer name implied by a file's location: `admin/welcome_mailer.json5`
    /// under the root becomes `admin/welcome_mailer`.
    ///
    /// A file name with nothing before its first dot (`.json5`) names nothing.
    fn name_from_path(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let mut segments: Vec<String> = relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let file_name = relative
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default();
        if stem.is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "file name {file_name:?} has no stem to name the viewer after"
            )));
        }
        segments.push(stem.to_string());
        segments.retain(|s| !s.is_empty());
        Ok(segments.join("/"))
    }

    fn scan(&self, registry: &ViewerRegistry) -> LoadReport {
        let (files, failures) = self.discover();
        let mut report = LoadReport {
            scanned: files.len(),
            failures,
            ..LoadReport::default()
        };

        for path in files {
            match self.load_file(&path) {
                Ok(viewer) => {
                    let identity = viewer.identity().to_string();
                    if registry.register(viewer) {
                        report.registered.push(identity);
                    } else {
                        report.already_registered += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping preview definition that failed to load"
                    );
                    report.failures.push(LoadFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.registered.is_empty() {
            tracing::info!(
                registered = report.registered.len(),
                failures = report.failures.len(),
                root = %self.root.display(),
                "loaded preview viewers"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    const WELCOME: &str = r#"{
        actions: {
            welcome: { subject: "Welcome", body: "Hi!" },
            reminder: { content_type: "text/html", body: "<p>Reminder</p>" },
        },
    }"#;

    #[test]
    fn name_is_derived_from_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "admin/welcome_mailer.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let viewer = loader.load_file(&path).unwrap();
        assert_eq!(viewer.identity(), "Admin::WelcomeMailer");
        assert_eq!(viewer.slug(), "admin/welcome_mailer");
        assert_eq!(viewer.actions(), vec!["welcome", "reminder"]);
    }

    #[test]
    fn explicit_name_wins_over_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "whatever.json5",
            r#"{ name: "Comments::NotifyMailer", actions: { digest: { body: "hi" } } }"#,
        );
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let viewer = loader.load_file(&path).unwrap();
        assert_eq!(viewer.identity(), "Comments::NotifyMailer");
    }

    #[test]
    fn multi_dot_file_names_use_first_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "user_mailer.preview.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        assert_eq!(loader.load_file(&path).unwrap().identity(), "UserMailer");
    }

    #[test]
    fn dotfile_without_stem_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "admin/.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let err = loader.load_file(&path).unwrap_err();
        assert!(matches!(err, Error::PreviewLoad { .. }));
        assert!(err.to_string().contains("no stem"));

        let registry = ViewerRegistry::new();
        let report = loader.ensure_loaded(&registry);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("admin/.json5"));
        assert!(registry.is_empty());
        assert!(registry.get("Admin").is_none());
    }

    #[test]
    fn dotfile_with_explicit_name_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            ".json5",
            r#"{ name: "HiddenMailer", actions: { ping: { body: "pong" } } }"#,
        );
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        assert_eq!(loader.load_file(&path).unwrap().identity(), "HiddenMailer");
    }

    #[test]
    fn actions_return_fresh_clones() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "user_mailer.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let viewer = loader.load_file(&path).unwrap();
        let first = viewer.invoke("welcome").unwrap();
        let second = viewer.invoke("welcome").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.subject.as_deref(), Some("Welcome"));
    }

    #[test]
    fn ensure_loaded_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user_mailer.json5", WELCOME);
        write(dir.path(), "admin/welcome_mailer.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let registry = ViewerRegistry::new();

        let first = loader.ensure_loaded(&registry);
        assert_eq!(first.scanned, 2);
        assert_eq!(first.registered.len(), 2);
        let count = registry.len();

        let second = loader.ensure_loaded(&registry);
        assert!(second.registered.is_empty());
        assert_eq!(second.already_registered, 2);
        assert_eq!(registry.len(), count);
    }

    #[test]
    fn duplicate_definitions_register_once() {
        let dir = tempfile::tempdir().unwrap();
        let def = r#"{ name: "Shared", actions: { a: { body: "1" } } }"#;
        write(dir.path(), "one.json5", def);
        write(dir.path(), "two.json5", def);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let registry = ViewerRegistry::new();
        let report = loader.ensure_loaded(&registry);
        assert_eq!(report.registered, vec!["Shared".to_string()]);
        assert_eq!(report.already_registered, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn broken_files_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_broken.json5", "{ actions: { oops: ");
        write(dir.path(), "b_unknown_field.json5", r#"{ nmae: "Typo" }"#);
        write(dir.path(), "c_good.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        let registry = ViewerRegistry::new();

        let report = loader.ensure_loaded(&registry);
        assert_eq!(report.scanned, 3);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_clean());
        assert_eq!(report.registered, vec!["CGood".to_string()]);
        assert!(registry.get("CGood").is_some());
        assert!(report.failures[0].path.ends_with("a_broken.json5"));
    }

    #[test]
    fn glob_filters_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user_mailer.json5", WELCOME);
        write(dir.path(), "notes.txt", "not a preview");
        write(dir.path(), "nested/deep/order_mailer.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "*.json5").unwrap();
        let (files, failures) = loader.discover();
        assert!(failures.is_empty());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("user_mailer.json5"));

        let loader = ViewerLoader::new(dir.path(), "**/*.json5").unwrap();
        assert_eq!(loader.discover().0.len(), 2);
    }

    #[test]
    fn missing_root_yields_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ViewerLoader::new(dir.path().join("nope"), "**/*.json5").unwrap();
        let registry = ViewerRegistry::new();
        let report = loader.ensure_loaded(&registry);
        assert_eq!(report, LoadReport::default());
        assert!(registry.is_empty());
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = ViewerLoader::new("app/mailers", "[").unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition(_)));
    }

    #[test]
    fn without_reload_only_first_pass_scans() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user_mailer.json5", WELCOME);
        let loader = ViewerLoader::new(dir.path(), "**/*.json5")
            .unwrap()
            .with_reload_on_request(false);
        let registry = ViewerRegistry::new();
        let first = loader.ensure_loaded(&registry);
        assert_eq!(first.registered.len(), 1);

        write(dir.path(), "order_mailer.json5", WELCOME);
        let second = loader.ensure_loaded(&registry);
        assert_eq!(second, first);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_config_uses_root_and_glob() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user_mailer.json5", WELCOME);
        let config = Config {
            previews_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        let loader = ViewerLoader::from_config(&config).unwrap();
        assert_eq!(loader.root(), dir.path());
        assert_eq!(loader.discover().0.len(), 1);
    }
}
