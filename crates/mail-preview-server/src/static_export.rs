//! Static HTML export of every preview.
//!
//! Invokes each action once, renders its default page and one page per
//! alternative format from that message, and writes the pages into a
//! directory tree that mirrors the preview URLs:
//!
//! - `/` → `index.html`
//! - `/<slug>/<action>` → `<slug>/<action>.html`
//! - `/<slug>/<action>.<ext>` → `<slug>/<action>.<ext>.html`
//!
//! A `manifest.json` with SHA-256 hashes of every written file is emitted last.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mail_preview_core::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::handler::{MailPreview, PreviewRequest};
use crate::response::PreviewResponse;
use crate::selector::alternatives;

pub const MANIFEST_FILE: &str = "manifest.json";
const SCHEMA_VERSION: &str = "1.0.0";

/// Configuration for a static export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output directory for generated files.
    pub output_dir: PathBuf,
    /// Prefix for links inside the exported pages (`""` for the site root).
    pub mount_prefix: String,
}

/// Manifest entry for a generated file.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    /// The preview URL this file corresponds to.
    pub route: String,
    /// File size in bytes.
    pub size: u64,
    /// SHA-256 hex digest.
    pub sha256: String,
}

/// Result manifest for the export run.
#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub schema_version: String,
    pub generated_at: String,
    pub file_count: usize,
    pub total_bytes: u64,
    /// SHA-256 over every file path and hash, in path order.
    pub content_hash: String,
    /// Routes that could not be rendered.
    pub skipped: Vec<String>,
    /// Map from relative file path to manifest entry.
    pub files: BTreeMap<String, ManifestEntry>,
}

/// Export every registered preview of `preview` into `config.output_dir`.
///
/// Actions that fail to render are logged and listed in
/// [`ExportManifest::skipped`]; I/O failures abort the export.
pub fn export_static_site(preview: &MailPreview, config: &ExportConfig) -> Result<ExportManifest> {
    fs::create_dir_all(&config.output_dir)?;
    preview.load_viewers();

    let mut files = BTreeMap::new();
    let mut skipped = Vec::new();

    let index_request = PreviewRequest::get("/").with_script_name(config.mount_prefix.clone());
    let index = preview.call(&index_request);
    emit_page(config, "/", "index.html", index, &mut files, &mut skipped)?;

    for viewer in preview.registry().all_viewers() {
        for action in viewer.actions() {
            let route = format!("/{}/{action}", viewer.slug());
            // One invocation feeds the default page and every alternative.
            let message = match viewer.invoke(action) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(route = %route, error = %e, "skipping route");
                    skipped.push(route);
                    continue;
                }
            };

            let rendered = preview.render_message(
                &viewer,
                action,
                preview.default_format(),
                &message,
                &config.mount_prefix,
            );
            let file_path = format!("{}/{action}.html", viewer.slug());
            emit_page(config, &route, &file_path, rendered, &mut files, &mut skipped)?;

            for alt in alternatives(&message, &message) {
                let rendered = preview.render_message(
                    &viewer,
                    action,
                    &alt.format,
                    &message,
                    &config.mount_prefix,
                );
                emit_page(
                    config,
                    &format!("{route}.{}", alt.format),
                    &format!("{}/{action}.{}.html", viewer.slug(), alt.format),
                    rendered,
                    &mut files,
                    &mut skipped,
                )?;
            }
        }
    }

    let total_bytes = files.values().map(|e| e.size).sum();
    let content_hash = compute_content_hash(&files);

    let manifest = ExportManifest {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        file_count: files.len(),
        total_bytes,
        content_hash,
        skipped,
        files,
    };

    let manifest_json = serde_json::to_string_pretty(&manifest)?;
    write_to_file(&config.output_dir.join(MANIFEST_FILE), manifest_json.as_bytes())?;

    tracing::info!(
        output = %config.output_dir.display(),
        files = manifest.file_count,
        skipped = manifest.skipped.len(),
        "static export complete"
    );
    Ok(manifest)
}

/// Write one rendered page.
///
/// Rendering failures are recorded in `skipped`; write failures are returned.
fn emit_page(
    config: &ExportConfig,
    route: &str,
    file_path: &str,
    rendered: Result<PreviewResponse>,
    files: &mut BTreeMap<String, ManifestEntry>,
    skipped: &mut Vec<String>,
) -> Result<()> {
    match rendered {
        Ok(response) if response.status == 200 => {
            write_and_record(&config.output_dir, file_path, &response.body, route, files)
        }
        Ok(response) => {
            tracing::warn!(route, status = response.status, "skipping route");
            skipped.push(route.to_string());
            Ok(())
        }
        Err(Error::Io(e)) => Err(Error::Io(e)),
        Err(e) => {
            tracing::warn!(route, error = %e, "skipping route");
            skipped.push(route.to_string());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O helpers
// ---------------------------------------------------------------------------

fn write_to_file(dest: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, data)?;
    Ok(())
}

fn write_and_record(
    output_dir: &Path,
    file_path: &str,
    data: &[u8],
    route: &str,
    files: &mut BTreeMap<String, ManifestEntry>,
) -> Result<()> {
    write_to_file(&output_dir.join(file_path), data)?;
    files.insert(
        file_path.to_string(),
        ManifestEntry {
            route: route.to_string(),
            size: data.len() as u64,
            sha256: sha256_hex(data),
        },
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Deterministic hash over every `path:sha256` pair in path order.
fn compute_content_hash(files: &BTreeMap<String, ManifestEntry>) -> String {
    let mut hasher = Sha256::new();
    for (path, entry) in files {
        hasher.update(path.as_bytes());
        hasher.update(b":");
        hasher.update(entry.sha256.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
