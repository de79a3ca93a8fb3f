//! Mail Preview - browse generated email messages during development
//!
//! Command-line front end for the preview handler: list the available
//! previews, render one to stdout, or export all of them as static HTML.

#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mail_preview_core::Config;
use mail_preview_core::config::normalize_mount_prefix;
use mail_preview_server::{
    ExportConfig, MailPreview, PreviewRequest, export_static_site, index_links,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mail-preview")]
#[command(version, about = "Preview generated email messages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding preview definition files (overrides MAIL_PREVIEW_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Directory with `index.html` / `email.html` overrides
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every preview link
    List,

    /// Render one preview path and print the response body
    Render {
        /// Path below the mount point, e.g. `/admin/welcome_mailer/welcome.txt`
        path: String,
    },

    /// Write every preview as static HTML plus a manifest
    Export {
        /// Output directory
        dir: PathBuf,

        /// Prefix for links inside the exported pages
        #[arg(long)]
        mount_prefix: Option<String>,
    },

    /// Show configuration
    Config,
}

/// Process exit codes.
const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_FOUND: i32 = 2;

fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(root) = &cli.root {
        config.previews_root.clone_from(root);
    }
    if let Some(dir) = &cli.templates {
        config.templates_dir = Some(dir.clone());
    }
    config
}

fn run(cli: &Cli, config: &Config, out: &mut impl Write) -> mail_preview_core::Result<i32> {
    match &cli.command {
        Commands::Config => {
            writeln!(out, "{config:#?}")?;
            Ok(EXIT_OK)
        }
        Commands::List => {
            let preview = MailPreview::from_config(config)?;
            preview.load_viewers();
            for link in index_links(preview.registry(), &config.mount_prefix) {
                writeln!(out, "{}\t{}", link.label, link.url)?;
            }
            Ok(EXIT_OK)
        }
        Commands::Render { path } => {
            let preview = MailPreview::from_config(config)?;
            let request = PreviewRequest::get(path.as_str())
                .with_script_name(config.mount_prefix.clone());
            let response = preview.call(&request)?;
            if response.status != 200 {
                tracing::error!(path = %path, status = response.status, "no preview at path");
                return Ok(EXIT_NOT_FOUND);
            }
            out.write_all(&response.body)?;
            Ok(EXIT_OK)
        }
        Commands::Export { dir, mount_prefix } => {
            let preview = MailPreview::from_config(config)?;
            let export = ExportConfig {
                output_dir: dir.clone(),
                mount_prefix: mount_prefix
                    .as_deref()
                    .map_or_else(|| config.mount_prefix.clone(), normalize_mount_prefix),
            };
            let manifest = export_static_site(&preview, &export)?;
            writeln!(
                out,
                "Exported {} files ({} bytes) to {}",
                manifest.file_count,
                manifest.total_bytes,
                dir.display()
            )?;
            for route in &manifest.skipped {
                writeln!(out, "skipped {route}")?;
            }
            Ok(if manifest.skipped.is_empty() {
                EXIT_OK
            } else {
                EXIT_FAILURE
            })
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = apply_overrides(&cli, Config::from_env());
    let mut stdout = io::stdout().lock();
    let code = match run(&cli, &config, &mut stdout) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, kind = e.error_type(), "mail-preview failed");
            eprintln!("Error: {e}");
            EXIT_FAILURE
        }
    };
    let _ = stdout.flush();
    std::process::exit(code);
}
