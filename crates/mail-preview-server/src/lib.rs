//! Mountable mail preview handler.
//!
//! Viewers are registered explicitly or discovered from JSON5 preview
//! definition files; [`MailPreview::call`] resolves a request path to one of
//! their actions and renders the resulting message as an HTML page.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mail_preview_core::Message;
//! use mail_preview_server::{MailPreview, PreviewRequest, ViewerRegistry, ViewerType};
//!
//! let registry = Arc::new(ViewerRegistry::new());
//! registry.register(
//!     ViewerType::builder("UserMailer")
//!         .fixture("welcome", Message::new("text/plain", "Welcome!"))
//!         .build()?,
//! );
//! let response = MailPreview::new(registry).call(&PreviewRequest::get("/user_mailer/welcome"))?;
//! assert_eq!(response.status, 200);
//! # Ok::<(), mail_preview_core::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod handler;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod response;
pub mod selector;
pub mod static_export;
pub mod templates;

pub use handler::{MailPreview, PreviewRequest};
pub use loader::{LoadFailure, LoadReport, ViewerLoader};
pub use registry::{ActionFn, ViewerRegistry, ViewerType, ViewerTypeBuilder, register_viewer};
pub use resolver::{Resolution, ResolvedRequest, resolve, resolve_request};
pub use response::{Link, PreviewResponse, build_not_found, index_links};
pub use selector::{Alternative, alternatives, select_body_part};
pub use static_export::{ExportConfig, ExportManifest, export_static_site};
pub use templates::Templates;
