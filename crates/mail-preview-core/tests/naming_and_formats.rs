//! Public-API checks for viewer naming, format lookup, and error mapping.

use mail_preview_core::{
    Config, Error, Message, canonical_identity, content_type_matches, extension_for_mime_type,
    identity_to_slug, mime_type_for_extension, slug_to_identity,
};

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

#[test]
fn nested_slug_maps_to_namespaced_identity() {
    let identity = slug_to_identity("comments/notify_mailer");
    assert_eq!(identity, "Comments::NotifyMailer");
    assert_eq!(identity_to_slug(&identity), "comments/notify_mailer");
}

#[test]
fn declared_names_canonicalize_consistently() {
    for name in ["Admin::WelcomeMailer", "admin/welcome_mailer", "Admin::Welcome_Mailer"] {
        assert_eq!(canonical_identity(name), "Admin::WelcomeMailer", "{name}");
    }
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

#[test]
fn format_extension_round_trip_for_common_parts() {
    for (ext, mime) in [("html", "text/html"), ("txt", "text/plain"), ("ics", "text/calendar")] {
        assert_eq!(mime_type_for_extension(ext), mime);
        assert_eq!(extension_for_mime_type(mime), Some(ext));
    }
    assert!(content_type_matches("text/plain; charset=UTF-8", "TEXT/PLAIN"));
    assert!(!content_type_matches("text/plain", "text/html"));
}

#[test]
fn parsed_message_selects_by_content_type() {
    let msg: Message = json5::from_str(
        r#"{ parts: [ { content_type: "text/plain", body: "a" }, { content_type: "text/html; charset=utf-8", body: "b" } ] }"#,
    )
    .unwrap();
    assert!(msg.is_multipart());
    let html = msg
        .parts()
        .iter()
        .find(|p| p.has_content_type(mime_type_for_extension("html")))
        .unwrap();
    assert_eq!(html.body, "b");
}

// ---------------------------------------------------------------------------
// Errors and config
// ---------------------------------------------------------------------------

#[test]
fn dispatch_misses_are_404s() {
    let errors = [
        Error::UnrecognizedPath("/x".into()),
        Error::UnknownViewer("Ghost".into()),
        Error::UnknownAction {
            viewer: "Ghost".into(),
            action: "boo".into(),
        },
    ];
    for err in &errors {
        assert_eq!(err.status(), 404, "{err}");
    }
    assert!(errors[0].is_pass_through());
    assert!(!errors[1].is_pass_through());
    assert!(!errors[2].is_pass_through());
}

#[test]
fn default_config_matches_conventional_layout() {
    let config = Config::default();
    assert_eq!(config.previews_root.to_str(), Some("app/mailers"));
    assert_eq!(config.preview_glob, "**/*.json5");
    assert_eq!(config.default_format, "html");
    assert!(config.reload_on_request);
    assert!(config.templates_dir.is_none());
}
