//! Process-wide registry of preview viewers.
//!
//! A viewer groups related email previews under one identity
//! (`Admin::WelcomeMailer`). Each of its actions is declared explicitly when
//! the viewer is built and produces a fresh [`Message`] when invoked.
//!
//! Registration is insert-if-absent: discovery may run on every request, so
//! registering a known identity again is a no-op rather than an error.

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;
use mail_preview_core::{
    Error, Message, Result, canonical_identity, identity_to_slug, slug_to_identity,
};

/// A zero-argument action producing one message.
pub type ActionFn = dyn Fn() -> Result<Message> + Send + Sync;

/// A named group of preview actions.
#[derive(Clone)]
pub struct ViewerType {
    name: String,
    identity: String,
    slug: String,
    actions: IndexMap<String, Arc<ActionFn>>,
}

impl fmt::Debug for ViewerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerType")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("slug", &self.slug)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ViewerType {
    /// Start declaring a viewer. `name` may be in identity form
    /// (`Admin::WelcomeMailer`) or slug form (`admin/welcome_mailer`).
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ViewerTypeBuilder {
        ViewerTypeBuilder {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// The name the viewer was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical identity; the registry key.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// URL slug (`admin/welcome_mailer`).
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Declared action names, in declaration order.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    /// Invoke `action`, producing a fresh message.
    ///
    /// Failures inside the action propagate unchanged.
    pub fn invoke(&self, action: &str) -> Result<Message> {
        let Some(f) = self.actions.get(action) else {
            return Err(Error::UnknownAction {
                viewer: self.identity.clone(),
                action: action.to_string(),
            });
        };
        f()
    }
}

/// Builder returned by [`ViewerType::builder`].
pub struct ViewerTypeBuilder {
    name: String,
    actions: Vec<(String, Arc<ActionFn>)>,
}

impl ViewerTypeBuilder {
    /// Declare an action.
    #[must_use]
    pub fn action<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Message> + Send + Sync + 'static,
    {
        self.actions.push((name.into(), Arc::new(f)));
        self
    }

    /// Declare an action that always renders a clone of `message`.
    #[must_use]
    pub fn fixture(self, name: impl Into<String>, message: Message) -> Self {
        self.action(name, move || Ok(message.clone()))
    }

    /// Validate and finish the viewer.
    ///
    /// Action names must be non-empty word characters (`[A-Za-z0-9_]`) so
    /// they are addressable by a preview URL, and unique within the viewer.
    pub fn build(self) -> Result<ViewerType> {
        // The key must be exactly what the slug resolves back to, so both
        // come from the declared name and the key is derived from the slug.
        let slug = identity_to_slug(self.name.trim());
        let identity = slug_to_identity(&slug);
        if identity.is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "viewer name {:?} is empty",
                self.name
            )));
        }
        if !identity
            .split("::")
            .all(|segment| !segment.is_empty() && segment.chars().all(is_word_char))
        {
            return Err(Error::InvalidDefinition(format!(
                "viewer name {:?} contains characters not allowed in a preview path",
                self.name
            )));
        }

        let mut actions = IndexMap::with_capacity(self.actions.len());
        for (action, f) in self.actions {
            if action.is_empty() || !action.chars().all(is_word_char) {
                return Err(Error::InvalidDefinition(format!(
                    "action {action:?} on {identity} must be word characters only"
                )));
            }
            if actions.insert(action.clone(), f).is_some() {
                return Err(Error::InvalidDefinition(format!(
                    "action {action:?} declared twice on {identity}"
                )));
            }
        }

        Ok(ViewerType {
            slug,
            name: self.name,
            identity,
            actions,
        })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

static GLOBAL: LazyLock<Arc<ViewerRegistry>> = LazyLock::new(|| Arc::new(ViewerRegistry::new()));

/// Mapping from viewer identity to viewer, in registration order.
#[derive(Debug, Default)]
pub struct ViewerRegistry {
    viewers: RwLock<IndexMap<String, Arc<ViewerType>>>,
}

impl ViewerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Register `viewer` unless its identity is already known.
    ///
    /// Returns `true` when the viewer was inserted.
    pub fn register(&self, viewer: ViewerType) -> bool {
        let mut viewers = self
            .viewers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = viewers.get(viewer.identity()) {
            if existing.name != viewer.name {
                tracing::debug!(
                    identity = viewer.identity(),
                    kept = existing.name(),
                    ignored = viewer.name(),
                    "viewer name already registered under another spelling"
                );
            }
            return false;
        }
        tracing::debug!(
            identity = viewer.identity(),
            actions = viewer.actions.len(),
            "registered preview viewer"
        );
        viewers.insert(viewer.identity.clone(), Arc::new(viewer));
        true
    }

    /// Every registered viewer, in registration order.
    #[must_use]
    pub fn all_viewers(&self) -> Vec<Arc<ViewerType>> {
        self.viewers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Look a viewer up by identity. Non-canonical spellings
    /// (`HTMLMailer`, `admin/welcome_mailer`) are normalized first.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<Arc<ViewerType>> {
        let viewers = self.viewers.read().unwrap_or_else(PoisonError::into_inner);
        viewers
            .get(identity)
            .or_else(|| viewers.get(&canonical_identity(identity)))
            .cloned()
    }

    /// Declared actions of the viewer registered under `identity`.
    #[must_use]
    pub fn actions_of(&self, identity: &str) -> Option<Vec<String>> {
        self.get(identity)
            .map(|viewer| viewer.actions().into_iter().map(str::to_string).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.viewers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Register `viewer` in the process-wide registry.
pub fn register_viewer(viewer: ViewerType) -> bool {
    GLOBAL.register(viewer)
}
