//! Render hook adapter
//!
//! The host calls [`PostRenderHook::after_render`] with the complete output
//! of a page render, *after* its template render cache has supplied or
//! stored the page markup. Because substitution happens on the way out of
//! the cache, a cached page and a freshly rendered one get exactly the same
//! treatment and per-request tokens never end up inside the cache.
//!
//! Policy, in order:
//! 1. automatic mode off: output untouched (manual replacement only)
//! 2. frontend-only on and the request targets the admin surface: untouched
//! 3. otherwise the whole output goes through the [`Substitutor`]

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::context::RequestContext;
use crate::engine::Substitutor;

/// Interface the host's render pipeline calls once per rendered page.
pub trait PostRenderHook: Send + Sync {
    fn after_render(&self, output: String, context: &RequestContext) -> String;
}

/// The two switches controlling automatic replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSettings {
    pub automatic: bool,
    pub frontend_only: bool,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self { automatic: true, frontend_only: true }
    }
}

impl HookSettings {
    /// Settings with automatic replacement switched off
    pub fn disabled() -> Self {
        Self { automatic: false, ..Self::default() }
    }

    /// Whether a render with `context` should be rewritten.
    pub fn applies_to(&self, context: &RequestContext) -> bool {
        self.automatic && !(self.frontend_only && context.is_admin())
    }
}

/// [`PostRenderHook`] that runs the substitution engine under [`HookSettings`].
#[derive(Debug, Clone)]
pub struct RenderHook {
    settings: HookSettings,
    engine: Substitutor,
}

impl RenderHook {
    pub fn new(settings: HookSettings, engine: Substitutor) -> Self {
        Self { settings, engine }
    }

    pub fn settings(&self) -> HookSettings {
        self.settings
    }

    pub fn engine(&self) -> &Substitutor {
        &self.engine
    }
}

impl PostRenderHook for RenderHook {
    fn after_render(&self, output: String, context: &RequestContext) -> String {
        if !self.settings.applies_to(context) {
            trace!(
                automatic = self.settings.automatic,
                admin = context.is_admin(),
                "render hook skipped"
            );
            return output;
        }
        debug!(path = ?context.path, bytes = output.len(), "replacing tokens in rendered output");

        self.engine.replace_tokens(&output, context)
    }
}
