//! Token replacements facade
//!
//! [`TokenReplacements`] is what a host keeps around for the lifetime of the
//! process: it owns the validated delimiters, shares the token registry, and
//! exposes the three entry points the host needs:
//!
//! - [`TokenReplacements::replace_tokens`] for manual replacement
//! - [`PostRenderHook::after_render`] for the automatic render hook
//! - [`TokenReplacements::token_list`] for admin diagnostics
//!
//! Invalid delimiter configuration fails closed: the facade is still built,
//! automatic replacement is switched off, manual replacement returns its
//! input unchanged, and the problems are kept for display.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ConfigValidationError, CtrConfig};
use crate::context::RequestContext;
use crate::delimiters::DelimiterConfig;
use crate::engine::{SubstitutionResult, Substitutor};
use crate::hook::{HookSettings, PostRenderHook, RenderHook};
use crate::parser::{format_token, TokenParams};
use crate::registry::{RegistrationWarning, TokenInfo, TokenRegistry};

#[derive(Debug, Clone)]
pub struct TokenReplacements {
    registry: Arc<TokenRegistry>,
    /// `None` when the configured delimiters are invalid
    hook: Option<RenderHook>,
    config_problems: Vec<ConfigValidationError>,
    registration_warnings: Vec<RegistrationWarning>,
}

impl TokenReplacements {
    /// Build from already validated delimiters.
    pub fn new(
        delimiters: DelimiterConfig,
        settings: HookSettings,
        registry: Arc<TokenRegistry>,
    ) -> Self {
        let engine = Substitutor::new(Arc::new(delimiters), Arc::clone(&registry));
        Self {
            registry,
            hook: Some(RenderHook::new(settings, engine)),
            config_problems: Vec::new(),
            registration_warnings: Vec::new(),
        }
    }

    /// Build from a loaded configuration.
    ///
    /// Tokens declared in the config are registered leniently into `registry`
    /// so broken declarations still appear in the token list.
    pub fn from_config(config: &CtrConfig, registry: Arc<TokenRegistry>) -> Self {
        let registration_warnings: Vec<RegistrationWarning> = config
            .token_definitions()
            .into_iter()
            .flat_map(|def| registry.register_lenient(def))
            .collect();
        for warning in &registration_warnings {
            warn!("{}", warning.message);
        }

        let config_problems = config.validate();

        let hook = match config.delimiters.build() {
            Ok(delimiters) => {
                let engine = Substitutor::new(Arc::new(delimiters), Arc::clone(&registry));
                Some(RenderHook::new(config.hook_settings(), engine))
            }
            Err(err) => {
                warn!(error = %err, "invalid delimiter configuration, token replacement disabled");
                None
            }
        };

        info!(
            tokens = registry.len(),
            enabled = hook.is_some(),
            automatic = hook.as_ref().map(|h| h.settings().automatic).unwrap_or(false),
            "token replacements initialised"
        );

        Self { registry, hook, config_problems, registration_warnings }
    }

    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    /// The engine, unless configuration failed closed
    pub fn engine(&self) -> Option<&Substitutor> {
        self.hook.as_ref().map(RenderHook::engine)
    }

    /// Whether replacement can run at all
    pub fn is_operational(&self) -> bool {
        self.hook.is_some()
    }

    /// Effective hook settings; automatic mode is off when configuration failed closed
    pub fn settings(&self) -> HookSettings {
        self.hook.as_ref().map(RenderHook::settings).unwrap_or_else(HookSettings::disabled)
    }

    /// Validation problems found in the configuration
    pub fn config_problems(&self) -> &[ConfigValidationError] {
        &self.config_problems
    }

    /// Warnings from registering config-declared tokens
    pub fn registration_warnings(&self) -> &[RegistrationWarning] {
        &self.registration_warnings
    }

    /// Run a substitution pass with diagnostics.
    pub fn substitute(&self, text: &str, context: &RequestContext) -> SubstitutionResult {
        match self.engine() {
            Some(engine) => engine.substitute(text, context),
            None => SubstitutionResult { text: text.to_string(), diagnostics: Vec::new() },
        }
    }

    /// Manual replacement, independent of the automatic-mode settings.
    pub fn replace_tokens(&self, text: &str, context: &RequestContext) -> String {
        self.substitute(text, context).text
    }

    /// Registered tokens with their validity
    pub fn token_list(&self) -> Vec<TokenInfo> {
        self.registry.list()
    }

    /// Example token text for `name` using the configured delimiters
    pub fn example_token(&self, name: &str, params: &TokenParams) -> Option<String> {
        self.engine().map(|engine| format_token(name, params, engine.delimiters()))
    }
}

impl PostRenderHook for TokenReplacements {
    fn after_render(&self, output: String, context: &RequestContext) -> String {
        match &self.hook {
            Some(hook) => hook.after_render(output, context),
            None => output,
        }
    }
}
