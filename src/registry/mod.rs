//! Token registry.
//!
//! This module provides:
//! - `TokenRegistry`, the process-wide name -> definition map
//! - `TokenDefinition` and the token name pattern
//! - `Callback`, the closed set of handler kinds behind one call signature
//!
//! Registration comes in two flavours, mirroring strict and lenient modes
//! elsewhere in the crate: [`TokenRegistry::register`] rejects invalid
//! definitions, [`TokenRegistry::register_lenient`] stores them and returns
//! warnings so they still show up in the token list.
//!
//! Registering a name twice replaces the earlier definition.

mod callback;
mod definition;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

pub use callback::{Callback, CallbackError, CallbackKind, TokenCallback};
pub use definition::{is_valid_token_name, TokenDefinition, TokenInfo, TOKEN_NAME_PATTERN};

/// Registration rejected in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Name does not match the token name pattern
    #[error("invalid token name '{0}' (expected letters, digits and underscores)")]
    InvalidName(String),
    /// Callback cannot be invoked
    #[error("token '{name}' has an invalid callback: {reason}")]
    InvalidCallback { name: String, reason: String },
}

/// Warning produced by lenient registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationWarning {
    pub message: String,
}

impl From<RegistryError> for RegistrationWarning {
    fn from(err: RegistryError) -> Self {
        Self { message: err.to_string() }
    }
}

/// Process-wide token registry.
///
/// Shared by reference (usually behind an `Arc`) between request handlers.
/// Lookups hand out `Arc` snapshots, so a registration running concurrently
/// with a lookup never exposes a partially written entry.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, Arc<TokenDefinition>>>,
}

impl TokenRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Both validation predicates, as an error for the first one that fails.
    pub fn validate(definition: &TokenDefinition) -> Result<(), RegistryError> {
        if !definition.name_valid() {
            return Err(RegistryError::InvalidName(definition.name.clone()));
        }
        if !definition.callback_valid() {
            let reason = match &definition.callback {
                Callback::Builtin(builtin) => format!("unknown builtin '{}'", builtin),
                _ => "not invocable".to_string(),
            };
            return Err(RegistryError::InvalidCallback { name: definition.name.clone(), reason });
        }
        Ok(())
    }

    /// Register a token, rejecting invalid definitions.
    ///
    /// An existing definition with the same name is replaced.
    pub fn register(&self, definition: TokenDefinition) -> Result<(), RegistryError> {
        Self::validate(&definition)?;
        self.insert(definition);
        Ok(())
    }

    /// Register a token even if it fails validation.
    ///
    /// Invalid entries are kept for display and skipped during substitution.
    pub fn register_lenient(&self, definition: TokenDefinition) -> Vec<RegistrationWarning> {
        let warnings = match Self::validate(&definition) {
            Ok(()) => Vec::new(),
            Err(err) => vec![RegistrationWarning::from(err)],
        };
        self.insert(definition);
        warnings
    }

    fn insert(&self, definition: TokenDefinition) {
        let name = definition.name.clone();
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        if tokens.insert(name.clone(), Arc::new(definition)).is_some() {
            debug!(token = %name, "replaced existing token definition");
        } else {
            debug!(token = %name, "registered token");
        }
    }

    /// Look up a token by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<TokenDefinition>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Remove a token, returning its definition.
    pub fn unregister(&self, name: &str) -> Option<Arc<TokenDefinition>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner).remove(name)
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.tokens.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect();
        names.sort();
        names
    }

    /// All current entries with their validity, sorted by name.
    pub fn list(&self) -> Vec<TokenInfo> {
        let mut infos: Vec<TokenInfo> = self
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|def| def.info())
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}
