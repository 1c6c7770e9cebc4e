//! Token callbacks: the closed set of handler kinds behind one call signature.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::builtins;
use crate::context::RequestContext;
use crate::parser::TokenParams;

/// Failure reported by a token callback.
///
/// Never escapes a substitution pass; it is recorded as a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Host-provided token handler.
///
/// Implemented for every `Fn(&str, &TokenParams, &RequestContext) -> Result<String, CallbackError>`
/// that is `Send + Sync`, so closures and plain functions can be registered directly.
pub trait TokenCallback: Send + Sync {
    fn call(
        &self,
        name: &str,
        params: &TokenParams,
        context: &RequestContext,
    ) -> Result<String, CallbackError>;
}

impl<F> TokenCallback for F
where
    F: Fn(&str, &TokenParams, &RequestContext) -> Result<String, CallbackError> + Send + Sync,
{
    fn call(
        &self,
        name: &str,
        params: &TokenParams,
        context: &RequestContext,
    ) -> Result<String, CallbackError> {
        self(name, params, context)
    }
}

/// Kind of a [`Callback`], for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackKind {
    Handler,
    Static,
    Builtin,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackKind::Handler => f.write_str("handler"),
            CallbackKind::Static => f.write_str("static"),
            CallbackKind::Builtin => f.write_str("builtin"),
        }
    }
}

/// The callback attached to a token definition.
#[derive(Clone)]
pub enum Callback {
    /// Host code
    Handler(Arc<dyn TokenCallback>),
    /// Constant replacement text
    Static(String),
    /// Reference to a built-in callback by name
    Builtin(String),
}

impl Callback {
    /// Wrap a closure or function as a handler.
    ///
    /// Types implementing [`TokenCallback`] by hand go through `Callback::Handler(Arc::new(..))`.
    pub fn handler<F>(callback: F) -> Self
    where
        F: Fn(&str, &TokenParams, &RequestContext) -> Result<String, CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Callback::Handler(Arc::new(callback))
    }

    pub fn kind(&self) -> CallbackKind {
        match self {
            Callback::Handler(_) => CallbackKind::Handler,
            Callback::Static(_) => CallbackKind::Static,
            Callback::Builtin(_) => CallbackKind::Builtin,
        }
    }

    /// Whether the callback can be invoked.
    ///
    /// Handlers and static text always can; a builtin reference only when the
    /// name resolves to a known builtin.
    pub fn is_invocable(&self) -> bool {
        match self {
            Callback::Handler(_) | Callback::Static(_) => true,
            Callback::Builtin(name) => builtins::lookup(name).is_some(),
        }
    }

    /// Short description of what the callback points at (static text or builtin name)
    pub fn target(&self) -> Option<&str> {
        match self {
            Callback::Handler(_) => None,
            Callback::Static(text) => Some(text),
            Callback::Builtin(name) => Some(name),
        }
    }

    pub fn invoke(
        &self,
        name: &str,
        params: &TokenParams,
        context: &RequestContext,
    ) -> Result<String, CallbackError> {
        match self {
            Callback::Handler(handler) => handler.call(name, params, context),
            Callback::Static(text) => Ok(text.clone()),
            Callback::Builtin(builtin) => match builtins::lookup(builtin) {
                Some(f) => f(name, params, context),
                None => Err(CallbackError::new(format!("unknown builtin '{}'", builtin))),
            },
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Handler(_) => f.write_str("Handler(..)"),
            Callback::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Callback::Builtin(name) => f.debug_tuple("Builtin").field(name).finish(),
        }
    }
}
