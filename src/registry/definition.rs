//! Token definitions and the name pattern they must satisfy.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::callback::{Callback, CallbackKind};

/// Token names: ASCII letters, digits and underscore, at least one character.
pub const TOKEN_NAME_PATTERN: &str = r"^[A-Za-z0-9_]+$";

fn token_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_NAME_PATTERN).expect("token name pattern compiles"))
}

/// Check a token name against [`TOKEN_NAME_PATTERN`].
pub fn is_valid_token_name(name: &str) -> bool {
    token_name_regex().is_match(name)
}

/// A registered token: name, callback and optional description.
#[derive(Debug, Clone)]
pub struct TokenDefinition {
    pub name: String,
    pub callback: Callback,
    pub description: Option<String>,
}

impl TokenDefinition {
    pub fn new(name: impl Into<String>, callback: Callback) -> Self {
        Self { name: name.into(), callback, description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name_valid(&self) -> bool {
        is_valid_token_name(&self.name)
    }

    pub fn callback_valid(&self) -> bool {
        self.callback.is_invocable()
    }

    /// Summary used by the token list, computed without invoking the callback.
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            name: self.name.clone(),
            kind: self.callback.kind(),
            target: self.callback.target().map(str::to_string),
            description: self.description.clone(),
            name_valid: self.name_valid(),
            callback_valid: self.callback_valid(),
        }
    }
}

/// One row of the token list shown by admin tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub kind: CallbackKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name_valid: bool,
    pub callback_valid: bool,
}

impl TokenInfo {
    pub fn is_valid(&self) -> bool {
        self.name_valid && self.callback_valid
    }
}
