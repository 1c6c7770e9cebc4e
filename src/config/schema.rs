//! Configuration schema types for `ctr.toml`
//!
//! Defines the structure and validation rules for token replacement configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::builtins;
use crate::delimiters::{
    DelimiterConfig, DelimiterError, DelimiterRole, DEFAULT_DELIMITER_END, DEFAULT_DELIMITER_START,
    DEFAULT_KEY_VALUE_SEPARATOR, DEFAULT_MULTIVALUE_SEPARATOR, DEFAULT_PARAM_SEPARATOR,
};
use crate::hook::HookSettings;
use crate::registry::{is_valid_token_name, Callback, TokenDefinition};

/// Validation severity level for config issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Config cannot be loaded
    Error,
    /// Config loads, the affected feature is disabled or skipped
    Warn,
}

impl Default for ValidationLevel {
    fn default() -> Self {
        Self::Warn
    }
}

/// `[replacements]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementsConfig {
    /// Replace tokens automatically after each page render
    #[serde(default = "default_true")]
    pub automatic_mode_enabled: bool,
    /// Only replace automatically on frontend requests
    #[serde(default = "default_true")]
    pub frontend_only_mode: bool,
}

impl Default for ReplacementsConfig {
    fn default() -> Self {
        Self { automatic_mode_enabled: true, frontend_only_mode: true }
    }
}

fn default_true() -> bool {
    true
}

/// `[delimiters]` section, unvalidated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelimitersConfig {
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_end")]
    pub end: String,
    #[serde(default = "default_param_separator")]
    pub param_separator: String,
    #[serde(default = "default_key_value_separator")]
    pub key_value_separator: String,
    #[serde(default = "default_multivalue_separator")]
    pub multivalue_separator: String,
}

fn default_start() -> String {
    DEFAULT_DELIMITER_START.to_string()
}

fn default_end() -> String {
    DEFAULT_DELIMITER_END.to_string()
}

fn default_param_separator() -> String {
    DEFAULT_PARAM_SEPARATOR.to_string()
}

fn default_key_value_separator() -> String {
    DEFAULT_KEY_VALUE_SEPARATOR.to_string()
}

fn default_multivalue_separator() -> String {
    DEFAULT_MULTIVALUE_SEPARATOR.to_string()
}

impl Default for DelimitersConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            param_separator: default_param_separator(),
            key_value_separator: default_key_value_separator(),
            multivalue_separator: default_multivalue_separator(),
        }
    }
}

impl DelimitersConfig {
    fn values(&self) -> [&str; 5] {
        [
            self.start.as_str(),
            self.end.as_str(),
            self.param_separator.as_str(),
            self.key_value_separator.as_str(),
            self.multivalue_separator.as_str(),
        ]
    }

    /// Every problem with these delimiters
    pub fn errors(&self) -> Vec<DelimiterError> {
        DelimiterConfig::check(self.values())
    }

    /// Build the validated delimiter configuration
    pub fn build(&self) -> Result<DelimiterConfig, DelimiterError> {
        let [start, end, param, key_value, multi] = self.values();
        DelimiterConfig::new(start, end, param, key_value, multi)
    }
}

/// One `[tokens.<name>]` table. Exactly one of `static` / `builtin` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Constant replacement text
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub static_text: Option<String>,
    /// Name of a built-in callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TokenConfig {
    /// The callback described by this table, if it names exactly one
    pub fn callback(&self) -> Option<Callback> {
        match (&self.static_text, &self.builtin) {
            (Some(text), None) => Some(Callback::Static(text.clone())),
            (None, Some(name)) => Some(Callback::Builtin(name.clone())),
            _ => None,
        }
    }
}

/// Complete `ctr.toml` configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtrConfig {
    #[serde(default)]
    pub replacements: ReplacementsConfig,
    #[serde(default)]
    pub delimiters: DelimitersConfig,
    /// Token name -> token table
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenConfig>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "delimiters.start")
    pub field: String,
    /// Error message
    pub message: String,
    pub level: ValidationLevel,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctr.toml: '{}' {}", self.field, self.message)
    }
}

impl From<DelimiterError> for ConfigValidationError {
    fn from(err: DelimiterError) -> Self {
        Self {
            field: format!("delimiters.{}", err.role().field_name()),
            message: err.to_string(),
            level: ValidationLevel::Warn,
        }
    }
}

impl CtrConfig {
    /// Validate the configuration and return any errors
    ///
    /// Delimiter problems and unusable tokens are warnings: the config still
    /// loads, with automatic replacement disabled or the token skipped.
    /// Token tables that do not name exactly one callback are errors.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors: Vec<ConfigValidationError> =
            self.delimiters.errors().into_iter().map(ConfigValidationError::from).collect();

        for (name, token) in &self.tokens {
            let field = format!("tokens.{}", name);

            if !is_valid_token_name(name) {
                errors.push(ConfigValidationError {
                    field: field.clone(),
                    message: "name must contain only letters, digits and underscores".to_string(),
                    level: ValidationLevel::Warn,
                });
            }

            match (&token.static_text, &token.builtin) {
                (None, None) => errors.push(ConfigValidationError {
                    field,
                    message: "must set either 'static' or 'builtin'".to_string(),
                    level: ValidationLevel::Error,
                }),
                (Some(_), Some(_)) => errors.push(ConfigValidationError {
                    field,
                    message: "cannot set both 'static' and 'builtin'".to_string(),
                    level: ValidationLevel::Error,
                }),
                (None, Some(builtin)) if builtins::lookup(builtin).is_none() => {
                    errors.push(ConfigValidationError {
                        field: format!("{}.builtin", field),
                        message: format!(
                            "unknown builtin '{}' (available: {})",
                            builtin,
                            builtins::names().collect::<Vec<_>>().join(", ")
                        ),
                        level: ValidationLevel::Warn,
                    })
                }
                _ => {}
            }
        }

        errors
    }

    /// Check if validation passed without errors or warnings
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Hook settings as configured, before any fail-closed adjustment
    pub fn hook_settings(&self) -> HookSettings {
        HookSettings {
            automatic: self.replacements.automatic_mode_enabled,
            frontend_only: self.replacements.frontend_only_mode,
        }
    }

    /// Token definitions for every table that names a callback
    pub fn token_definitions(&self) -> Vec<TokenDefinition> {
        self.tokens
            .iter()
            .filter_map(|(name, token)| {
                let mut def = TokenDefinition::new(name.clone(), token.callback()?);
                def.description = token.description.clone();
                Some(def)
            })
            .collect()
    }

    /// Value of one delimiter as written in the config
    pub fn delimiter(&self, role: DelimiterRole) -> &str {
        match role {
            DelimiterRole::Start => &self.delimiters.start,
            DelimiterRole::End => &self.delimiters.end,
            DelimiterRole::ParamSeparator => &self.delimiters.param_separator,
            DelimiterRole::KeyValueSeparator => &self.delimiters.key_value_separator,
            DelimiterRole::MultivalueSeparator => &self.delimiters.multivalue_separator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CtrConfig = toml::from_str("").unwrap();
        assert!(config.replacements.automatic_mode_enabled);
        assert!(config.replacements.frontend_only_mode);
        assert_eq!(config.delimiters.start, "{{");
        assert_eq!(config.delimiters.multivalue_separator, ",");
        assert!(config.tokens.is_empty());
        assert!(config.is_valid());
    }

    #[test]
    fn test_parse_full_config() {
        let config: CtrConfig = toml::from_str(
            r#"
[replacements]
automatic_mode_enabled = false
frontend_only_mode = false

[delimiters]
start = "[["
end = "]]"

[tokens.site]
static = "Example"
description = "Site name"

[tokens.user]
builtin = "context"
"#,
        )
        .unwrap();

        assert_eq!(config.hook_settings(), HookSettings { automatic: false, frontend_only: false });
        assert_eq!(config.delimiters.start, "[[");
        assert_eq!(config.delimiters.param_separator, "|");
        assert_eq!(config.delimiter(DelimiterRole::End), "]]");
        assert!(config.is_valid());

        let defs = config.token_definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "site");
        assert_eq!(defs[0].description.as_deref(), Some("Site name"));
        assert!(matches!(defs[1].callback, Callback::Builtin(ref b) if b == "context"));
    }

    #[test]
    fn test_duplicate_delimiters_are_warnings() {
        let mut config = CtrConfig::default();
        config.delimiters.key_value_separator = "|".to_string();

        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "delimiters.key_value_separator");
        assert_eq!(errors[0].level, ValidationLevel::Warn);
        assert!(config.delimiters.build().is_err());
    }

    #[test]
    fn test_token_table_shape_errors() {
        let mut config = CtrConfig::default();
        config.tokens.insert("empty".to_string(), TokenConfig::default());
        config.tokens.insert(
            "both".to_string(),
            TokenConfig {
                static_text: Some("x".to_string()),
                builtin: Some("join".to_string()),
                description: None,
            },
        );

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.level == ValidationLevel::Error));
        assert!(config.token_definitions().is_empty());
    }

    #[test]
    fn test_unknown_builtin_and_bad_name_are_warnings() {
        let mut config = CtrConfig::default();
        config.tokens.insert(
            "bad-name".to_string(),
            TokenConfig { static_text: Some("x".to_string()), ..Default::default() },
        );
        config.tokens.insert(
            "user".to_string(),
            TokenConfig { builtin: Some("nope".to_string()), ..Default::default() },
        );

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.level == ValidationLevel::Warn));
        assert!(errors.iter().any(|e| e.field == "tokens.user.builtin"));
        assert_eq!(config.token_definitions().len(), 2);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigValidationError {
            field: "delimiters.start".to_string(),
            message: "must not be empty".to_string(),
            level: ValidationLevel::Warn,
        };
        assert_eq!(err.to_string(), "ctr.toml: 'delimiters.start' must not be empty");
    }
}
