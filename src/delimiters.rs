//! Delimiter configuration for the token grammar
//!
//! Five strings define the grammar: the token start and end markers, the
//! parameter separator, the key-value separator and the multivalue separator.
//! A [`DelimiterConfig`] can only be obtained through [`DelimiterConfig::new`]
//! (or [`Default`]), so every instance in circulation is known to be valid.
//!
//! # Example
//!
//! ```
//! use cacheable_tokens::delimiters::DelimiterConfig;
//!
//! let config = DelimiterConfig::new("[[", "]]", ";", "=", "+").unwrap();
//! assert_eq!(config.start(), "[[");
//!
//! // Identical delimiters make the grammar ambiguous
//! assert!(DelimiterConfig::new("{{", "}}", "|", "|", ",").is_err());
//! ```

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_DELIMITER_START: &str = "{{";
pub const DEFAULT_DELIMITER_END: &str = "}}";
pub const DEFAULT_PARAM_SEPARATOR: &str = "|";
pub const DEFAULT_KEY_VALUE_SEPARATOR: &str = ":";
pub const DEFAULT_MULTIVALUE_SEPARATOR: &str = ",";

/// Maximum delimiter length in characters
pub const MAX_DELIMITER_LEN: usize = 5;

/// Identifies one of the five delimiters, mostly for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterRole {
    Start,
    End,
    ParamSeparator,
    KeyValueSeparator,
    MultivalueSeparator,
}

impl DelimiterRole {
    pub const ALL: [DelimiterRole; 5] = [
        DelimiterRole::Start,
        DelimiterRole::End,
        DelimiterRole::ParamSeparator,
        DelimiterRole::KeyValueSeparator,
        DelimiterRole::MultivalueSeparator,
    ];

    /// Name of the matching field in the `[delimiters]` config table
    pub fn field_name(self) -> &'static str {
        match self {
            DelimiterRole::Start => "start",
            DelimiterRole::End => "end",
            DelimiterRole::ParamSeparator => "param_separator",
            DelimiterRole::KeyValueSeparator => "key_value_separator",
            DelimiterRole::MultivalueSeparator => "multivalue_separator",
        }
    }
}

impl std::fmt::Display for DelimiterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Invalid delimiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DelimiterError {
    /// A delimiter is the empty string
    #[error("delimiter '{0}' must not be empty")]
    Empty(DelimiterRole),
    /// A delimiter exceeds the maximum length
    #[error("delimiter '{role}' is {len} characters long (maximum {max})", max = MAX_DELIMITER_LEN)]
    TooLong { role: DelimiterRole, len: usize },
    /// Two delimiters share the same value
    #[error("delimiters '{first}' and '{second}' are both '{value}'")]
    Duplicate { first: DelimiterRole, second: DelimiterRole, value: String },
}

impl DelimiterError {
    /// The delimiter the error is reported against
    pub fn role(&self) -> DelimiterRole {
        match self {
            DelimiterError::Empty(role) => *role,
            DelimiterError::TooLong { role, .. } => *role,
            DelimiterError::Duplicate { second, .. } => *second,
        }
    }
}

/// The validated set of delimiters defining the token grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelimiterConfig {
    start: String,
    end: String,
    param_separator: String,
    key_value_separator: String,
    multivalue_separator: String,
}

impl DelimiterConfig {
    /// Build a delimiter configuration, rejecting empty, overlong or duplicate delimiters.
    ///
    /// Only the first problem found is returned; use [`DelimiterConfig::check`] to get all of them.
    pub fn new(
        start: &str,
        end: &str,
        param_separator: &str,
        key_value_separator: &str,
        multivalue_separator: &str,
    ) -> Result<Self, DelimiterError> {
        let values = [start, end, param_separator, key_value_separator, multivalue_separator];
        if let Some(err) = Self::check(values).into_iter().next() {
            return Err(err);
        }

        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
            param_separator: param_separator.to_string(),
            key_value_separator: key_value_separator.to_string(),
            multivalue_separator: multivalue_separator.to_string(),
        })
    }

    /// Validate five delimiter values (in [`DelimiterRole::ALL`] order) and collect every problem.
    pub fn check(values: [&str; 5]) -> Vec<DelimiterError> {
        let mut errors = Vec::new();

        for (role, value) in DelimiterRole::ALL.iter().zip(values) {
            let len = value.chars().count();
            if len == 0 {
                errors.push(DelimiterError::Empty(*role));
            } else if len > MAX_DELIMITER_LEN {
                errors.push(DelimiterError::TooLong { role: *role, len });
            }
        }

        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                if !values[i].is_empty() && values[i] == values[j] {
                    errors.push(DelimiterError::Duplicate {
                        first: DelimiterRole::ALL[i],
                        second: DelimiterRole::ALL[j],
                        value: values[i].to_string(),
                    });
                }
            }
        }

        errors
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn param_separator(&self) -> &str {
        &self.param_separator
    }

    pub fn key_value_separator(&self) -> &str {
        &self.key_value_separator
    }

    pub fn multivalue_separator(&self) -> &str {
        &self.multivalue_separator
    }

    /// Get a delimiter by role
    pub fn get(&self, role: DelimiterRole) -> &str {
        match role {
            DelimiterRole::Start => &self.start,
            DelimiterRole::End => &self.end,
            DelimiterRole::ParamSeparator => &self.param_separator,
            DelimiterRole::KeyValueSeparator => &self.key_value_separator,
            DelimiterRole::MultivalueSeparator => &self.multivalue_separator,
        }
    }
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_DELIMITER_START.to_string(),
            end: DEFAULT_DELIMITER_END.to_string(),
            param_separator: DEFAULT_PARAM_SEPARATOR.to_string(),
            key_value_separator: DEFAULT_KEY_VALUE_SEPARATOR.to_string(),
            multivalue_separator: DEFAULT_MULTIVALUE_SEPARATOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DelimiterConfig::default();
        let values = DelimiterRole::ALL.map(|role| config.get(role));
        assert!(DelimiterConfig::check(values).is_empty());
    }

    #[test]
    fn test_new_accepts_custom_delimiters() {
        let config = DelimiterConfig::new("<%", "%>", "#", "=", ";").unwrap();
        assert_eq!(config.start(), "<%");
        assert_eq!(config.end(), "%>");
        assert_eq!(config.param_separator(), "#");
        assert_eq!(config.key_value_separator(), "=");
        assert_eq!(config.multivalue_separator(), ";");
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let err = DelimiterConfig::new("", "}}", "|", ":", ",").unwrap_err();
        assert_eq!(err, DelimiterError::Empty(DelimiterRole::Start));
    }

    #[test]
    fn test_too_long_delimiter_rejected() {
        let err = DelimiterConfig::new("{{{{{{", "}}", "|", ":", ",").unwrap_err();
        assert_eq!(err, DelimiterError::TooLong { role: DelimiterRole::Start, len: 6 });
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Five multi-byte characters are still within the limit
        assert!(DelimiterConfig::new("«««««", "»", "|", ":", ",").is_ok());
    }

    #[test]
    fn test_duplicate_delimiters_rejected() {
        let err = DelimiterConfig::new("{{", "}}", ",", ":", ",").unwrap_err();
        assert_eq!(
            err,
            DelimiterError::Duplicate {
                first: DelimiterRole::ParamSeparator,
                second: DelimiterRole::MultivalueSeparator,
                value: ",".to_string(),
            }
        );
        assert_eq!(err.role(), DelimiterRole::MultivalueSeparator);
    }

    #[test]
    fn test_check_collects_every_problem() {
        let errors = DelimiterConfig::check(["", "}}", "}}", "toolong", ":"]);
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&DelimiterError::Empty(DelimiterRole::Start)));
        assert!(errors.iter().any(|e| matches!(e, DelimiterError::TooLong { .. })));
        assert!(errors.iter().any(|e| matches!(e, DelimiterError::Duplicate { .. })));
    }

    #[test]
    fn test_error_display() {
        let err = DelimiterError::Empty(DelimiterRole::End);
        assert_eq!(err.to_string(), "delimiter 'end' must not be empty");

        let err = DelimiterError::TooLong { role: DelimiterRole::Start, len: 7 };
        assert_eq!(err.to_string(), "delimiter 'start' is 7 characters long (maximum 5)");
    }
}
