//! Token parsing
//!
//! Scans a text buffer for tokens of the form
//! `{{name|positional|key:value|list:a,b,c}}` (shown with the default
//! delimiters) and yields one [`ParsedOccurrence`] per token, left to right.
//!
//! The grammar is deliberately small:
//! - The body between the start and end delimiters is split at the first
//!   parameter separator into the token name and its parameters.
//! - Each parameter field containing the key-value separator is a named
//!   parameter (split at the first occurrence), anything else is positional.
//! - Any value containing the multivalue separator becomes a list.
//! - A start delimiter without a matching end delimiter is literal text.
//!
//! There is no escape mechanism. A value cannot contain any of the reserved
//! separators, and tokens do not nest.
//!
//! # Example
//!
//! ```
//! use cacheable_tokens::delimiters::DelimiterConfig;
//! use cacheable_tokens::parser::{parse, ParamValue};
//!
//! let config = DelimiterConfig::default();
//! let occurrences: Vec<_> = parse("Hi {{greet|lang:en|tags:a,b}}!", &config).collect();
//!
//! assert_eq!(occurrences.len(), 1);
//! assert_eq!(occurrences[0].name, "greet");
//! assert_eq!(occurrences[0].span, 3..29);
//! assert_eq!(occurrences[0].params.get("lang"), Some(&ParamValue::from("en")));
//! assert_eq!(occurrences[0].params.get("tags").unwrap().to_list(), vec!["a", "b"]);
//! ```

use std::collections::BTreeMap;
use std::iter::FusedIterator;
use std::ops::Range;

use serde::Serialize;

use crate::delimiters::DelimiterConfig;

/// A single parameter value: a scalar, or a list when the raw value
/// contained the multivalue separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// Parse a raw field value, splitting on the multivalue separator.
    pub fn parse(raw: &str, multivalue_separator: &str) -> Self {
        if raw.contains(multivalue_separator) {
            ParamValue::Multi(
                raw.split(multivalue_separator).map(|part| part.trim().to_string()).collect(),
            )
        } else {
            ParamValue::Single(raw.trim().to_string())
        }
    }

    /// The scalar value, or `None` for a list
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Multi(_) => None,
        }
    }

    /// The value as a list; a scalar is a one-element list
    pub fn to_list(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(value) => vec![value.as_str()],
            ParamValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, ParamValue::Multi(_))
    }

    /// Join the value back into a single string using `separator`.
    pub fn join(&self, separator: &str) -> String {
        match self {
            ParamValue::Single(value) => value.clone(),
            ParamValue::Multi(values) => values.join(separator),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Structured parameters of one token occurrence.
///
/// Positional values keep their order. Named values are keyed uniquely;
/// when a key repeats inside one token the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenParams {
    positional: Vec<ParamValue>,
    named: BTreeMap<String, ParamValue>,
}

impl TokenParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style positional value
    pub fn with_positional(mut self, value: impl Into<ParamValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Builder-style named value
    pub fn with_named(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.named.insert(key.to_string(), value.into());
        self
    }

    pub fn positional(&self) -> &[ParamValue] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, ParamValue> {
        &self.named
    }

    /// Get a named parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.named.get(key)
    }

    /// Get a positional parameter by index
    pub fn nth(&self, index: usize) -> Option<&ParamValue> {
        self.positional.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// One token found during a parse pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedOccurrence {
    /// Token name, trimmed. May be empty or otherwise invalid.
    pub name: String,
    /// Byte range of the whole token, delimiters included
    pub span: Range<usize>,
    /// Everything after the first parameter separator, if there was one
    pub raw_params: Option<String>,
    pub params: TokenParams,
}

impl ParsedOccurrence {
    /// The literal token text as it appears in `source`
    pub fn literal<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    fn from_body(body: &str, span: Range<usize>, config: &DelimiterConfig) -> Self {
        let (name, raw_params) = match body.split_once(config.param_separator()) {
            Some((name, rest)) => (name, Some(rest)),
            None => (body, None),
        };

        let mut params = TokenParams::new();
        if let Some(raw) = raw_params {
            for field in raw.split(config.param_separator()) {
                match field.split_once(config.key_value_separator()) {
                    Some((key, value)) => {
                        params.named.insert(
                            key.trim().to_string(),
                            ParamValue::parse(value, config.multivalue_separator()),
                        );
                    }
                    None => {
                        params
                            .positional
                            .push(ParamValue::parse(field, config.multivalue_separator()));
                    }
                }
            }
        }

        Self {
            name: name.trim().to_string(),
            span,
            raw_params: raw_params.map(str::to_string),
            params,
        }
    }
}

/// Lazy iterator over the token occurrences of a text buffer.
///
/// Cloning the iterator (or calling [`parse`] again) restarts the scan from
/// the same position and yields the same occurrences.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    text: &'a str,
    config: &'a DelimiterConfig,
    pos: usize,
}

impl Iterator for Occurrences<'_> {
    type Item = ParsedOccurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.text.get(self.pos..)?;
        let open = self.pos + rest.find(self.config.start())?;
        let body_start = open + self.config.start().len();

        // No end delimiter after this start means none after any later start either
        let Some(close) = self.text[body_start..].find(self.config.end()) else {
            self.pos = self.text.len();
            return None;
        };
        let body_end = body_start + close;
        let token_end = body_end + self.config.end().len();
        self.pos = token_end;

        Some(ParsedOccurrence::from_body(
            &self.text[body_start..body_end],
            open..token_end,
            self.config,
        ))
    }
}

impl FusedIterator for Occurrences<'_> {}

/// Parse all token occurrences in `text`.
///
/// Never fails: unterminated tokens are left as literal text and are not
/// yielded.
pub fn parse<'a>(text: &'a str, config: &'a DelimiterConfig) -> Occurrences<'a> {
    Occurrences { text, config, pos: 0 }
}

/// Serialize a token back to text.
///
/// Positional parameters come first, followed by named parameters in key
/// order. Parsing the result yields the same parameters only when values
/// contain no separators, carry no surrounding whitespace, and every
/// [`ParamValue::Multi`] has at least two items: a one-item list is written
/// as a bare value and reads back as [`ParamValue::Single`].
pub fn format_token(name: &str, params: &TokenParams, config: &DelimiterConfig) -> String {
    let mut out = String::new();
    out.push_str(config.start());
    out.push_str(name);

    for value in &params.positional {
        out.push_str(config.param_separator());
        out.push_str(&value.join(config.multivalue_separator()));
    }
    for (key, value) in &params.named {
        out.push_str(config.param_separator());
        out.push_str(key);
        out.push_str(config.key_value_separator());
        out.push_str(&value.join(config.multivalue_separator()));
    }

    out.push_str(config.end());
    out
}
