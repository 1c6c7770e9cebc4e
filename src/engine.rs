//! Substitution engine
//!
//! Runs the parser over a text buffer, resolves each occurrence through the
//! [`TokenRegistry`] and splices callback results into the output in a
//! single left-to-right pass.
//!
//! The engine is fail-soft: an occurrence that cannot be resolved (invalid
//! name, unknown token, invalid callback, failing callback) is left in the
//! output as its original literal text and reported as a [`Diagnostic`].
//! Nothing a token does can make the pass itself fail.
//!
//! Callback output is spliced verbatim and never re-scanned, so a callback
//! returning delimiter sequences does not trigger further expansion.

use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::delimiters::DelimiterConfig;
use crate::parser::{parse, ParsedOccurrence};
use crate::registry::{is_valid_token_name, TokenRegistry};

/// What happened to one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "kebab-case")]
pub enum Outcome {
    /// Replaced with the callback result
    Succeeded,
    /// Name does not match the token name pattern
    SkippedInvalidName,
    /// No token registered under this name
    SkippedNoCallback,
    /// Token registered but its callback cannot be invoked
    SkippedInvalidCallback,
    /// Callback returned an error; the message is kept
    CallbackFailed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    /// Short kebab-case label
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::SkippedInvalidName => "skipped-invalid-name",
            Outcome::SkippedNoCallback => "skipped-no-callback",
            Outcome::SkippedInvalidCallback => "skipped-invalid-callback",
            Outcome::CallbackFailed(_) => "callback-failed",
        }
    }
}

/// Per-occurrence report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub name: String,
    /// Byte range of the token in the input text
    pub span: Range<usize>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Rewritten text plus one diagnostic per occurrence, in parse order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionResult {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl SubstitutionResult {
    /// Number of occurrences that were replaced
    pub fn replaced(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.outcome.is_success()).count()
    }

    /// Diagnostics for occurrences left as literal text
    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.outcome.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.skipped().next().is_some()
    }
}

/// Parser and registry composed into one substitution pass.
///
/// Cheap to clone; the delimiters and registry are shared.
#[derive(Debug, Clone)]
pub struct Substitutor {
    delimiters: Arc<DelimiterConfig>,
    registry: Arc<TokenRegistry>,
}

impl Substitutor {
    pub fn new(delimiters: Arc<DelimiterConfig>, registry: Arc<TokenRegistry>) -> Self {
        Self { delimiters, registry }
    }

    pub fn delimiters(&self) -> &DelimiterConfig {
        &self.delimiters
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Replace every resolvable token in `text`.
    pub fn substitute(&self, text: &str, context: &RequestContext) -> SubstitutionResult {
        let mut result = SubstitutionResult::default();

        // Fast path: nothing that could start a token
        if !text.contains(self.delimiters.start()) {
            result.text = text.to_string();
            return result;
        }

        let mut out = String::with_capacity(text.len());
        let mut copied_to = 0;

        for occurrence in parse(text, &self.delimiters) {
            let outcome = match self.resolve(&occurrence, context) {
                Ok(replacement) => {
                    out.push_str(&text[copied_to..occurrence.span.start]);
                    out.push_str(&replacement);
                    copied_to = occurrence.span.end;
                    Outcome::Succeeded
                }
                Err(outcome) => outcome,
            };

            result.diagnostics.push(Diagnostic {
                name: occurrence.name,
                span: occurrence.span,
                outcome,
            });
        }

        out.push_str(&text[copied_to..]);
        result.text = out;

        debug!(
            tokens = result.diagnostics.len(),
            replaced = result.replaced(),
            "substitution pass complete"
        );
        result
    }

    /// Convenience wrapper returning only the rewritten text.
    pub fn replace_tokens(&self, text: &str, context: &RequestContext) -> String {
        self.substitute(text, context).text
    }

    /// Resolve one occurrence to its replacement, or the reason it was skipped.
    fn resolve(
        &self,
        occurrence: &ParsedOccurrence,
        context: &RequestContext,
    ) -> Result<String, Outcome> {
        let name = occurrence.name.as_str();

        if !is_valid_token_name(name) {
            debug!(token = %name, "skipping token with invalid name");
            return Err(Outcome::SkippedInvalidName);
        }

        let Some(definition) = self.registry.lookup(name) else {
            debug!(token = %name, "no callback registered");
            return Err(Outcome::SkippedNoCallback);
        };

        if !definition.callback_valid() {
            debug!(token = %name, "callback is not invocable");
            return Err(Outcome::SkippedInvalidCallback);
        }

        definition.callback.invoke(name, &occurrence.params, context).map_err(|err| {
            warn!(token = %name, error = %err, "token callback failed");
            Outcome::CallbackFailed(err.message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParamValue;
    use crate::registry::{Callback, CallbackError, TokenDefinition};

    fn engine_with(defs: Vec<TokenDefinition>) -> Substitutor {
        let registry = TokenRegistry::new();
        for def in defs {
            registry.register_lenient(def);
        }
        Substitutor::new(Arc::new(DelimiterConfig::default()), Arc::new(registry))
    }

    fn static_token(name: &str, text: &str) -> TokenDefinition {
        TokenDefinition::new(name, Callback::Static(text.to_string()))
    }

    #[test]
    fn test_hello_world() {
        let engine = engine_with(vec![TokenDefinition::new(
            "name",
            Callback::handler(|_, _, _| Ok("World".to_string())),
        )]);
        let result = engine.substitute("Hello {{name}}!", &RequestContext::default());
        assert_eq!(result.text, "Hello World!");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].outcome, Outcome::Succeeded);
        assert_eq!(result.diagnostics[0].span, 6..14);
    }

    #[test]
    fn test_text_without_start_delimiter_unchanged() {
        let engine = engine_with(vec![static_token("name", "x")]);
        let text = "no tokens here }} just an end marker";
        let result = engine.substitute(text, &RequestContext::default());
        assert_eq!(result.text, text);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_token_left_literal() {
        let engine = engine_with(vec![]);
        let result = engine.substitute("{{missing}}", &RequestContext::default());
        assert_eq!(result.text, "{{missing}}");
        assert_eq!(result.diagnostics[0].outcome, Outcome::SkippedNoCallback);
    }

    #[test]
    fn test_unterminated_token_no_diagnostic() {
        let engine = engine_with(vec![static_token("broken", "x")]);
        let result = engine.substitute("{{broken", &RequestContext::default());
        assert_eq!(result.text, "{{broken");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_name_skipped() {
        let engine = engine_with(vec![]);
        let result = engine.substitute("a {{}} b {{not valid}}", &RequestContext::default());
        assert_eq!(result.text, "a {{}} b {{not valid}}");
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.diagnostics.iter().all(|d| d.outcome == Outcome::SkippedInvalidName));
    }

    #[test]
    fn test_invalid_callback_skipped() {
        let engine = engine_with(vec![TokenDefinition::new(
            "user",
            Callback::Builtin("does_not_exist".to_string()),
        )]);
        let result = engine.substitute("{{user}}", &RequestContext::default());
        assert_eq!(result.text, "{{user}}");
        assert_eq!(result.diagnostics[0].outcome, Outcome::SkippedInvalidCallback);
    }

    #[test]
    fn test_failing_callback_is_contained() {
        let engine = engine_with(vec![
            TokenDefinition::new(
                "boom",
                Callback::handler(|_, _, _| Err(CallbackError::new("database unavailable"))),
            ),
            static_token("ok", "fine"),
        ]);
        let result = engine.substitute("{{boom}} and {{ok}}", &RequestContext::default());
        assert_eq!(result.text, "{{boom}} and fine");
        assert_eq!(
            result.diagnostics[0].outcome,
            Outcome::CallbackFailed("database unavailable".to_string())
        );
        assert_eq!(result.diagnostics[1].outcome, Outcome::Succeeded);
        assert!(result.has_failures());
        assert_eq!(result.replaced(), 1);
    }

    #[test]
    fn test_callback_output_not_rescanned() {
        let engine = engine_with(vec![
            static_token("outer", "{{inner}}"),
            static_token("inner", "SHOULD NOT APPEAR"),
        ]);
        let result = engine.substitute("[{{outer}}]", &RequestContext::default());
        assert_eq!(result.text, "[{{inner}}]");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_surrounding_text_preserved_exactly() {
        let engine = engine_with(vec![static_token("x", "X")]);
        let text = "  Grüße,\n\t{{x}}{{x}} {{y}} – ende  ";
        let result = engine.substitute(text, &RequestContext::default());
        assert_eq!(result.text, "  Grüße,\n\tXX {{y}} – ende  ");
    }

    #[test]
    fn test_callback_receives_params_and_context() {
        let engine = engine_with(vec![TokenDefinition::new(
            "greet",
            Callback::handler(|name, params, ctx| {
                let lang = params.get("lang").and_then(ParamValue::as_str).unwrap_or("en");
                let tags = params.get("tags").map(|v| v.to_list().len()).unwrap_or(0);
                let user = ctx.attribute("user").unwrap_or("guest");
                Ok(format!("{}:{}:{}:{}", name, lang, tags, user))
            }),
        )]);
        let ctx = RequestContext::default().with_attribute("user", "ada");
        let result = engine.substitute("{{greet|lang:de|tags:a,b,c}}", &ctx);
        assert_eq!(result.text, "greet:de:3:ada");
    }

    #[test]
    fn test_replace_tokens_returns_text() {
        let engine = engine_with(vec![static_token("a", "1")]);
        assert_eq!(engine.replace_tokens("{{a}}+{{a}}", &RequestContext::default()), "1+1");
    }

    #[test]
    fn test_diagnostics_serialize() {
        let diag = Diagnostic {
            name: "boom".to_string(),
            span: 0..8,
            outcome: Outcome::CallbackFailed("nope".to_string()),
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["outcome"], "callback-failed");
        assert_eq!(json["detail"], "nope");
        assert_eq!(json["span"]["start"], 0);

        let ok = Diagnostic { name: "a".into(), span: 0..5, outcome: Outcome::Succeeded };
        assert_eq!(serde_json::to_value(&ok).unwrap()["outcome"], "succeeded");
        assert_eq!(Outcome::SkippedNoCallback.label(), "skipped-no-callback");
    }
}
