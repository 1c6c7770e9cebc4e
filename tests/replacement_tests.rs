//! Integration tests for token replacement
//!
//! Exercises the public API end to end: registry setup, parsing with default
//! and custom delimiters, and the fail-soft substitution pass.

use std::sync::Arc;

use cacheable_tokens::context::RequestContext;
use cacheable_tokens::delimiters::DelimiterConfig;
use cacheable_tokens::engine::{Outcome, Substitutor};
use cacheable_tokens::parser::{format_token, parse, ParamValue, TokenParams};
use cacheable_tokens::registry::{Callback, CallbackError, TokenDefinition, TokenRegistry};

fn substitutor(registry: TokenRegistry) -> Substitutor {
    Substitutor::new(Arc::new(DelimiterConfig::default()), Arc::new(registry))
}

fn world_registry() -> TokenRegistry {
    let registry = TokenRegistry::new();
    registry
        .register(TokenDefinition::new("name", Callback::handler(|_, _, _| Ok("World".to_string()))))
        .unwrap();
    registry
}

// ========== Examples ==========

#[test]
fn test_hello_world() {
    let engine = substitutor(world_registry());
    assert_eq!(engine.replace_tokens("Hello {{name}}!", &RequestContext::default()), "Hello World!");
}

#[test]
fn test_greet_parameters() {
    let config = DelimiterConfig::new("{{", "}}", "|", ":", ",").unwrap();
    let found: Vec<_> = parse("{{greet|lang:en|tags:a,b,c}}", &config).collect();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "greet");
    assert_eq!(found[0].params.get("lang"), Some(&ParamValue::Single("en".to_string())));
    assert_eq!(
        found[0].params.get("tags"),
        Some(&ParamValue::Multi(vec!["a".to_string(), "b".to_string(), "c".to_string()]))
    );
}

#[test]
fn test_unknown_token() {
    let engine = substitutor(TokenRegistry::new());
    let result = engine.substitute("{{missing}}", &RequestContext::default());
    assert_eq!(result.text, "{{missing}}");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].outcome, Outcome::SkippedNoCallback);
}

#[test]
fn test_unterminated_token() {
    let engine = substitutor(world_registry());
    let result = engine.substitute("{{broken", &RequestContext::default());
    assert_eq!(result.text, "{{broken");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_failing_callback_does_not_raise() {
    let registry = world_registry();
    registry
        .register(TokenDefinition::new(
            "flaky",
            Callback::handler(|_, _, _| Err(CallbackError::new("upstream timed out"))),
        ))
        .unwrap();
    let engine = substitutor(registry);

    let result = engine.substitute("<b>{{flaky}}</b> {{name}}", &RequestContext::default());
    assert_eq!(result.text, "<b>{{flaky}}</b> World");
    assert!(matches!(&result.diagnostics[0].outcome, Outcome::CallbackFailed(msg) if msg == "upstream timed out"));
}

// ========== Properties ==========

#[test]
fn test_text_without_tokens_is_unchanged() {
    let engine = substitutor(world_registry());
    let samples = [
        "",
        "plain",
        "<html><body>{ single } braces }}</body></html>",
        "unicode ✓ ünïcödé 漢字",
        "name}} only end",
    ];
    for text in samples {
        let result = engine.substitute(text, &RequestContext::default());
        assert_eq!(result.text, text);
        assert!(result.diagnostics.is_empty(), "unexpected diagnostics for {:?}", text);
    }
}

#[test]
fn test_output_is_never_rescanned() {
    let registry = TokenRegistry::new();
    // Wraps its argument in delimiters, producing another token
    registry
        .register(TokenDefinition::new(
            "wrap",
            Callback::handler(|_, params, _| {
                let inner = params.nth(0).and_then(ParamValue::as_str).unwrap_or_default();
                Ok(format!("{{{{{}}}}}", inner))
            }),
        ))
        .unwrap();
    registry.register(TokenDefinition::new("secret", Callback::Static("LEAK".into()))).unwrap();
    let engine = substitutor(registry);

    let result = engine.substitute("[{{wrap|secret}}]", &RequestContext::default());
    assert_eq!(result.text, "[{{secret}}]");
    assert_eq!(result.diagnostics.len(), 1);

    // A second pass is the caller's choice, and does expand it
    let second = engine.substitute(&result.text, &RequestContext::default());
    assert_eq!(second.text, "[LEAK]");
}

#[test]
fn test_round_trip_through_format_token() {
    let configs = [
        DelimiterConfig::default(),
        DelimiterConfig::new("[%", "%]", ";", "=", "+").unwrap(),
        DelimiterConfig::new("<<", ">>", "#", "=>", "/").unwrap(),
    ];
    let params = TokenParams::new()
        .with_positional("one")
        .with_positional(vec!["two", "three"])
        .with_named("key", "value")
        .with_named("list", vec!["x", "y", "z"]);

    for config in &configs {
        let text = format!("before {} after", format_token("tok_1", &params, config));
        let found: Vec<_> = parse(&text, config).collect();
        assert_eq!(found.len(), 1, "config {:?}", config);
        assert_eq!(found[0].name, "tok_1");
        assert_eq!(found[0].params, params);
    }
}

#[test]
fn test_every_occurrence_reported_in_order() {
    let engine = substitutor(world_registry());
    let result = engine.substitute(
        "{{name}} {{nope}} {{bad name}} {{name|x}} {{}}",
        &RequestContext::default(),
    );
    let outcomes: Vec<_> = result.diagnostics.iter().map(|d| d.outcome.label()).collect();
    assert_eq!(
        outcomes,
        vec![
            "succeeded",
            "skipped-no-callback",
            "skipped-invalid-name",
            "succeeded",
            "skipped-invalid-name"
        ]
    );
    assert_eq!(result.text, "World {{nope}} {{bad name}} World {{}}");
    assert!(result.diagnostics.windows(2).all(|w| w[0].span.end <= w[1].span.start));
}

#[test]
fn test_shared_engine_across_threads() {
    let registry = TokenRegistry::new();
    registry
        .register(TokenDefinition::new("user", Callback::Builtin("context".to_string())))
        .unwrap();
    let engine = Arc::new(substitutor(registry));

    let handles: Vec<_> = ["ada", "grace", "linus"]
        .into_iter()
        .map(|user| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let ctx = RequestContext::frontend().with_attribute("user", user);
                engine.replace_tokens("Hi {{user}}", &ctx)
            })
        })
        .collect();

    let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs, vec!["Hi ada", "Hi grace", "Hi linus"]);
}
