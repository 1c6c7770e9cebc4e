//! Built-in token callbacks
//!
//! Configuration files cannot carry code, so tokens declared in `ctr.toml`
//! either expand to static text or point at one of these callbacks by name:
//!
//! | Name      | Result                                                        |
//! |-----------|---------------------------------------------------------------|
//! | `context` | request attribute named by the first positional or `key:`     |
//! | `path`    | the request path                                              |
//! | `join`    | all positional values joined with `sep:` (default `", "`)     |
//! | `upper`   | positional values joined with a space, uppercased             |
//! | `lower`   | positional values joined with a space, lowercased             |
//!
//! `context` and `path` accept a `default:` parameter used when the value is
//! missing; without one, a missing value is a callback failure.

use crate::context::RequestContext;
use crate::parser::TokenParams;
use crate::registry::CallbackError;

/// Signature shared by every builtin
pub type BuiltinFn = fn(&str, &TokenParams, &RequestContext) -> Result<String, CallbackError>;

/// Builtin name, function and one-line description
pub const BUILTINS: &[(&str, BuiltinFn, &str)] = &[
    ("context", context_attribute, "Request attribute (first positional or key:, default:)"),
    ("path", request_path, "Request path (default:)"),
    ("join", join, "Positional values joined with sep: (default \", \")"),
    ("upper", upper, "Positional values, uppercased"),
    ("lower", lower, "Positional values, lowercased"),
];

/// Find a builtin by name
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    BUILTINS.iter().find(|(builtin, _, _)| *builtin == name).map(|(_, f, _)| *f)
}

/// Names of all builtins
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _, _)| *name)
}

fn default_param(params: &TokenParams) -> Option<String> {
    params.get("default").map(|v| v.join(", "))
}

/// Flatten every positional value into one list of strings.
fn positional_values(params: &TokenParams) -> Vec<&str> {
    params.positional().iter().flat_map(|v| v.to_list()).collect()
}

fn context_attribute(
    name: &str,
    params: &TokenParams,
    context: &RequestContext,
) -> Result<String, CallbackError> {
    let key = params
        .nth(0)
        .and_then(|v| v.as_str())
        .or_else(|| params.get("key").and_then(|v| v.as_str()))
        .unwrap_or(name);

    match context.attribute(key) {
        Some(value) => Ok(value.to_string()),
        None => default_param(params)
            .ok_or_else(|| CallbackError::new(format!("request attribute '{}' is not set", key))),
    }
}

fn request_path(
    _name: &str,
    params: &TokenParams,
    context: &RequestContext,
) -> Result<String, CallbackError> {
    context
        .path
        .clone()
        .or_else(|| default_param(params))
        .ok_or_else(|| CallbackError::new("request has no path"))
}

fn join(_name: &str, params: &TokenParams, _context: &RequestContext) -> Result<String, CallbackError> {
    let sep = params.get("sep").map(|v| v.join("")).unwrap_or_else(|| ", ".to_string());
    Ok(positional_values(params).join(&sep))
}

fn upper(_name: &str, params: &TokenParams, _context: &RequestContext) -> Result<String, CallbackError> {
    Ok(positional_values(params).join(" ").to_uppercase())
}

fn lower(_name: &str, params: &TokenParams, _context: &RequestContext) -> Result<String, CallbackError> {
    Ok(positional_values(params).join(" ").to_lowercase())
}
