//! Cacheable token replacements
//!
//! Placeholder tokens such as `{{user|default:guest}}` are substituted in a
//! page's rendered output *after* it has left the render cache, so cached
//! markup can still carry per-request fragments.
//!
//! This library provides:
//! - A configurable token grammar ([`delimiters`], [`parser`])
//! - A shared token registry with validation ([`registry`], [`builtins`])
//! - A fail-soft substitution engine ([`engine`])
//! - The render hook contract and a facade tying it together ([`hook`], [`replacements`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cacheable_tokens::context::RequestContext;
//! use cacheable_tokens::delimiters::DelimiterConfig;
//! use cacheable_tokens::hook::{HookSettings, PostRenderHook};
//! use cacheable_tokens::registry::{Callback, TokenDefinition, TokenRegistry};
//! use cacheable_tokens::replacements::TokenReplacements;
//!
//! let registry = Arc::new(TokenRegistry::new());
//! registry
//!     .register(TokenDefinition::new("name", Callback::handler(|_, _, _| Ok("World".to_string()))))
//!     .unwrap();
//!
//! let replacements =
//!     TokenReplacements::new(DelimiterConfig::default(), HookSettings::default(), registry);
//! let page = replacements.after_render("Hello {{name}}!".to_string(), &RequestContext::frontend());
//! assert_eq!(page, "Hello World!");
//! ```

pub mod builtins;
pub mod cli;
pub mod config;
pub mod context;
pub mod delimiters;
pub mod engine;
pub mod hook;
pub mod logging;
pub mod parser;
pub mod registry;
pub mod replacements;
