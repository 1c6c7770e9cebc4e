//! Per-request context handed to token callbacks and the render hook.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which part of the site the current request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// End-user facing content
    #[default]
    Frontend,
    /// Administrative / management pages
    Admin,
}

/// Request context supplied by the host for one page render.
///
/// Attributes are free-form strings (current user name, language, ...) that
/// callbacks may read; the engine itself only looks at the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub surface: Surface,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RequestContext {
    /// Context for a frontend request
    pub fn frontend() -> Self {
        Self::default()
    }

    /// Context for a request to the administrative surface
    pub fn admin() -> Self {
        Self { surface: Surface::Admin, ..Self::default() }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn is_admin(&self) -> bool {
        self.surface == Surface::Admin
    }
}
