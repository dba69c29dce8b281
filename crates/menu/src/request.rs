//! Per-request input for menu processing.
//!
//! The engine itself reads only [`MenuRequest::path`]. The remaining fields
//! exist for `check`, title and children callables that decide visibility or
//! content from who is asking.

use std::collections::HashMap;

/// The request a menu pass is evaluated against.
#[derive(Debug, Clone, Default)]
pub struct MenuRequest {
    /// Request path matched against item URL patterns (e.g. "/blog/2024").
    pub path: String,
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Permissions granted to the user.
    pub permissions: Vec<String>,
    /// Free-form request-scoped values (language, stage, ...).
    pub context: HashMap<String, String>,
}

impl MenuRequest {
    /// Create a request for an anonymous user at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Mark the request as authenticated with the given permissions.
    pub fn authenticated(mut self, permissions: Vec<String>) -> Self {
        self.authenticated = true;
        self.permissions = permissions;
        self
    }

    /// Add a context value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Check if the user has a specific permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Look up a context value.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_by_default() {
        let request = MenuRequest::new("/");
        assert_eq!(request.path, "/");
        assert!(!request.authenticated);
        assert!(!request.has_permission("administer site"));
    }

    #[test]
    fn authenticated_permissions_and_context() {
        let request = MenuRequest::new("/admin")
            .authenticated(vec!["administer site".to_string()])
            .with_context("language", "fr");

        assert!(request.authenticated);
        assert!(request.has_permission("administer site"));
        assert!(!request.has_permission("edit content"));
        assert_eq!(request.context_value("language"), Some("fr"));
        assert_eq!(request.context_value("stage"), None);
    }
}
