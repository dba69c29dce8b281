//! Simple Menu test utilities.
//!
//! Helpers for integration testing: request builders, item fixtures and a
//! call recorder for hooks and dynamic resolvers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use simple_menu::{MenuItem, MenuRequest, MenuSettings};

/// Create an anonymous request for `path`.
pub fn request(path: &str) -> MenuRequest {
    MenuRequest::new(path)
}

/// Create an authenticated request with the given permissions.
pub fn user_request(path: &str, permissions: &[&str]) -> MenuRequest {
    MenuRequest::new(path).authenticated(permissions.iter().map(|s| s.to_string()).collect())
}

/// Create an admin request.
pub fn admin_request(path: &str) -> MenuRequest {
    user_request(path, &["administer site"])
}

/// Settings with `select_parents` on.
pub fn select_parents() -> MenuSettings {
    MenuSettings {
        select_parents: true,
        ..MenuSettings::default()
    }
}

/// Settings with `hide_empty` on.
pub fn hide_empty() -> MenuSettings {
    MenuSettings {
        hide_empty: true,
        ..MenuSettings::default()
    }
}

/// Create a leaf item.
pub fn leaf(title: &str, url: &str) -> MenuItem {
    MenuItem::new(title, url)
}

/// Create a leaf item with a weight.
pub fn weighted(title: &str, url: &str, weight: i32) -> MenuItem {
    MenuItem::new(title, url).with_weight(weight)
}

/// Titles of a list of items, for compact assertions.
pub fn titles(items: &[&MenuItem]) -> Vec<String> {
    items.iter().map(|item| item.title().to_string()).collect()
}

/// Selection flags of a list of items, in order.
pub fn selected_flags(items: &[&MenuItem]) -> Vec<bool> {
    items.iter().map(|item| item.is_selected()).collect()
}

/// Build a JSON definitions array from `json!` values.
pub fn definitions(values: Vec<JsonValue>) -> String {
    JsonValue::Array(values).to_string()
}

/// Counts and records calls from hooks and resolvers.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    count: Arc<AtomicUsize>,
    labels: Arc<Mutex<Vec<String>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call and return how many calls came before it.
    pub fn hit(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst)
    }

    /// Record one labelled call.
    pub fn record(&self, label: &str) {
        self.hit();
        self.labels.lock().push(label.to_string());
    }

    /// Number of calls so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Labels recorded so far, in call order.
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().clone()
    }
}
