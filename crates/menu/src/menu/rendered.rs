//! Per-request snapshots and a lock-guarded registry handle.
//!
//! Processing mutates the registry's items in place. Request handlers that
//! share one registry go through [`SharedMenuRegistry`], which processes
//! under a lock and returns owned [`RenderedItem`] trees, so no handler ever
//! reads flags another request is in the middle of rewriting.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::item::{Attributes, MenuItem};
use super::registry::MenuRegistry;
use crate::error::MenuResult;
use crate::request::MenuRequest;

/// A processed, visible menu item detached from the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedItem {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub slug: String,
    pub weight: i32,
    pub selected: bool,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// Visible children only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedItem>,
}

impl RenderedItem {
    /// Snapshot a processed item and its visible descendants.
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            id: item.id(),
            title: item.title().to_string(),
            url: item.url().to_string(),
            slug: item.slug().unwrap_or_default().to_string(),
            weight: item.weight(),
            selected: item.is_selected(),
            attributes: item.attributes().clone(),
            children: item.visible_children().map(Self::from_item).collect(),
        }
    }

    /// The selected item on the path from here down, outermost first.
    ///
    /// Follows selected children until none is selected; useful for
    /// breadcrumbs.
    pub fn selected_trail(&self) -> Vec<&RenderedItem> {
        let mut trail = Vec::new();
        if !self.selected {
            return trail;
        }

        let mut current = self;
        trail.push(current);
        while let Some(next) = current.children.iter().find(|child| child.selected) {
            trail.push(next);
            current = next;
        }
        trail
    }
}

/// Snapshot a list of processed items.
pub fn render(items: &[&MenuItem]) -> Vec<RenderedItem> {
    items.iter().map(|item| RenderedItem::from_item(item)).collect()
}

/// Cloneable handle to a registry shared between request handlers.
#[derive(Debug, Clone, Default)]
pub struct SharedMenuRegistry {
    inner: Arc<Mutex<MenuRegistry>>,
}

impl SharedMenuRegistry {
    pub fn new(registry: MenuRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Run `f` with exclusive access, e.g. to register items at startup.
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut MenuRegistry) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Process the menu `name` and snapshot its visible items.
    pub fn render(&self, request: &MenuRequest, name: &str) -> MenuResult<Vec<RenderedItem>> {
        let mut registry = self.inner.lock();
        let items = registry.process(request, name)?;
        Ok(render(&items))
    }

    /// Process every menu and snapshot each one's visible items.
    pub fn render_all(
        &self,
        request: &MenuRequest,
    ) -> MenuResult<BTreeMap<String, Vec<RenderedItem>>> {
        let mut registry = self.inner.lock();
        let menus = registry.process_all(request)?;
        Ok(menus
            .into_iter()
            .map(|(name, items)| (name, render(&items)))
            .collect())
    }
}
