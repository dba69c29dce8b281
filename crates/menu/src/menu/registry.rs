//! Menu registry - named menus of items plus pre-process hooks.
//!
//! Modules register items under a menu name at startup. On every request the
//! registry runs the menu's pre-process hooks, sorts it by weight if items
//! were added since the last sort, processes each item tree against the
//! request and returns the visible top-level items.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;

use super::definition::MenuDefinition;
use super::item::{MenuItem, select_longest_match};
use crate::config::MenuSettings;
use crate::error::MenuResult;
use crate::request::MenuRequest;

/// A pre-process hook, run with no arguments before a menu is processed.
pub type PreProcessFn = Box<dyn FnMut() + Send>;

/// A registered hook and whether it is dropped after its first run.
struct PreProcessHook {
    run: PreProcessFn,
    once: bool,
}

/// A module that contributes menu items at startup.
pub trait MenuContributor {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Register this module's items and hooks.
    fn contribute(&self, registry: &mut MenuRegistry);
}

/// Registry of named menus.
pub struct MenuRegistry {
    settings: MenuSettings,
    /// Root items per menu name, in insertion or weight order.
    items: HashMap<String, Vec<MenuItem>>,
    /// Menu names in the order they were first registered.
    order: Vec<String>,
    /// Menus that gained items since they were last sorted.
    unsorted: HashSet<String>,
    /// Pre-process hooks per menu name, in registration order.
    processors: HashMap<String, Vec<PreProcessHook>>,
}

impl MenuRegistry {
    /// Create an empty registry.
    pub fn new(settings: MenuSettings) -> Self {
        Self {
            settings,
            items: HashMap::new(),
            order: Vec::new(),
            unsorted: HashSet::new(),
            processors: HashMap::new(),
        }
    }

    /// Build a registry by letting each contributor register, in order.
    pub fn from_contributors(settings: MenuSettings, contributors: &[&dyn MenuContributor]) -> Self {
        let mut registry = Self::new(settings);

        for contributor in contributors {
            let before = registry.item_count();
            contributor.contribute(&mut registry);
            debug!(
                module = %contributor.name(),
                items = registry.item_count() - before,
                "menu contributor registered"
            );
        }

        registry
    }

    /// Build a registry from JSON arrays of [`MenuDefinition`]s.
    ///
    /// Each element in `definition_jsons` is a (module_name, json_array)
    /// tuple. A module whose JSON fails to parse is skipped.
    pub fn from_definitions(settings: MenuSettings, definition_jsons: Vec<(String, String)>) -> Self {
        let mut registry = Self::new(settings);

        for (module, json) in definition_jsons {
            match serde_json::from_str::<Vec<MenuDefinition>>(&json) {
                Ok(definitions) => {
                    for definition in definitions {
                        let (menu, item) = definition.into_item();
                        registry.add_item(menu, item);
                    }
                }
                Err(e) => {
                    warn!(
                        module = %module,
                        error = %e,
                        "failed to parse menu definitions"
                    );
                }
            }
        }

        registry
    }

    /// The settings this registry processes with.
    pub fn settings(&self) -> &MenuSettings {
        &self.settings
    }

    /// Append an item to the menu `name`, creating the menu if needed.
    pub fn add_item(&mut self, name: impl Into<String>, item: MenuItem) {
        let name = name.into();
        match self.items.get_mut(&name) {
            Some(items) => items.push(item),
            None => {
                self.order.push(name.clone());
                self.items.insert(name.clone(), vec![item]);
            }
        }
        self.unsorted.insert(name);
    }

    /// Register a hook run before every pass over the menu `name`, or only
    /// before the next one when `once` is set.
    pub fn add_pre_process<F>(&mut self, name: impl Into<String>, hook: F, once: bool)
    where
        F: FnMut() + Send + 'static,
    {
        self.processors
            .entry(name.into())
            .or_default()
            .push(PreProcessHook {
                run: Box::new(hook),
                once,
            });
    }

    /// Stable-sort the menu by weight if items were added since the last
    /// sort. Otherwise a no-op.
    pub fn sort_menu(&mut self, name: &str) {
        if !self.unsorted.remove(name) {
            return;
        }
        if let Some(items) = self.items.get_mut(name) {
            items.sort_by_key(MenuItem::weight);
            debug!(menu = %name, items = items.len(), "sorted menu");
        }
    }

    /// Run the hooks registered for `name` in order, dropping the one-shot
    /// hooks after they ran.
    pub fn pre_process(&mut self, name: &str) {
        let Some(hooks) = self.processors.get_mut(name) else {
            return;
        };

        let ran = hooks.len();
        hooks.retain_mut(|hook| {
            (hook.run)();
            !hook.once
        });

        if ran > 0 {
            debug!(
                menu = %name,
                ran,
                removed = ran - hooks.len(),
                "ran menu pre-process hooks"
            );
        }
    }

    /// Process the menu `name` for `request` and return its visible
    /// top-level items. An unknown menu yields an empty list.
    pub fn process(&mut self, request: &MenuRequest, name: &str) -> MenuResult<Vec<&MenuItem>> {
        self.process_in_place(request, name)?;
        Ok(self.visible_items(name))
    }

    /// Process every known menu independently, in registration order, and
    /// return each one's visible top-level items.
    pub fn process_all(
        &mut self,
        request: &MenuRequest,
    ) -> MenuResult<BTreeMap<String, Vec<&MenuItem>>> {
        let names = self.order.clone();
        for name in &names {
            self.process_in_place(request, name)?;
        }

        Ok(names
            .into_iter()
            .map(|name| {
                let visible = self.visible_items(&name);
                (name, visible)
            })
            .collect())
    }

    fn process_in_place(&mut self, request: &MenuRequest, name: &str) -> MenuResult<()> {
        self.pre_process(name);

        if !self.items.contains_key(name) {
            return Ok(());
        }
        self.sort_menu(name);

        let settings = self.settings;
        let Some(items) = self.items.get_mut(name) else {
            return Ok(());
        };

        for item in items.iter_mut() {
            item.process(request, &settings)?;
        }
        let selected = select_longest_match(items, request)?;

        if settings.select_parents {
            for item in items.iter_mut().filter(|item| item.is_visible()) {
                if item.has_selected_descendant() {
                    item.set_selected(true);
                }
            }
        }

        debug!(
            menu = %name,
            path = %request.path,
            visible = items.iter().filter(|item| item.is_visible()).count(),
            selected = ?selected.and_then(|idx| items[idx].slug()),
            "processed menu"
        );
        Ok(())
    }

    fn visible_items(&self, name: &str) -> Vec<&MenuItem> {
        self.menu(name)
            .iter()
            .filter(|item| item.is_visible())
            .collect()
    }

    /// Root items of a menu in their current order, visible or not.
    pub fn menu(&self, name: &str) -> &[MenuItem] {
        self.items.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All menu names in registration order.
    pub fn menu_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Find an item by id in any menu, at any depth.
    pub fn find(&self, id: Uuid) -> Option<&MenuItem> {
        self.items
            .values()
            .flatten()
            .find_map(|item| item.find(id))
    }

    /// Ancestors of the item `id`, nearest first.
    ///
    /// Parent links are set when a parent resolves its children, so this is
    /// empty for items that have not been processed yet.
    pub fn ancestors(&self, id: Uuid) -> Vec<&MenuItem> {
        let mut ancestors = Vec::new();
        let mut current = self.find(id).and_then(MenuItem::parent);

        while let Some(parent_id) = current {
            let Some(parent) = self.find(parent_id) else {
                break;
            };
            ancestors.push(parent);
            current = parent.parent();
        }

        ancestors
    }

    /// Number of hooks currently registered for `name`.
    pub fn hook_count(&self, name: &str) -> usize {
        self.processors.get(name).map(|v| v.len()).unwrap_or(0)
    }

    /// Get total number of root items across all menus.
    pub fn item_count(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    /// Get menu count.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for MenuRegistry {
    fn default() -> Self {
        Self::new(MenuSettings::default())
    }
}

impl fmt::Debug for MenuRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: BTreeMap<&str, usize> = self
            .processors
            .iter()
            .map(|(name, hooks)| (name.as_str(), hooks.len()))
            .collect();

        f.debug_struct("MenuRegistry")
            .field("settings", &self.settings)
            .field("order", &self.order)
            .field("items", &self.items)
            .field("unsorted", &self.unsorted)
            .field("processors", &hooks)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn titles(items: &[&MenuItem]) -> Vec<String> {
        items.iter().map(|i| i.title().to_string()).collect()
    }

    #[test]
    fn sorts_by_weight_keeping_insertion_order_for_ties() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("C", "/c").with_weight(5));
        registry.add_item("main", MenuItem::new("A", "/a").with_weight(1));
        registry.add_item("main", MenuItem::new("D", "/d").with_weight(5));
        registry.add_item("main", MenuItem::new("B", "/b").with_weight(1));

        let items = registry.process(&MenuRequest::new("/"), "main").unwrap();
        assert_eq!(titles(&items), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn resorts_after_later_additions() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("Late", "/late").with_weight(10));
        registry.process(&MenuRequest::new("/"), "main").unwrap();

        registry.add_item("main", MenuItem::new("Early", "/early").with_weight(0));
        let items = registry.process(&MenuRequest::new("/"), "main").unwrap();
        assert_eq!(titles(&items), vec!["Early", "Late"]);
    }

    #[test]
    fn sort_menu_is_a_noop_without_additions() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("B", "/b").with_weight(2));
        registry.add_item("main", MenuItem::new("A", "/a").with_weight(1));
        registry.sort_menu("main");
        assert_eq!(registry.menu("main")[0].title(), "A");

        registry.sort_menu("main");
        registry.sort_menu("unknown");
        assert_eq!(registry.menu("main")[0].title(), "A");
    }

    #[test]
    fn longest_top_level_match_is_selected() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("A", "/a").with_weight(10));
        registry.add_item("main", MenuItem::new("B", "/b").with_weight(5));

        let items = registry.process(&MenuRequest::new("/b"), "main").unwrap();
        assert_eq!(titles(&items), vec!["B", "A"]);
        assert!(items[0].is_selected());
        assert!(!items[1].is_selected());
    }

    #[test]
    fn selection_moves_between_requests() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("A", "/a"));
        registry.add_item("main", MenuItem::new("B", "/b"));

        registry.process(&MenuRequest::new("/a"), "main").unwrap();
        let items = registry.process(&MenuRequest::new("/b"), "main").unwrap();
        assert!(!items[0].is_selected());
        assert!(items[1].is_selected());
    }

    #[test]
    fn unknown_menu_is_empty_but_runs_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = MenuRegistry::default();
        registry.add_pre_process(
            "ghost",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            false,
        );

        let items = registry.process(&MenuRequest::new("/"), "ghost").unwrap();
        assert!(items.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn once_hooks_run_once_and_do_not_skip_neighbours() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("Home", "/"));

        for (label, once) in [("a", true), ("b", true), ("c", false)] {
            let log = Arc::clone(&log);
            registry.add_pre_process("main", move || log.lock().push(label), once);
        }

        registry.process(&MenuRequest::new("/"), "main").unwrap();
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert_eq!(registry.hook_count("main"), 1);

        registry.process(&MenuRequest::new("/"), "main").unwrap();
        assert_eq!(*log.lock(), vec!["a", "b", "c", "c"]);
    }

    #[test]
    fn select_parents_marks_top_level_ancestor() {
        let settings = MenuSettings {
            select_parents: true,
            ..MenuSettings::default()
        };
        let mut registry = MenuRegistry::new(settings);
        registry.add_item(
            "main",
            MenuItem::new("Section", "/section").with_children(vec![
                MenuItem::new("Group", "/group").with_children(vec![MenuItem::new("Leaf", "/leaf")]),
            ]),
        );

        let items = registry.process(&MenuRequest::new("/leaf"), "main").unwrap();
        assert!(items[0].is_selected());
        // intermediate items are not promoted
        assert!(!items[0].children()[0].is_selected());
        assert!(items[0].children()[0].children()[0].is_selected());
    }

    #[test]
    fn without_select_parents_ancestor_is_unaffected() {
        let mut registry = MenuRegistry::default();
        registry.add_item(
            "main",
            MenuItem::new("Section", "/section")
                .with_children(vec![MenuItem::new("Leaf", "/leaf")]),
        );

        let items = registry.process(&MenuRequest::new("/leaf"), "main").unwrap();
        assert!(!items[0].is_selected());
        assert!(items[0].children()[0].is_selected());
    }

    #[test]
    fn process_all_covers_every_menu() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("Home", "/"));
        registry.add_item("footer", MenuItem::new("Legal", "/legal"));
        registry.add_item("footer", MenuItem::new("Secret", "/secret").with_check(|_| false));

        let menus = registry.process_all(&MenuRequest::new("/legal")).unwrap();
        assert_eq!(menus.keys().collect::<Vec<_>>(), vec!["footer", "main"]);
        assert_eq!(titles(&menus["footer"]), vec!["Legal"]);
        assert!(menus["footer"][0].is_selected());
        assert!(menus["main"][0].is_selected());
    }

    #[test]
    fn process_all_runs_menus_in_registration_order() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut registry = MenuRegistry::default();

        for name in ["z", "a", "m", "b", "q", "c"] {
            registry.add_item(name, MenuItem::new(name, format!("/{name}")));
            let log = Arc::clone(&log);
            registry.add_pre_process(name, move || log.lock().push(name), false);
        }
        registry.add_item("a", MenuItem::new("again", "/again"));

        registry.process_all(&MenuRequest::new("/")).unwrap();
        assert_eq!(*log.lock(), vec!["z", "a", "m", "b", "q", "c"]);
        assert_eq!(registry.menu_names(), vec!["z", "a", "m", "b", "q", "c"]);
    }

    #[test]
    fn longest_match_counts_characters() {
        let mut registry = MenuRegistry::default();
        registry.add_item("main", MenuItem::new("A", "/éb"));
        registry.add_item("main", MenuItem::new("B", "/..."));

        let items = registry.process(&MenuRequest::new("/ébc"), "main").unwrap();
        assert!(!items[0].is_selected());
        assert!(items[1].is_selected());
    }

    #[test]
    fn cloned_subtree_resolves_within_its_own_menu() {
        let tree = MenuItem::new("Docs", "/docs")
            .with_children(vec![MenuItem::new("Guide", "/docs/guide")]);
        let copy = tree.clone();
        let mut registry = MenuRegistry::default();
        registry.add_item("main", tree);
        registry.add_item("footer", copy);
        registry.process_all(&MenuRequest::new("/")).unwrap();

        let footer_docs = &registry.menu("footer")[0];
        let footer_guide = footer_docs.children()[0].id();
        assert_ne!(footer_docs.id(), registry.menu("main")[0].id());

        let ancestors = registry.ancestors(footer_guide);
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].id(), footer_docs.id());
    }

    #[test]
    fn ancestors_follow_parent_ids() {
        let leaf = MenuItem::new("Leaf", "/a/b/c");
        let leaf_id = leaf.id();
        let mut registry = MenuRegistry::default();
        registry.add_item(
            "main",
            MenuItem::new("A", "/a")
                .with_children(vec![MenuItem::new("B", "/a/b").with_children(vec![leaf])]),
        );
        assert!(registry.ancestors(leaf_id).is_empty());

        registry.process(&MenuRequest::new("/"), "main").unwrap();
        let ancestors = registry.ancestors(leaf_id);
        assert_eq!(titles(&ancestors), vec!["B", "A"]);
    }

    #[test]
    fn from_definitions_skips_bad_modules() {
        let good = r#"[
            {"title": "Blog", "url": "/blog", "weight": 3},
            {"menu": "footer", "title": "Feed", "url": "/feed"}
        ]"#;
        let registry = MenuRegistry::from_definitions(
            MenuSettings::default(),
            vec![
                ("blog".to_string(), good.to_string()),
                ("broken".to_string(), "{not json".to_string()),
            ],
        );

        assert_eq!(registry.menu_names(), vec!["main", "footer"]);
        assert_eq!(registry.item_count(), 2);
        assert_eq!(registry.menu("main")[0].weight(), 3);
    }

    struct Blog;

    impl MenuContributor for Blog {
        fn name(&self) -> &str {
            "blog"
        }

        fn contribute(&self, registry: &mut MenuRegistry) {
            registry.add_item("main", MenuItem::new("Blog", "/blog"));
        }
    }

    struct Admin;

    impl MenuContributor for Admin {
        fn name(&self) -> &str {
            "admin"
        }

        fn contribute(&self, registry: &mut MenuRegistry) {
            registry.add_item("main", MenuItem::new("Admin", "/admin"));
            registry.add_item("admin", MenuItem::new("Users", "/admin/users"));
        }
    }

    #[test]
    fn contributors_register_in_order() {
        let registry = MenuRegistry::from_contributors(MenuSettings::default(), &[&Blog, &Admin]);

        assert_eq!(registry.len(), 2);
        let main: Vec<_> = registry.menu("main").iter().map(MenuItem::title).collect();
        assert_eq!(main, vec!["Blog", "Admin"]);
    }
}
