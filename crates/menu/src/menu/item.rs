//! Menu items: tree nodes with visibility, URL matching and selection.

use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::config::MenuSettings;
use crate::error::{MenuError, MenuResult};
use crate::request::MenuRequest;

/// A callable producing a value from the current request.
pub type Resolver<T> = Arc<dyn Fn(&MenuRequest) -> anyhow::Result<T> + Send + Sync>;

/// A visibility override evaluated against the current request.
pub type Check = Arc<dyn Fn(&MenuRequest) -> bool + Send + Sync>;

/// Extra named values attached to an item for use by renderers.
///
/// Insertion order is preserved.
pub type Attributes = serde_json::Map<String, JsonValue>;

/// Characters replaced when deriving a slug from a title.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-]+").expect("valid regex literal"));

/// Either a fixed value or one computed from the request on every pass.
#[derive(Clone)]
pub enum Value<T> {
    /// Known at construction.
    Static(T),
    /// Re-evaluated on every processing pass.
    Dynamic(Resolver<T>),
}

impl<T> Value<T> {
    /// Wrap a closure as a dynamic value.
    pub fn dynamic<F>(resolve: F) -> Self
    where
        F: Fn(&MenuRequest) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(resolve))
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Value<String> {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

impl From<String> for Value<String> {
    fn from(value: String) -> Self {
        Self::Static(value)
    }
}

impl From<Vec<MenuItem>> for Value<Vec<MenuItem>> {
    fn from(value: Vec<MenuItem>) -> Self {
        Self::Static(value)
    }
}

/// A node in a menu tree.
///
/// Items are built with [`MenuItem::new`] and the `with_*` methods, handed to a
/// [`MenuRegistry`](super::MenuRegistry), and then re-evaluated in place on
/// every processing pass: `visible`, `selected`, the resolved title and the
/// resolved children are all overwritten per request.
///
/// Cloning gives the copy and every item in its subtree a fresh id, so a
/// cloned subtree can be registered next to the original.
pub struct MenuItem {
    id: Uuid,
    title: String,
    title_resolver: Option<Resolver<String>>,
    url: String,
    children: Vec<MenuItem>,
    children_resolver: Option<Resolver<Vec<MenuItem>>>,
    weight: i32,
    check: Option<Check>,
    visible: bool,
    slug: Option<String>,
    exact_url: bool,
    selected: bool,
    parent: Option<Uuid>,
    attributes: Attributes,
    /// Compiled `url`, built on first match.
    matcher: OnceLock<Regex>,
}

impl MenuItem {
    /// Create an item with a static or dynamic title and a URL pattern.
    ///
    /// The pattern is not validated here; an invalid pattern is reported the
    /// first time the item is matched against a request.
    pub fn new(title: impl Into<Value<String>>, url: impl Into<String>) -> Self {
        let (title, title_resolver) = match title.into() {
            Value::Static(title) => (title, None),
            Value::Dynamic(resolve) => (String::new(), Some(resolve)),
        };

        Self {
            id: Uuid::now_v7(),
            title,
            title_resolver,
            url: url.into(),
            children: Vec::new(),
            children_resolver: None,
            weight: 1,
            check: None,
            visible: true,
            slug: None,
            exact_url: false,
            selected: false,
            parent: None,
            attributes: Attributes::new(),
            matcher: OnceLock::new(),
        }
    }

    /// Set the submenu, either a fixed list or a callable run on every pass.
    pub fn with_children(mut self, children: impl Into<Value<Vec<MenuItem>>>) -> Self {
        match children.into() {
            Value::Static(children) => {
                self.children = children;
                self.children_resolver = None;
            }
            Value::Dynamic(resolve) => {
                self.children = Vec::new();
                self.children_resolver = Some(resolve);
            }
        }
        self
    }

    /// Set the sort weight (lower sorts first).
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Set a visibility check evaluated on every pass.
    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&MenuRequest) -> bool + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Set the initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set an explicit slug; it is never replaced by the derived one.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Require the whole request path to match the URL pattern.
    pub fn with_exact_url(mut self, exact_url: bool) -> Self {
        self.exact_url = exact_url;
        self.matcher = OnceLock::new();
        self
    }

    /// Attach an extra attribute for renderers.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attach several extra attributes, keeping their order.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Identity of this item, stable across passes.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The resolved title (empty for a dynamic title that has not been
    /// processed yet).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The URL pattern.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The children resolved by the last pass (or the static children).
    pub fn children(&self) -> &[MenuItem] {
        &self.children
    }

    /// Children left visible by the last pass.
    pub fn visible_children(&self) -> impl Iterator<Item = &MenuItem> {
        self.children.iter().filter(|child| child.visible)
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The explicit or derived slug; `None` until the first pass for items
    /// without an explicit one.
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn exact_url(&self) -> bool {
        self.exact_url
    }

    /// Whether a visibility check is attached.
    pub fn has_check(&self) -> bool {
        self.check.is_some()
    }

    /// Whether the submenu is produced by a callable.
    pub fn has_dynamic_children(&self) -> bool {
        self.children_resolver.is_some()
    }

    /// Id of the item whose children list contains this one, set when the
    /// parent resolves its children.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up a single extra attribute.
    pub fn attribute(&self, name: &str) -> Option<&JsonValue> {
        self.attributes.get(name)
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Evaluate visibility, title, children and child selection for
    /// `request`, recursing into the children of a visible item.
    pub fn process(&mut self, request: &MenuRequest, settings: &MenuSettings) -> MenuResult<()> {
        if let Some(check) = &self.check {
            self.visible = check(request);
        }
        if !self.visible {
            return Ok(());
        }

        self.resolve_title(request)?;
        self.resolve_children(request)?;

        for child in &mut self.children {
            child.process(request, settings)?;
        }

        // Children were already processed; hiding the parent keeps their state.
        if settings.hide_empty && self.check.is_none() && self.visible_children().next().is_none()
        {
            self.visible = false;
            return Ok(());
        }

        select_longest_match(&mut self.children, request)?;
        Ok(())
    }

    /// Whether the request path matches this item's URL pattern.
    ///
    /// Without `exact_url` the pattern only has to match at the start of the
    /// path; callers anchor the end themselves if they need to.
    pub fn match_url(&self, request: &MenuRequest) -> MenuResult<bool> {
        Ok(self.matcher()?.is_match(&request.path))
    }

    /// Whether any descendant, at any depth, is selected.
    pub fn has_selected_descendant(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.selected || child.has_selected_descendant())
    }

    /// Depth-first search of this item and its descendants.
    pub fn find(&self, id: Uuid) -> Option<&MenuItem> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn matcher(&self) -> MenuResult<&Regex> {
        if let Some(matcher) = self.matcher.get() {
            return Ok(matcher);
        }

        let pattern = if self.exact_url {
            format!(r"\A(?:{})\z", self.url)
        } else {
            format!(r"\A(?:{})", self.url)
        };
        let matcher = Regex::new(&pattern).map_err(|source| MenuError::InvalidPattern {
            url: self.url.clone(),
            source,
        })?;

        Ok(self.matcher.get_or_init(|| matcher))
    }

    fn resolve_title(&mut self, request: &MenuRequest) -> MenuResult<()> {
        if let Some(resolve) = &self.title_resolver {
            self.title = resolve(request).map_err(|source| MenuError::Resolve {
                item: self.url.clone(),
                what: "title",
                source,
            })?;
        }
        if self.slug.is_none() {
            self.slug = Some(slugify(&self.title));
        }
        Ok(())
    }

    fn resolve_children(&mut self, request: &MenuRequest) -> MenuResult<()> {
        if let Some(resolve) = &self.children_resolver {
            self.children = resolve(request).map_err(|source| MenuError::Resolve {
                item: self.url.clone(),
                what: "children",
                source,
            })?;
        }

        let id = self.id;
        for child in &mut self.children {
            child.parent = Some(id);
        }
        Ok(())
    }
}

impl Clone for MenuItem {
    fn clone(&self) -> Self {
        let id = Uuid::now_v7();
        let children = self
            .children
            .iter()
            .map(|child| {
                let mut copy = child.clone();
                if child.parent == Some(self.id) {
                    copy.parent = Some(id);
                }
                copy
            })
            .collect();

        Self {
            id,
            title: self.title.clone(),
            title_resolver: self.title_resolver.clone(),
            url: self.url.clone(),
            children,
            children_resolver: self.children_resolver.clone(),
            weight: self.weight,
            check: self.check.clone(),
            visible: self.visible,
            slug: self.slug.clone(),
            exact_url: self.exact_url,
            selected: self.selected,
            parent: self.parent,
            attributes: self.attributes.clone(),
            matcher: self.matcher.clone(),
        }
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("url", &self.url)
            .field("weight", &self.weight)
            .field("visible", &self.visible)
            .field("selected", &self.selected)
            .field("slug", &self.slug)
            .field("exact_url", &self.exact_url)
            .field("check", &self.check.as_ref().map(|_| "Fn"))
            .field("dynamic_title", &self.title_resolver.is_some())
            .field("dynamic_children", &self.children_resolver.is_some())
            .field("parent", &self.parent)
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .finish()
    }
}

/// Derive a slug from a title: lowercase, runs of anything other than ASCII
/// letters, digits and `-` become `_`, outer `_` trimmed.
pub fn slugify(title: &str) -> String {
    SLUG_SEPARATORS
        .replace_all(&title.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Clear `selected` on the visible items and select the one whose URL
/// matches with the longest pattern, counted in characters. The first item
/// wins a tie.
///
/// Returns the index of the selected item, if any.
pub(crate) fn select_longest_match(
    items: &mut [MenuItem],
    request: &MenuRequest,
) -> MenuResult<Option<usize>> {
    // (index, url length in chars) of the best match so far
    let mut current: Option<(usize, usize)> = None;

    for (idx, item) in items.iter_mut().enumerate() {
        if !item.visible {
            continue;
        }
        item.selected = false;
        if item.match_url(request)? {
            let len = item.url.chars().count();
            if current.is_none_or(|(_, best)| best < len) {
                current = Some((idx, len));
            }
        }
    }

    if let Some((idx, _)) = current {
        items[idx].selected = true;
    }
    Ok(current.map(|(idx, _)| idx))
}
