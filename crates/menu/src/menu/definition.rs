//! Declarative menu items contributed as JSON.

use serde::{Deserialize, Serialize};

use super::item::{Attributes, MenuItem};

/// A static menu item as declared by a module.
///
/// Keys other than the ones below are kept as item attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuDefinition {
    /// Menu the item belongs to (default: "main").
    #[serde(default = "default_menu")]
    pub menu: String,
    /// Display title.
    pub title: String,
    /// URL pattern matched against the request path.
    pub url: String,
    /// Sort weight (lower = earlier).
    #[serde(default = "default_weight")]
    pub weight: i32,
    /// Initial visibility.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Explicit slug; derived from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Require the whole path to match.
    #[serde(default)]
    pub exact_url: bool,
    /// Submenu. The `menu` key of children is ignored.
    #[serde(default)]
    pub children: Vec<MenuDefinition>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

fn default_menu() -> String {
    "main".to_string()
}
fn default_weight() -> i32 {
    1
}
fn default_true() -> bool {
    true
}

impl MenuDefinition {
    /// Convert into the menu name and the item tree it describes.
    pub fn into_item(self) -> (String, MenuItem) {
        (self.menu.clone(), self.build())
    }

    fn build(self) -> MenuItem {
        let children: Vec<MenuItem> = self.children.into_iter().map(Self::build).collect();

        let mut item = MenuItem::new(self.title, self.url)
            .with_weight(self.weight)
            .with_visible(self.visible)
            .with_exact_url(self.exact_url)
            .with_children(children)
            .with_attributes(self.attributes);
        if let Some(slug) = self.slug {
            item = item.with_slug(slug);
        }
        item
    }
}
