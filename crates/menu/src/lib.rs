//! Simple Menu
//!
//! Hierarchical navigation menus for modular web applications: modules
//! register items under named menus, and each request gets the visible
//! subset with the entry for the current URL marked selected.
//! The `simple-menu` binary renders menus from JSON definitions.

pub mod config;
pub mod error;
pub mod menu;
pub mod request;

pub use config::MenuSettings;
pub use error::{MenuError, MenuResult};
pub use menu::{
    MenuContributor, MenuDefinition, MenuItem, MenuRegistry, RenderedItem, SharedMenuRegistry,
    Value,
};
pub use request::MenuRequest;
