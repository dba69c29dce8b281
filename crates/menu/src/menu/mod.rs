//! Menu system for navigation.
//!
//! Modules contribute [`MenuItem`] trees to named menus in a
//! [`MenuRegistry`], either in code or as JSON [`MenuDefinition`]s. Per
//! request the registry decides which items are visible and which are
//! selected for the current path.

mod definition;
mod item;
mod registry;
mod rendered;

pub use definition::MenuDefinition;
pub use item::{Attributes, Check, MenuItem, Resolver, Value, slugify};
pub use registry::{MenuContributor, MenuRegistry, PreProcessFn};
pub use rendered::{RenderedItem, SharedMenuRegistry, render};
