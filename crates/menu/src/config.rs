//! Menu settings loaded from environment variables or TOML.

use std::env;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Process-wide menu options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MenuSettings {
    /// Mark a top-level item selected when any of its descendants is
    /// selected (`MENU_SELECT_PARENTS`, default: false).
    pub select_parents: bool,

    /// Hide items that have no `check` callable and no visible children
    /// (`MENU_HIDE_EMPTY`, default: false).
    pub hide_empty: bool,
}

impl MenuSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self> {
        let select_parents = bool_var("MENU_SELECT_PARENTS")?;
        let hide_empty = bool_var("MENU_HIDE_EMPTY")?;

        Ok(Self {
            select_parents,
            hide_empty,
        })
    }

    /// Parse settings from a TOML document with `select_parents` and
    /// `hide_empty` keys. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("failed to parse menu settings TOML")
    }
}

/// Read an optional boolean environment variable (default: false).
fn bool_var(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => parse_bool(&raw).with_context(|| format!("{name} must be a boolean")),
        Err(env::VarError::NotPresent) => Ok(false),
        Err(e) => Err(e).with_context(|| format!("{name} is not valid unicode")),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("unrecognized boolean value '{other}'"),
    }
}
