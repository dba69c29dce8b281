//! Simple Menu renderer
//!
//! Loads JSON menu definitions, processes them for one request path and
//! prints the rendered menus as JSON.
//!
//! Usage:
//!   simple-menu --definitions menus/blog.json --definitions menus/admin.json --path /blog/2024

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use simple_menu::menu::render;
use simple_menu::{MenuRegistry, MenuRequest, MenuSettings};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with an array of menu definitions. The file stem is used as
    /// the module name in logs. Repeatable.
    #[arg(long, required = true)]
    definitions: Vec<PathBuf>,

    /// Request path to render the menus for.
    #[arg(long, default_value = "/")]
    path: String,

    /// Render only this menu instead of all of them.
    #[arg(long)]
    menu: Option<String>,

    /// TOML file with menu settings. Without it, MENU_SELECT_PARENTS and
    /// MENU_HIDE_EMPTY are read from the environment.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            MenuSettings::from_toml_str(&source)?
        }
        None => MenuSettings::from_env().context("failed to load menu settings")?,
    };

    let mut sources = Vec::with_capacity(args.definitions.len());
    for path in &args.definitions {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let module = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sources.push((module, json));
    }

    let mut registry = MenuRegistry::from_definitions(settings, sources);
    info!(
        menus = registry.len(),
        items = registry.item_count(),
        "Menu definitions loaded"
    );

    let request = MenuRequest::new(args.path);
    let output = match &args.menu {
        Some(name) => {
            let items = registry.process(&request, name)?;
            serde_json::to_string_pretty(&render(&items))?
        }
        None => {
            let menus = registry.process_all(&request)?;
            let rendered: std::collections::BTreeMap<_, _> = menus
                .into_iter()
                .map(|(name, items)| (name, render(&items)))
                .collect();
            serde_json::to_string_pretty(&rendered)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
