//! Host configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/traymux/host.toml`
//! - Windows: `%APPDATA%/traymux/host.toml`
//!
//! The menu section must keep the item ids the demo features bind to (see
//! [`crate::features`]); refreshes for missing ids are logged and skipped.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use traymux_tray::{MenuEntry, MenuItemId, MenuTemplate, TrayMenuOptions};

use crate::features;

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Popup placement and other controller options.
    #[serde(default)]
    pub options: TrayMenuOptions,

    /// Contents of the context menu.
    #[serde(default = "default_menu")]
    pub menu: MenuTemplate,
}

/// The menu the demo features expect.
pub fn default_menu() -> MenuTemplate {
    MenuTemplate::new(vec![
        MenuEntry::item(features::SHOW_NOTIFICATIONS, "Show notifications"),
        MenuEntry::item(features::AUTO_UPDATE, "Auto update"),
        MenuEntry::separator(),
        MenuEntry::submenu(
            "Accent",
            features::ACCENT_GROUP
                .items()
                .zip(["Blue", "Green", "Purple"])
                .map(|(id, label)| MenuEntry::item(id, label))
                .collect(),
        ),
        MenuEntry::separator(),
        MenuEntry::item(features::EXIT, "Exit"),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: TrayMenuOptions::default(),
            menu: default_menu(),
        }
    }
}

impl Config {
    /// Loads configuration from the per-user location, creating it if absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing defaults there if absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Item ids present in the menu.
    pub fn menu_ids(&self) -> Vec<MenuItemId> {
        self.menu.item_ids()
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("traymux").join("host.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("traymux")
            .join("host.toml"))
    }
}
