//! Description of the popup menu's contents.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use traymux_callbacks::MenuItemId;

use crate::error::TrayMenuError;

/// A single entry in the popup menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuEntry {
    /// Selectable command.
    Item {
        id: MenuItemId,
        label: String,
        /// Whether the item is enabled (clickable).
        #[serde(default = "default_true")]
        enabled: bool,
        #[serde(default)]
        checked: bool,
    },
    Separator,
    /// Nested popup.
    Submenu {
        label: String,
        entries: Vec<MenuEntry>,
    },
}

fn default_true() -> bool {
    true
}

impl MenuEntry {
    /// An enabled, unchecked item.
    pub fn item(id: MenuItemId, label: impl Into<String>) -> Self {
        Self::Item {
            id,
            label: label.into(),
            enabled: true,
            checked: false,
        }
    }

    pub fn separator() -> Self {
        Self::Separator
    }

    pub fn submenu(label: impl Into<String>, entries: Vec<MenuEntry>) -> Self {
        Self::Submenu {
            label: label.into(),
            entries,
        }
    }

    /// Sets the initial enabled state. No effect on separators and submenus.
    pub fn enabled(mut self, value: bool) -> Self {
        if let Self::Item { enabled, .. } = &mut self {
            *enabled = value;
        }
        self
    }

    /// Sets the initial checked state. No effect on separators and submenus.
    pub fn checked(mut self, value: bool) -> Self {
        if let Self::Item { checked, .. } = &mut self {
            *checked = value;
        }
        self
    }
}

/// The popup menu resource a controller is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTemplate {
    #[serde(default)]
    pub entries: Vec<MenuEntry>,
}

impl MenuTemplate {
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        Self { entries }
    }

    /// Ids of every item, depth first.
    pub fn item_ids(&self) -> Vec<MenuItemId> {
        let mut ids = Vec::new();
        collect_ids(&self.entries, &mut ids);
        ids
    }

    /// Checks the template can be loaded as a native menu.
    ///
    /// Item id 0 is reserved: native popups report "nothing selected" as 0.
    pub fn validate(&self) -> Result<(), TrayMenuError> {
        if self.entries.is_empty() {
            return Err(TrayMenuError::InvalidTemplate("menu has no entries".into()));
        }
        let mut seen = HashSet::new();
        validate_entries(&self.entries, &mut seen)
    }
}

fn collect_ids(entries: &[MenuEntry], ids: &mut Vec<MenuItemId>) {
    for entry in entries {
        match entry {
            MenuEntry::Item { id, .. } => ids.push(*id),
            MenuEntry::Separator => {}
            MenuEntry::Submenu { entries, .. } => collect_ids(entries, ids),
        }
    }
}

fn validate_entries(
    entries: &[MenuEntry],
    seen: &mut HashSet<MenuItemId>,
) -> Result<(), TrayMenuError> {
    for entry in entries {
        match entry {
            MenuEntry::Item { id, label, .. } => {
                if id.get() == 0 {
                    return Err(TrayMenuError::InvalidTemplate(format!(
                        "item '{label}' uses reserved id 0"
                    )));
                }
                if label.trim().is_empty() {
                    return Err(TrayMenuError::InvalidTemplate(format!(
                        "item {id} has an empty label"
                    )));
                }
                if !seen.insert(*id) {
                    return Err(TrayMenuError::InvalidTemplate(format!(
                        "duplicate item id {id}"
                    )));
                }
            }
            MenuEntry::Separator => {}
            MenuEntry::Submenu { label, entries } => {
                if label.trim().is_empty() {
                    return Err(TrayMenuError::InvalidTemplate(
                        "submenu has an empty label".into(),
                    ));
                }
                if entries.is_empty() {
                    return Err(TrayMenuError::InvalidTemplate(format!(
                        "submenu '{label}' has no entries"
                    )));
                }
                validate_entries(entries, seen)?;
            }
        }
    }
    Ok(())
}
