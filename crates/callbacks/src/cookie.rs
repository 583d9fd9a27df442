//! Menu item identifiers and registration cookies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a native menu entry.
///
/// Assigned by whoever authored the menu. Unique within one menu, not
/// globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(pub u32);

impl MenuItemId {
    /// Returns the raw numeric identifier.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for MenuItemId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a single callback registration.
///
/// Pairs a per-registration secret with the item it was issued for. The
/// secret only disambiguates registrations on the same item; it is not a
/// credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuCallbackCookie {
    secret: u64,
    item: MenuItemId,
}

impl MenuCallbackCookie {
    pub(crate) fn new(secret: u64, item: MenuItemId) -> Self {
        Self { secret, item }
    }

    /// The menu item this cookie was issued for.
    pub fn item(&self) -> MenuItemId {
        self.item
    }

    pub(crate) fn secret(&self) -> u64 {
        self.secret
    }
}
