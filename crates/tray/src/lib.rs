//! Context menu controller for a system tray icon.
//!
//! Owns the native popup menu and drives one open/refresh/dispatch cycle
//! each time the tray icon is clicked:
//!
//! 1. run the refresh callbacks so features can update checked/enabled state
//! 2. read the cursor position and bring the host window to the foreground
//! 3. show the popup and block until the user picks an item or dismisses it
//! 4. invoke every callback registered on the picked item
//!
//! The OS is reached only through the traits in [`platform`]. Two
//! implementations ship with the crate:
//! - [`headless::HeadlessPlatform`]: in-memory, scriptable, used by tests and
//!   the host binary
//! - `win32::Win32Platform`: real Win32 menus (Windows only)
//!
//! # Threading
//!
//! Single-threaded. The controller, the registry it shares and the platform
//! are all `!Send`; everything runs on the thread that owns the host message
//! loop.

pub mod binding;
mod context_menu;
mod error;
pub mod headless;
pub mod platform;
mod template;
mod trigger;
#[cfg(windows)]
pub mod win32;

pub use binding::{BoolBindingEffect, RadioGroup};
pub use context_menu::{MenuRef, TRAY_ACK, TrayContextMenu, TrayMenuOptions};
pub use error::TrayMenuError;
pub use platform::{Platform, Point, PopupPlacement};
pub use template::{MenuEntry, MenuTemplate};
pub use trigger::TrayTrigger;

pub use traymux_callbacks::{MenuCallbackCookie, MenuItemId, SharedCallbacks};
