//! Interfaces to the OS services the context menu consumes.
//!
//! The controller never calls the OS directly. A platform bundles three
//! collaborators:
//! - [`WindowHost`]: the window that owns the tray icon
//! - [`CursorSource`]: the pointer position service
//! - [`MenuBackend`]: native popup menus

use std::fmt;

use serde::{Deserialize, Serialize};
use traymux_callbacks::MenuItemId;

use crate::error::TrayMenuError;
use crate::template::MenuTemplate;
use crate::trigger::TrayTrigger;

/// Screen coordinates in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Raw identity of the owner window (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Cookie returned by [`WindowHost::register_tray_hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookCookie(pub u64);

/// Callback the window host runs for every tray notification.
///
/// The return value is handed back to the host message loop.
pub type TrayHook = Box<dyn Fn(TrayTrigger) -> isize>;

/// Horizontal alignment of the popup relative to the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment of the popup relative to the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Where the popup is anchored relative to the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupPlacement {
    #[serde(default)]
    pub horizontal: HorizontalAlign,
    #[serde(default)]
    pub vertical: VerticalAlign,
}

/// The window that owns the tray icon.
pub trait WindowHost {
    /// Owner handle passed to the popup so it receives the menu's messages.
    fn handle(&self) -> WindowHandle;

    /// Brings the window to the foreground.
    fn set_foreground(&self) -> Result<(), TrayMenuError>;

    /// Registers a hook that runs for every tray notification.
    fn register_tray_hook(&self, hook: TrayHook) -> HookCookie;

    /// Removes a hook. Returns `false` if the cookie is unknown.
    fn unregister_tray_hook(&self, cookie: HookCookie) -> bool;
}

/// Pointer position service.
pub trait CursorSource {
    fn cursor_position(&self) -> Result<Point, TrayMenuError>;
}

/// Native popup menu service.
pub trait MenuBackend {
    /// Handle to a loaded menu.
    type Handle: Copy + fmt::Debug + 'static;

    /// Builds a native menu from a template.
    fn load_menu(&self, template: &MenuTemplate) -> Result<Self::Handle, TrayMenuError>;

    /// Shows the popup and blocks until the user resolves it.
    ///
    /// `Ok(None)` means the menu was dismissed without a selection. An `Err`
    /// means the popup could not be shown or its result is ambiguous.
    fn track_popup(
        &self,
        menu: Self::Handle,
        placement: PopupPlacement,
        at: Point,
        owner: WindowHandle,
    ) -> Result<Option<MenuItemId>, TrayMenuError>;

    fn check_item(
        &self,
        menu: Self::Handle,
        item: MenuItemId,
        checked: bool,
    ) -> Result<(), TrayMenuError>;

    fn enable_item(
        &self,
        menu: Self::Handle,
        item: MenuItemId,
        enabled: bool,
    ) -> Result<(), TrayMenuError>;

    /// Marks `position` as the selected radio item of `first..=last` and
    /// clears the others.
    fn check_radio_item(
        &self,
        menu: Self::Handle,
        first: MenuItemId,
        last: MenuItemId,
        position: MenuItemId,
    ) -> Result<(), TrayMenuError>;

    fn destroy_menu(&self, menu: Self::Handle) -> Result<(), TrayMenuError>;
}

/// Everything the context menu needs from the OS.
pub trait Platform: WindowHost + CursorSource + MenuBackend {}

impl<T: WindowHost + CursorSource + MenuBackend> Platform for T {}
