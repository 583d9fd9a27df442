//! Win32 implementation of the platform traits.
//!
//! The embedding application owns the message window and forwards the tray
//! icon's callback message to [`Win32Platform::dispatch`].

use std::cell::{Cell, RefCell};
use std::ptr;
use std::rc::Rc;

use tracing::{debug, trace};
use traymux_callbacks::MenuItemId;
use windows_sys::Win32::Foundation::{GetLastError, HWND, LPARAM, LRESULT, POINT, SetLastError};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CheckMenuItem, CheckMenuRadioItem, CreatePopupMenu, DestroyMenu, EnableMenuItem,
    GetCursorPos, HMENU, MF_BYCOMMAND, MF_CHECKED, MF_ENABLED, MF_GRAYED, MF_POPUP, MF_SEPARATOR,
    MF_STRING, MF_UNCHECKED, PostMessageW, SetForegroundWindow, TPM_BOTTOMALIGN, TPM_CENTERALIGN,
    TPM_LEFTALIGN, TPM_NONOTIFY, TPM_RETURNCMD, TPM_RIGHTALIGN, TPM_TOPALIGN, TPM_VCENTERALIGN,
    TrackPopupMenu, WM_NULL,
};

use crate::error::TrayMenuError;
use crate::platform::{
    CursorSource, HookCookie, HorizontalAlign, MenuBackend, Point, PopupPlacement, TrayHook,
    VerticalAlign, WindowHandle, WindowHost,
};
use crate::template::{MenuEntry, MenuTemplate};
use crate::trigger::TrayTrigger;

type SharedHook = Rc<dyn Fn(TrayTrigger) -> isize>;

/// Native menus and tray hooks for one message window.
pub struct Win32Platform {
    hwnd: HWND,
    hooks: RefCell<Vec<(HookCookie, SharedHook)>>,
    next_hook: Cell<u64>,
}

impl Win32Platform {
    /// Wraps the window that receives the tray icon's callback message.
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            hooks: RefCell::new(Vec::new()),
            next_hook: Cell::new(1),
        }
    }

    /// Forwards a tray callback message's `lParam` to the registered hooks.
    ///
    /// Returns `None` when no hook is registered, so the caller can fall back
    /// to `DefWindowProcW`.
    pub fn dispatch(&self, lparam: LPARAM) -> Option<LRESULT> {
        // The low word carries the mouse message for every NOTIFYICON version.
        let trigger = TrayTrigger::from_message((lparam as u32) & 0xFFFF);
        let hooks: Vec<SharedHook> = self
            .hooks
            .borrow()
            .iter()
            .map(|(_, hook)| Rc::clone(hook))
            .collect();
        hooks.iter().map(|hook| hook(trigger)).last()
    }
}

fn last_error(operation: &'static str) -> TrayMenuError {
    // SAFETY: reads thread-local state only.
    let code = unsafe { GetLastError() };
    TrayMenuError::Os { operation, code }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

fn placement_flags(placement: PopupPlacement) -> u32 {
    let horizontal = match placement.horizontal {
        HorizontalAlign::Left => TPM_LEFTALIGN,
        HorizontalAlign::Center => TPM_CENTERALIGN,
        HorizontalAlign::Right => TPM_RIGHTALIGN,
    };
    let vertical = match placement.vertical {
        VerticalAlign::Top => TPM_TOPALIGN,
        VerticalAlign::Center => TPM_VCENTERALIGN,
        VerticalAlign::Bottom => TPM_BOTTOMALIGN,
    };
    horizontal | vertical
}

/// Interprets a `TPM_RETURNCMD` result together with the last-error code
/// read right after the call.
fn popup_outcome(picked: i32, code: u32) -> Result<Option<MenuItemId>, TrayMenuError> {
    if picked != 0 {
        return Ok(Some(MenuItemId(picked as u32)));
    }
    if code != 0 {
        return Err(TrayMenuError::Os {
            operation: "TrackPopupMenu",
            code,
        });
    }
    Ok(None)
}

fn append_entries(menu: HMENU, entries: &[MenuEntry]) -> Result<(), TrayMenuError> {
    for entry in entries {
        match entry {
            MenuEntry::Item {
                id,
                label,
                enabled,
                checked,
            } => {
                let mut flags = MF_STRING;
                flags |= if *enabled { MF_ENABLED } else { MF_GRAYED };
                flags |= if *checked { MF_CHECKED } else { MF_UNCHECKED };
                let label = to_wide(label);
                // SAFETY: `label` is NUL-terminated and outlives the call.
                let ok = unsafe { AppendMenuW(menu, flags, id.get() as usize, label.as_ptr()) };
                if ok == 0 {
                    return Err(last_error("AppendMenuW"));
                }
            }
            MenuEntry::Separator => {
                // SAFETY: separators take no string.
                let ok = unsafe { AppendMenuW(menu, MF_SEPARATOR, 0, ptr::null()) };
                if ok == 0 {
                    return Err(last_error("AppendMenuW"));
                }
            }
            MenuEntry::Submenu { label, entries } => {
                // SAFETY: plain constructor.
                let submenu = unsafe { CreatePopupMenu() };
                if submenu.is_null() {
                    return Err(last_error("CreatePopupMenu"));
                }
                if let Err(e) = append_entries(submenu, entries) {
                    // SAFETY: `submenu` is not attached to anything yet.
                    unsafe { DestroyMenu(submenu) };
                    return Err(e);
                }
                let label = to_wide(label);
                // SAFETY: once attached, `submenu` is owned by `menu`.
                let ok = unsafe {
                    AppendMenuW(menu, MF_POPUP | MF_STRING, submenu as usize, label.as_ptr())
                };
                if ok == 0 {
                    let err = last_error("AppendMenuW");
                    // SAFETY: attaching failed, so `submenu` is still ours.
                    unsafe { DestroyMenu(submenu) };
                    return Err(err);
                }
            }
        }
    }
    Ok(())
}

impl WindowHost for Win32Platform {
    fn handle(&self) -> WindowHandle {
        WindowHandle(self.hwnd as isize)
    }

    fn set_foreground(&self) -> Result<(), TrayMenuError> {
        // SAFETY: an invalid window only makes the call fail.
        if unsafe { SetForegroundWindow(self.hwnd) } == 0 {
            return Err(last_error("SetForegroundWindow"));
        }
        Ok(())
    }

    fn register_tray_hook(&self, hook: TrayHook) -> HookCookie {
        let cookie = HookCookie(self.next_hook.get());
        self.next_hook.set(cookie.0 + 1);
        self.hooks.borrow_mut().push((cookie, Rc::from(hook)));
        cookie
    }

    fn unregister_tray_hook(&self, cookie: HookCookie) -> bool {
        let mut hooks = self.hooks.borrow_mut();
        let before = hooks.len();
        hooks.retain(|(c, _)| *c != cookie);
        hooks.len() != before
    }
}

impl CursorSource for Win32Platform {
    fn cursor_position(&self) -> Result<Point, TrayMenuError> {
        let mut pt = POINT { x: 0, y: 0 };
        // SAFETY: `pt` is a valid out pointer.
        if unsafe { GetCursorPos(&mut pt) } == 0 {
            return Err(last_error("GetCursorPos"));
        }
        Ok(Point::new(pt.x, pt.y))
    }
}

impl MenuBackend for Win32Platform {
    type Handle = HMENU;

    fn load_menu(&self, template: &MenuTemplate) -> Result<HMENU, TrayMenuError> {
        // SAFETY: plain constructor.
        let menu = unsafe { CreatePopupMenu() };
        if menu.is_null() {
            return Err(last_error("CreatePopupMenu"));
        }
        if let Err(e) = append_entries(menu, &template.entries) {
            // SAFETY: destroys the partial menu and any submenus attached to it.
            unsafe { DestroyMenu(menu) };
            return Err(e);
        }
        debug!(?menu, "native popup menu created");
        Ok(menu)
    }

    fn track_popup(
        &self,
        menu: HMENU,
        placement: PopupPlacement,
        at: Point,
        owner: WindowHandle,
    ) -> Result<Option<MenuItemId>, TrayMenuError> {
        let owner = owner.0 as HWND;
        let flags = TPM_RETURNCMD | TPM_NONOTIFY | placement_flags(placement);

        // SAFETY: the menu and window handles are only read by the OS; a
        // cleared last-error tells dismissal apart from failure. The error
        // is read before anything else can overwrite it.
        let (picked, code) = unsafe {
            SetLastError(0);
            let picked = TrackPopupMenu(menu, flags, at.x, at.y, 0, owner, ptr::null());
            let code = if picked == 0 { GetLastError() } else { 0 };
            // Lets the menu close properly when the user clicks elsewhere.
            PostMessageW(owner, WM_NULL, 0, 0);
            (picked, code)
        };

        let outcome = popup_outcome(picked, code);
        if let Ok(None) = outcome {
            trace!("popup dismissed");
        }
        outcome
    }

    fn check_item(&self, menu: HMENU, item: MenuItemId, checked: bool) -> Result<(), TrayMenuError> {
        let state = if checked { MF_CHECKED } else { MF_UNCHECKED };
        // SAFETY: an unknown item yields the documented failure value.
        let previous = unsafe { CheckMenuItem(menu, item.get(), MF_BYCOMMAND | state) };
        if previous == u32::MAX {
            return Err(TrayMenuError::UnknownItem(item));
        }
        Ok(())
    }

    fn enable_item(&self, menu: HMENU, item: MenuItemId, enabled: bool) -> Result<(), TrayMenuError> {
        let state = if enabled { MF_ENABLED } else { MF_GRAYED };
        // SAFETY: an unknown item yields the documented failure value.
        let previous = unsafe { EnableMenuItem(menu, item.get(), MF_BYCOMMAND | state) };
        if previous == -1 {
            return Err(TrayMenuError::UnknownItem(item));
        }
        Ok(())
    }

    fn check_radio_item(
        &self,
        menu: HMENU,
        first: MenuItemId,
        last: MenuItemId,
        position: MenuItemId,
    ) -> Result<(), TrayMenuError> {
        // SAFETY: plain call on a menu handle.
        let ok = unsafe {
            CheckMenuRadioItem(menu, first.get(), last.get(), position.get(), MF_BYCOMMAND)
        };
        if ok == 0 {
            return Err(last_error("CheckMenuRadioItem"));
        }
        Ok(())
    }

    fn destroy_menu(&self, menu: HMENU) -> Result<(), TrayMenuError> {
        // SAFETY: the caller gives up the handle.
        if unsafe { DestroyMenu(menu) } == 0 {
            return Err(last_error("DestroyMenu"));
        }
        Ok(())
    }
}
