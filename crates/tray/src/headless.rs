//! In-memory platform for tests and scripted hosts.
//!
//! Keeps menu state in plain maps, answers popups from a queue of scripted
//! outcomes and records every OS-visible step as a [`PlatformEvent`].

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use tracing::trace;
use traymux_callbacks::MenuItemId;

use crate::error::TrayMenuError;
use crate::platform::{
    CursorSource, HookCookie, MenuBackend, Point, PopupPlacement, TrayHook, WindowHandle,
    WindowHost,
};
use crate::template::{MenuEntry, MenuTemplate};
use crate::trigger::TrayTrigger;

/// Error code reported for a scripted popup failure.
pub const POPUP_FAILURE_CODE: u32 = 1401;

/// Error code reported for a scripted load failure.
pub const LOAD_FAILURE_CODE: u32 = 1813;

/// Handle to a headless menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessMenu(u64);

/// Visual state of one menu item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemState {
    pub checked: bool,
    pub enabled: bool,
    /// Set once the item took part in a radio check.
    pub radio: bool,
}

/// What the next popup will report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupOutcome {
    Select(MenuItemId),
    Dismiss,
    Fail,
}

/// An OS-visible step taken through the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    MenuLoaded(HeadlessMenu),
    MenuDestroyed(HeadlessMenu),
    HookRegistered(HookCookie),
    HookUnregistered(HookCookie),
    ForegroundSet,
    PopupShown {
        at: Point,
        placement: PopupPlacement,
    },
}

type SharedHook = Rc<dyn Fn(TrayTrigger) -> isize>;

/// Scriptable stand-in for the OS.
pub struct HeadlessPlatform {
    window: WindowHandle,
    next_id: Cell<u64>,
    menus: RefCell<HashMap<HeadlessMenu, HashMap<MenuItemId, ItemState>>>,
    hooks: RefCell<Vec<(HookCookie, SharedHook)>>,
    outcomes: RefCell<VecDeque<PopupOutcome>>,
    cursor: Cell<Option<Point>>,
    foreground_fails: Cell<bool>,
    load_fails: Cell<bool>,
    destroy_fails: Cell<bool>,
    events: RefCell<Vec<PlatformEvent>>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeadlessPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPlatform")
            .field("window", &self.window)
            .field("menus", &self.menus.borrow().len())
            .field("hooks", &self.hooks.borrow().len())
            .field("pending_outcomes", &self.outcomes.borrow().len())
            .finish_non_exhaustive()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            window: WindowHandle(1),
            next_id: Cell::new(1),
            menus: RefCell::new(HashMap::new()),
            hooks: RefCell::new(Vec::new()),
            outcomes: RefCell::new(VecDeque::new()),
            cursor: Cell::new(Some(Point::default())),
            foreground_fails: Cell::new(false),
            load_fails: Cell::new(false),
            destroy_fails: Cell::new(false),
            events: RefCell::new(Vec::new()),
        }
    }

    /// Queues the result of a future popup. With an empty queue popups are
    /// dismissed.
    pub fn queue_outcome(&self, outcome: PopupOutcome) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    pub fn select(&self, item: MenuItemId) {
        self.queue_outcome(PopupOutcome::Select(item));
    }

    pub fn dismiss(&self) {
        self.queue_outcome(PopupOutcome::Dismiss);
    }

    /// Sets the cursor position. `None` makes reads fail.
    pub fn set_cursor(&self, at: Option<Point>) {
        self.cursor.set(at);
    }

    pub fn set_foreground_fails(&self, fails: bool) {
        self.foreground_fails.set(fails);
    }

    pub fn set_load_fails(&self, fails: bool) {
        self.load_fails.set(fails);
    }

    pub fn set_destroy_fails(&self, fails: bool) {
        self.destroy_fails.set(fails);
    }

    pub fn item_state(&self, menu: HeadlessMenu, item: MenuItemId) -> Option<ItemState> {
        self.menus.borrow().get(&menu)?.get(&item).copied()
    }

    pub fn is_loaded(&self, menu: HeadlessMenu) -> bool {
        self.menus.borrow().contains_key(&menu)
    }

    pub fn live_menus(&self) -> usize {
        self.menus.borrow().len()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }

    /// Delivers a tray notification to every registered hook, the way a
    /// window procedure would.
    ///
    /// Returns the last hook's result, or `None` without hooks.
    pub fn fire(&self, trigger: TrayTrigger) -> Option<isize> {
        let hooks: Vec<SharedHook> = self
            .hooks
            .borrow()
            .iter()
            .map(|(_, hook)| Rc::clone(hook))
            .collect();
        hooks.iter().map(|hook| hook(trigger)).last()
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<PlatformEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn record(&self, event: PlatformEvent) {
        trace!(?event, "headless platform");
        self.events.borrow_mut().push(event);
    }

    fn with_item<T>(
        &self,
        menu: HeadlessMenu,
        item: MenuItemId,
        f: impl FnOnce(&mut ItemState) -> T,
    ) -> Result<T, TrayMenuError> {
        let mut menus = self.menus.borrow_mut();
        let items = menus.get_mut(&menu).ok_or(TrayMenuError::UnknownMenu)?;
        let state = items.get_mut(&item).ok_or(TrayMenuError::UnknownItem(item))?;
        Ok(f(state))
    }
}

fn flatten(entries: &[MenuEntry], items: &mut HashMap<MenuItemId, ItemState>) {
    for entry in entries {
        match entry {
            MenuEntry::Item {
                id,
                enabled,
                checked,
                ..
            } => {
                items.insert(
                    *id,
                    ItemState {
                        checked: *checked,
                        enabled: *enabled,
                        radio: false,
                    },
                );
            }
            MenuEntry::Separator => {}
            MenuEntry::Submenu { entries, .. } => flatten(entries, items),
        }
    }
}

impl WindowHost for HeadlessPlatform {
    fn handle(&self) -> WindowHandle {
        self.window
    }

    fn set_foreground(&self) -> Result<(), TrayMenuError> {
        if self.foreground_fails.get() {
            return Err(TrayMenuError::Os {
                operation: "SetForegroundWindow",
                code: 0,
            });
        }
        self.record(PlatformEvent::ForegroundSet);
        Ok(())
    }

    fn register_tray_hook(&self, hook: TrayHook) -> HookCookie {
        let cookie = HookCookie(self.next_id());
        self.hooks.borrow_mut().push((cookie, Rc::from(hook)));
        self.record(PlatformEvent::HookRegistered(cookie));
        cookie
    }

    fn unregister_tray_hook(&self, cookie: HookCookie) -> bool {
        let mut hooks = self.hooks.borrow_mut();
        let Some(index) = hooks.iter().position(|(c, _)| *c == cookie) else {
            return false;
        };
        hooks.remove(index);
        drop(hooks);
        self.record(PlatformEvent::HookUnregistered(cookie));
        true
    }
}

impl CursorSource for HeadlessPlatform {
    fn cursor_position(&self) -> Result<Point, TrayMenuError> {
        self.cursor.get().ok_or(TrayMenuError::Os {
            operation: "GetCursorPos",
            code: 5,
        })
    }
}

impl MenuBackend for HeadlessPlatform {
    type Handle = HeadlessMenu;

    fn load_menu(&self, template: &MenuTemplate) -> Result<HeadlessMenu, TrayMenuError> {
        if self.load_fails.get() {
            return Err(TrayMenuError::Os {
                operation: "LoadMenu",
                code: LOAD_FAILURE_CODE,
            });
        }
        let mut items = HashMap::new();
        flatten(&template.entries, &mut items);

        let menu = HeadlessMenu(self.next_id());
        self.menus.borrow_mut().insert(menu, items);
        self.record(PlatformEvent::MenuLoaded(menu));
        Ok(menu)
    }

    fn track_popup(
        &self,
        menu: HeadlessMenu,
        placement: PopupPlacement,
        at: Point,
        _owner: WindowHandle,
    ) -> Result<Option<MenuItemId>, TrayMenuError> {
        if !self.is_loaded(menu) {
            return Err(TrayMenuError::UnknownMenu);
        }
        self.record(PlatformEvent::PopupShown { at, placement });

        let outcome = self
            .outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(PopupOutcome::Dismiss);
        match outcome {
            PopupOutcome::Select(item) => {
                // Like a native popup, missing or grayed items cannot be picked.
                let selectable = self
                    .item_state(menu, item)
                    .is_some_and(|state| state.enabled);
                if selectable {
                    Ok(Some(item))
                } else {
                    trace!(%item, "scripted selection not selectable, dismissing");
                    Ok(None)
                }
            }
            PopupOutcome::Dismiss => Ok(None),
            PopupOutcome::Fail => Err(TrayMenuError::Os {
                operation: "TrackPopupMenu",
                code: POPUP_FAILURE_CODE,
            }),
        }
    }

    fn check_item(
        &self,
        menu: HeadlessMenu,
        item: MenuItemId,
        checked: bool,
    ) -> Result<(), TrayMenuError> {
        self.with_item(menu, item, |state| state.checked = checked)
    }

    fn enable_item(
        &self,
        menu: HeadlessMenu,
        item: MenuItemId,
        enabled: bool,
    ) -> Result<(), TrayMenuError> {
        self.with_item(menu, item, |state| state.enabled = enabled)
    }

    fn check_radio_item(
        &self,
        menu: HeadlessMenu,
        first: MenuItemId,
        last: MenuItemId,
        position: MenuItemId,
    ) -> Result<(), TrayMenuError> {
        let mut menus = self.menus.borrow_mut();
        let items = menus.get_mut(&menu).ok_or(TrayMenuError::UnknownMenu)?;
        if !items.contains_key(&position) {
            return Err(TrayMenuError::UnknownItem(position));
        }
        for (id, state) in items.iter_mut() {
            if *id >= first && *id <= last {
                state.checked = *id == position;
                state.radio = true;
            }
        }
        Ok(())
    }

    fn destroy_menu(&self, menu: HeadlessMenu) -> Result<(), TrayMenuError> {
        if self.destroy_fails.get() {
            return Err(TrayMenuError::Os {
                operation: "DestroyMenu",
                code: 1401,
            });
        }
        if self.menus.borrow_mut().remove(&menu).is_none() {
            return Err(TrayMenuError::UnknownMenu);
        }
        self.record(PlatformEvent::MenuDestroyed(menu));
        Ok(())
    }
}
