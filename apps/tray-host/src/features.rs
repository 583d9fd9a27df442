//! Demo features wired into the context menu.
//!
//! Each feature owns its state, registers a refresh callback that mirrors
//! the state into the menu, and registers item callbacks through the shared
//! registry like an independent module would.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use traymux_tray::{
    BoolBindingEffect, MenuCallbackCookie, MenuItemId, Platform, RadioGroup, SharedCallbacks,
    TrayContextMenu,
};

pub const SHOW_NOTIFICATIONS: MenuItemId = MenuItemId(100);
pub const AUTO_UPDATE: MenuItemId = MenuItemId(101);
pub const ACCENT_GROUP: RadioGroup = RadioGroup::new(MenuItemId(200), MenuItemId(202));
pub const EXIT: MenuItemId = MenuItemId(900);

/// Accent color choices, in menu order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accent {
    #[default]
    Blue,
    Green,
    Purple,
}

impl Accent {
    const ALL: [Accent; 3] = [Accent::Blue, Accent::Green, Accent::Purple];

    fn index(self) -> u32 {
        self as u32
    }

    fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// State shared between the features and the host loop.
#[derive(Debug)]
pub struct FeatureState {
    pub notifications: Cell<bool>,
    pub notification_toggles: Cell<u32>,
    pub auto_update: Cell<bool>,
    pub accent: Cell<Accent>,
    pub exit_requested: Cell<bool>,
}

impl Default for FeatureState {
    fn default() -> Self {
        Self {
            notifications: Cell::new(true),
            notification_toggles: Cell::new(0),
            auto_update: Cell::new(false),
            accent: Cell::new(Accent::default()),
            exit_requested: Cell::new(false),
        }
    }
}

/// Handle to the installed features.
pub struct Features {
    pub state: Rc<FeatureState>,
    callbacks: SharedCallbacks,
    cookies: Rc<RefCell<Vec<MenuCallbackCookie>>>,
}

impl Features {
    /// Unregisters every item callback the features added. Idempotent.
    pub fn uninstall(&self) -> usize {
        release(&self.callbacks, &self.cookies)
    }
}

fn release(callbacks: &SharedCallbacks, cookies: &RefCell<Vec<MenuCallbackCookie>>) -> usize {
    let cookies: Vec<_> = cookies.borrow_mut().drain(..).collect();
    cookies
        .into_iter()
        .filter(|cookie| callbacks.unregister(*cookie))
        .count()
}

/// Registers all demo features on `menu`.
pub fn install<P: Platform + 'static>(menu: &TrayContextMenu<P>) -> Features {
    let state = Rc::new(FeatureState::default());
    let callbacks = menu.callbacks();
    let cookies: Rc<RefCell<Vec<MenuCallbackCookie>>> = Rc::new(RefCell::new(Vec::new()));
    let track = |cookie: MenuCallbackCookie| cookies.borrow_mut().push(cookie);

    // -- Notifications --
    {
        let menu_ref = menu.menu();
        let state = Rc::clone(&state);
        menu.register_refresh(move || {
            menu_ref.refresh_bool(
                SHOW_NOTIFICATIONS,
                state.notifications.get(),
                BoolBindingEffect::Toggle,
            )
        });
    }
    {
        let state = Rc::clone(&state);
        track(callbacks.register(SHOW_NOTIFICATIONS, move || {
            state.notifications.set(!state.notifications.get());
            tracing::info!(enabled = state.notifications.get(), "notifications toggled");
        }));
    }
    {
        // Independent listener on the same item.
        let state = Rc::clone(&state);
        track(callbacks.register(SHOW_NOTIFICATIONS, move || {
            state
                .notification_toggles
                .set(state.notification_toggles.get() + 1);
        }));
    }

    // -- Auto update (only available with notifications on) --
    {
        let menu_ref = menu.menu();
        let state = Rc::clone(&state);
        menu.register_refresh(move || {
            menu_ref.refresh_bool(AUTO_UPDATE, state.auto_update.get(), BoolBindingEffect::Toggle)?;
            menu_ref.refresh_bool(
                AUTO_UPDATE,
                state.notifications.get(),
                BoolBindingEffect::ControlsEnabled,
            )
        });
    }
    {
        let state = Rc::clone(&state);
        track(callbacks.register(AUTO_UPDATE, move || {
            state.auto_update.set(!state.auto_update.get());
            tracing::info!(enabled = state.auto_update.get(), "auto update toggled");
        }));
    }

    // -- Accent --
    {
        let menu_ref = menu.menu();
        let state = Rc::clone(&state);
        menu.register_refresh(move || {
            let selected = ACCENT_GROUP
                .item_at(state.accent.get().index())
                .unwrap_or(ACCENT_GROUP.first);
            menu_ref.refresh_enum(ACCENT_GROUP.first, ACCENT_GROUP.last, selected)
        });
    }
    for item in ACCENT_GROUP.items() {
        let state = Rc::clone(&state);
        track(callbacks.register(item, move || {
            if let Some(accent) = ACCENT_GROUP.index_of(item).and_then(Accent::from_index) {
                state.accent.set(accent);
                tracing::info!(?accent, "accent changed");
            }
        }));
    }

    // -- Exit --
    {
        let state = Rc::clone(&state);
        let inner_callbacks = callbacks.clone();
        let inner_cookies = Rc::clone(&cookies);
        track(callbacks.register(EXIT, move || {
            state.exit_requested.set(true);
            let released = release(&inner_callbacks, &inner_cookies);
            tracing::info!(released, "exit requested");
        }));
    }

    Features {
        state,
        callbacks,
        cookies,
    }
}
