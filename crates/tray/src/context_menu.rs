//! The tray context menu controller.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use traymux_callbacks::{MenuCallbackCookie, MenuItemId, SharedCallbacks};

use crate::binding::{self, BoolBindingEffect};
use crate::error::TrayMenuError;
use crate::platform::{
    CursorSource, HookCookie, MenuBackend, Platform, Point, PopupPlacement, WindowHost,
};
use crate::template::MenuTemplate;
use crate::trigger::TrayTrigger;

/// Value every activation hands back to the host message loop.
pub const TRAY_ACK: isize = 0;

/// Tunables for a [`TrayContextMenu`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayMenuOptions {
    #[serde(default)]
    pub placement: PopupPlacement,
}

type RefreshCallback = Rc<dyn Fn() -> Result<(), TrayMenuError>>;

struct Session<P: Platform> {
    platform: Rc<P>,
    menu: P::Handle,
    options: TrayMenuOptions,
    callbacks: SharedCallbacks,
    refresh: RefCell<Vec<RefreshCallback>>,
    last_cursor: Cell<Option<Point>>,
}

impl<P: Platform> Session<P> {
    fn on_activation(&self, trigger: TrayTrigger) -> isize {
        if !trigger.opens_menu() {
            trace!(?trigger, "ignoring tray notification");
            return TRAY_ACK;
        }

        self.run_refresh();
        let at = self.cursor_position();

        if let Err(e) = self.platform.set_foreground() {
            warn!(error = %e, "failed to set window as foreground window");
        }

        let owner = self.platform.handle();
        match self
            .platform
            .track_popup(self.menu, self.options.placement, at, owner)
        {
            Ok(Some(item)) => {
                let fired = self.callbacks.invoke_all(item);
                debug!(%item, fired, "context menu item selected");
            }
            Ok(None) => debug!("context menu dismissed"),
            Err(e) => warn!(error = %e, "failed to open context menu"),
        }

        TRAY_ACK
    }

    fn run_refresh(&self) {
        let refresh: Vec<RefreshCallback> = self.refresh.borrow().clone();
        for (index, callback) in refresh.iter().enumerate() {
            if let Err(e) = callback() {
                warn!(index, error = %e, "menu refresh callback failed");
            }
        }
    }

    fn cursor_position(&self) -> Point {
        match self.platform.cursor_position() {
            Ok(at) => {
                self.last_cursor.set(Some(at));
                at
            }
            Err(e) => {
                let fallback = self.last_cursor.get().unwrap_or_default();
                warn!(error = %e, x = fallback.x, y = fallback.y, "failed to get cursor position");
                fallback
            }
        }
    }
}

/// Owns a native popup menu and dispatches its selections.
///
/// On construction the controller loads the menu and hooks itself into the
/// window host, so the host's tray notifications reach
/// [`on_activation`](Self::on_activation). Dropping it unhooks and releases
/// the menu.
pub struct TrayContextMenu<P: Platform> {
    session: Rc<Session<P>>,
    hook: HookCookie,
}

impl<P: Platform + 'static> TrayContextMenu<P> {
    /// Loads `template` and registers with the platform's window host.
    ///
    /// Fails with [`TrayMenuError::MenuLoad`] if the menu cannot be built; no
    /// controller exists without its menu.
    pub fn new(
        platform: Rc<P>,
        template: &MenuTemplate,
        options: TrayMenuOptions,
    ) -> Result<Self, TrayMenuError> {
        let menu = template
            .validate()
            .and_then(|()| platform.load_menu(template))
            .map_err(|e| TrayMenuError::MenuLoad(Box::new(e)))?;

        let session = Rc::new(Session {
            platform: Rc::clone(&platform),
            menu,
            options,
            callbacks: SharedCallbacks::new(),
            refresh: RefCell::new(Vec::new()),
            last_cursor: Cell::new(None),
        });

        let weak: Weak<Session<P>> = Rc::downgrade(&session);
        let hook = platform.register_tray_hook(Box::new(move |trigger| {
            weak.upgrade()
                .map_or(TRAY_ACK, |session| session.on_activation(trigger))
        }));

        debug!(?menu, ?hook, "tray context menu ready");
        Ok(Self { session, hook })
    }
}

impl<P: Platform> TrayContextMenu<P> {
    /// Runs one open/refresh/dispatch cycle for a tray notification.
    ///
    /// Notifications other than button releases are ignored. Always returns
    /// [`TRAY_ACK`].
    pub fn on_activation(&self, trigger: TrayTrigger) -> isize {
        self.session.on_activation(trigger)
    }

    /// The registry item callbacks live in, for handing to feature code.
    pub fn callbacks(&self) -> SharedCallbacks {
        self.session.callbacks.clone()
    }

    pub fn register_callback<F>(&self, item: MenuItemId, action: F) -> MenuCallbackCookie
    where
        F: Fn() + 'static,
    {
        self.session.callbacks.register(item, action)
    }

    pub fn unregister_callback(&self, cookie: MenuCallbackCookie) -> bool {
        self.session.callbacks.unregister(cookie)
    }

    /// Adds a callback that runs every time the menu is about to open.
    ///
    /// Refresh callbacks live as long as the controller. A failing callback
    /// is logged and the rest still run.
    pub fn register_refresh<F>(&self, refresh: F)
    where
        F: Fn() -> Result<(), TrayMenuError> + 'static,
    {
        self.session.refresh.borrow_mut().push(Rc::new(refresh));
    }

    /// A handle to the native menu for use inside refresh callbacks.
    pub fn menu(&self) -> MenuRef<P> {
        MenuRef {
            backend: Rc::clone(&self.session.platform),
            menu: self.session.menu,
        }
    }
}

impl<P: Platform> Drop for TrayContextMenu<P> {
    fn drop(&mut self) {
        let platform = &self.session.platform;
        if !platform.unregister_tray_hook(self.hook) {
            warn!(hook = ?self.hook, "tray hook was already unregistered");
        }
        // Release even when unhooking failed.
        match platform.destroy_menu(self.session.menu) {
            Ok(()) => debug!("tray context menu destroyed"),
            Err(e) => warn!(error = %e, "failed to destroy menu"),
        }
    }
}

/// The controller's native menu, bundled with its backend.
///
/// Must not be used after the owning [`TrayContextMenu`] is dropped; the
/// backend then reports the handle as unknown.
pub struct MenuRef<B: MenuBackend> {
    backend: Rc<B>,
    menu: B::Handle,
}

impl<B: MenuBackend> Clone for MenuRef<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            menu: self.menu,
        }
    }
}

impl<B: MenuBackend> MenuRef<B> {
    pub fn handle(&self) -> B::Handle {
        self.menu
    }

    /// See [`binding::refresh_bool`].
    pub fn refresh_bool(
        &self,
        item: MenuItemId,
        value: bool,
        effect: BoolBindingEffect,
    ) -> Result<(), TrayMenuError> {
        binding::refresh_bool(&*self.backend, self.menu, item, value, effect)
    }

    /// See [`binding::refresh_enum`].
    pub fn refresh_enum(
        &self,
        first: MenuItemId,
        last: MenuItemId,
        position: MenuItemId,
    ) -> Result<(), TrayMenuError> {
        binding::refresh_enum(&*self.backend, self.menu, first, last, position)
    }

    pub fn set_checked(&self, item: MenuItemId, checked: bool) -> Result<(), TrayMenuError> {
        self.backend.check_item(self.menu, item, checked)
    }

    pub fn set_enabled(&self, item: MenuItemId, enabled: bool) -> Result<(), TrayMenuError> {
        self.backend.enable_item(self.menu, item, enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessPlatform, PlatformEvent, PopupOutcome};
    use crate::platform::HorizontalAlign;
    use crate::template::MenuEntry;

    fn template() -> MenuTemplate {
        let mut entries: Vec<MenuEntry> = (100..=103)
            .map(|id| MenuEntry::item(MenuItemId(id), format!("Option {id}")))
            .collect();
        entries.push(MenuEntry::separator());
        entries.push(MenuEntry::item(MenuItemId(42), "Answer"));
        entries.push(MenuEntry::item(MenuItemId(7), "Notifications"));
        MenuTemplate::new(entries)
    }

    fn controller() -> (Rc<HeadlessPlatform>, TrayContextMenu<HeadlessPlatform>) {
        let platform = Rc::new(HeadlessPlatform::new());
        let menu = TrayContextMenu::new(
            Rc::clone(&platform),
            &template(),
            TrayMenuOptions::default(),
        )
        .unwrap();
        (platform, menu)
    }

    fn log() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> impl Fn() + 'static {
        let log = Rc::clone(log);
        move || log.borrow_mut().push(tag)
    }

    #[test]
    fn dismissal_runs_refresh_but_no_item_callbacks() {
        let (platform, menu) = controller();
        let calls = log();
        for tag in ["refresh-1", "refresh-2", "refresh-3"] {
            let calls = Rc::clone(&calls);
            menu.register_refresh(move || {
                calls.borrow_mut().push(tag);
                Ok(())
            });
        }
        menu.register_callback(MenuItemId(42), push(&calls, "item"));
        platform.dismiss();

        let ack = platform.fire(TrayTrigger::RightButtonUp);

        assert_eq!(ack, Some(TRAY_ACK));
        assert_eq!(*calls.borrow(), ["refresh-1", "refresh-2", "refresh-3"]);
    }

    #[test]
    fn selection_fires_all_item_callbacks_in_order() {
        let (platform, menu) = controller();
        let calls = log();
        menu.register_callback(MenuItemId(42), push(&calls, "A"));
        menu.register_callback(MenuItemId(42), push(&calls, "B"));
        menu.register_callback(MenuItemId(7), push(&calls, "other"));
        platform.select(MenuItemId(42));

        assert_eq!(menu.on_activation(TrayTrigger::LeftButtonUp), TRAY_ACK);
        assert_eq!(*calls.borrow(), ["A", "B"]);
    }

    #[test]
    fn other_triggers_have_no_side_effects() {
        let (platform, menu) = controller();
        let calls = log();
        {
            let calls = Rc::clone(&calls);
            menu.register_refresh(move || {
                calls.borrow_mut().push("refresh");
                Ok(())
            });
        }
        platform.take_events();

        for trigger in [
            TrayTrigger::MouseMove,
            TrayTrigger::LeftButtonDown,
            TrayTrigger::RightButtonDown,
            TrayTrigger::LeftDoubleClick,
            TrayTrigger::ContextMenu,
            TrayTrigger::Other(0x0400),
        ] {
            assert_eq!(menu.on_activation(trigger), TRAY_ACK);
        }

        assert!(calls.borrow().is_empty());
        assert!(platform.events().is_empty());
    }

    #[test]
    fn activation_steps_run_in_order() {
        let (platform, menu) = controller();
        platform.set_cursor(Some(Point::new(640, 1050)));
        platform.take_events();

        menu.on_activation(TrayTrigger::RightButtonUp);

        assert_eq!(
            platform.events(),
            [
                PlatformEvent::ForegroundSet,
                PlatformEvent::PopupShown {
                    at: Point::new(640, 1050),
                    placement: PopupPlacement::default(),
                },
            ]
        );
    }

    #[test]
    fn failing_refresh_does_not_stop_the_rest() {
        let (platform, menu) = controller();
        let calls = log();
        menu.register_refresh(|| Err(TrayMenuError::UnknownItem(MenuItemId(1))));
        {
            let calls = Rc::clone(&calls);
            menu.register_refresh(move || {
                calls.borrow_mut().push("second");
                Ok(())
            });
        }
        menu.register_callback(MenuItemId(7), push(&calls, "item"));
        platform.select(MenuItemId(7));

        menu.on_activation(TrayTrigger::LeftButtonUp);
        assert_eq!(*calls.borrow(), ["second", "item"]);
    }

    #[test]
    fn cursor_and_foreground_failures_are_not_fatal() {
        let (platform, menu) = controller();
        let calls = log();
        menu.register_callback(MenuItemId(42), push(&calls, "item"));

        platform.set_cursor(Some(Point::new(10, 20)));
        menu.on_activation(TrayTrigger::LeftButtonUp);

        platform.set_cursor(None);
        platform.set_foreground_fails(true);
        platform.select(MenuItemId(42));
        platform.take_events();
        menu.on_activation(TrayTrigger::LeftButtonUp);

        assert_eq!(*calls.borrow(), ["item"]);
        // Last known position is reused.
        assert_eq!(
            platform.events(),
            [PlatformEvent::PopupShown {
                at: Point::new(10, 20),
                placement: PopupPlacement::default(),
            }]
        );
    }

    #[test]
    fn cursor_fallback_without_history_is_origin() {
        let (platform, menu) = controller();
        platform.set_cursor(None);
        platform.take_events();

        menu.on_activation(TrayTrigger::RightButtonUp);
        assert!(platform.events().contains(&PlatformEvent::PopupShown {
            at: Point::default(),
            placement: PopupPlacement::default(),
        }));
    }

    #[test]
    fn popup_failure_takes_dismissal_path() {
        let (platform, menu) = controller();
        let calls = log();
        menu.register_callback(MenuItemId(42), push(&calls, "item"));
        platform.queue_outcome(PopupOutcome::Fail);

        assert_eq!(menu.on_activation(TrayTrigger::RightButtonUp), TRAY_ACK);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn unregistered_callback_no_longer_fires() {
        let (platform, menu) = controller();
        let calls = log();
        let a = menu.register_callback(MenuItemId(42), push(&calls, "A"));
        menu.register_callback(MenuItemId(42), push(&calls, "B"));

        assert!(menu.unregister_callback(a));
        assert!(!menu.unregister_callback(a));
        platform.select(MenuItemId(42));
        menu.on_activation(TrayTrigger::LeftButtonUp);

        assert_eq!(*calls.borrow(), ["B"]);
    }

    #[test]
    fn shared_registry_reaches_controller() {
        let (platform, menu) = controller();
        let calls = log();
        let callbacks = menu.callbacks();
        callbacks.register(MenuItemId(7), push(&calls, "feature"));
        platform.select(MenuItemId(7));

        menu.on_activation(TrayTrigger::RightButtonUp);
        assert_eq!(*calls.borrow(), ["feature"]);
    }

    #[test]
    fn refresh_callbacks_update_menu_before_popup() {
        let (platform, menu) = controller();
        let notifications = Rc::new(Cell::new(false));
        let accent = Rc::new(Cell::new(MenuItemId(102)));
        {
            let menu_ref = menu.menu();
            let notifications = Rc::clone(&notifications);
            let accent = Rc::clone(&accent);
            menu.register_refresh(move || {
                menu_ref.refresh_bool(MenuItemId(7), notifications.get(), BoolBindingEffect::Toggle)?;
                menu_ref.refresh_enum(MenuItemId(100), MenuItemId(103), accent.get())
            });
        }
        {
            let notifications = Rc::clone(&notifications);
            menu.register_callback(MenuItemId(7), move || notifications.set(!notifications.get()));
        }

        platform.select(MenuItemId(7));
        menu.on_activation(TrayTrigger::LeftButtonUp);
        assert!(notifications.get());

        let handle = menu.menu().handle();
        // Refresh ran before the selection flipped the value.
        assert!(!platform.item_state(handle, MenuItemId(7)).unwrap().checked);
        assert!(platform.item_state(handle, MenuItemId(102)).unwrap().checked);

        menu.on_activation(TrayTrigger::LeftButtonUp);
        assert!(platform.item_state(handle, MenuItemId(7)).unwrap().checked);
    }

    #[test]
    fn placement_is_forwarded() {
        let platform = Rc::new(HeadlessPlatform::new());
        let options = TrayMenuOptions {
            placement: PopupPlacement {
                horizontal: HorizontalAlign::Right,
                ..PopupPlacement::default()
            },
        };
        let menu = TrayContextMenu::new(Rc::clone(&platform), &template(), options).unwrap();
        platform.take_events();

        menu.on_activation(TrayTrigger::LeftButtonUp);
        assert!(platform.events().iter().any(|e| matches!(
            e,
            PlatformEvent::PopupShown { placement, .. } if placement.horizontal == HorizontalAlign::Right
        )));
    }

    #[test]
    fn load_failure_is_fatal() {
        let platform = Rc::new(HeadlessPlatform::new());
        platform.set_load_fails(true);

        let err = TrayContextMenu::new(Rc::clone(&platform), &template(), TrayMenuOptions::default())
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert_eq!(platform.hook_count(), 0);
    }

    #[test]
    fn invalid_template_is_fatal() {
        let platform = Rc::new(HeadlessPlatform::new());
        let result = TrayContextMenu::new(
            Rc::clone(&platform),
            &MenuTemplate::default(),
            TrayMenuOptions::default(),
        );
        assert!(matches!(result, Err(TrayMenuError::MenuLoad(_))));
        assert_eq!(platform.live_menus(), 0);
    }

    #[test]
    fn drop_unhooks_then_destroys() {
        let (platform, menu) = controller();
        let handle = menu.menu().handle();
        platform.take_events();

        drop(menu);

        assert_eq!(platform.hook_count(), 0);
        assert!(!platform.is_loaded(handle));
        let events = platform.events();
        assert!(matches!(events[0], PlatformEvent::HookUnregistered(_)));
        assert_eq!(events[1], PlatformEvent::MenuDestroyed(handle));
        // Late notifications reach nobody.
        assert_eq!(platform.fire(TrayTrigger::LeftButtonUp), None);
    }

    #[test]
    fn drop_releases_menu_even_if_unhook_fails() {
        let (platform, menu) = controller();
        let handle = menu.menu().handle();
        // Unhook behind the controller's back.
        assert!(platform.unregister_tray_hook(menu.hook));

        drop(menu);
        assert!(!platform.is_loaded(handle));
    }

    #[test]
    fn destroy_failure_is_absorbed() {
        let (platform, menu) = controller();
        platform.set_destroy_fails(true);
        drop(menu);
        assert_eq!(platform.hook_count(), 0);
    }

    #[test]
    fn menu_ref_setters() {
        let (platform, menu) = controller();
        let menu_ref = menu.menu().clone();

        menu_ref.set_enabled(MenuItemId(42), false).unwrap();
        menu_ref.set_checked(MenuItemId(42), true).unwrap();
        let state = platform.item_state(menu_ref.handle(), MenuItemId(42)).unwrap();
        assert!(!state.enabled);
        assert!(state.checked);
    }
}
