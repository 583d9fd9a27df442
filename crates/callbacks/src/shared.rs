//! Cloneable single-thread handle to a [`CallbackRegistry`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::cookie::{MenuCallbackCookie, MenuItemId};
use crate::registry::CallbackRegistry;

/// Shared access to one registry from several feature owners.
///
/// Actions are snapshotted before they run, so an action may register or
/// unregister callbacks (including itself) without tripping a borrow.
/// Registrations added during a dispatch first fire on the next one; those
/// removed during a dispatch are skipped if they have not run yet.
#[derive(Debug, Clone, Default)]
pub struct SharedCallbacks {
    inner: Rc<RefCell<CallbackRegistry>>,
}

impl SharedCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing registry.
    pub fn from_registry(registry: CallbackRegistry) -> Self {
        Self {
            inner: Rc::new(RefCell::new(registry)),
        }
    }

    pub fn register<F>(&self, item: MenuItemId, action: F) -> MenuCallbackCookie
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().register(item, action)
    }

    pub fn unregister(&self, cookie: MenuCallbackCookie) -> bool {
        self.inner.borrow_mut().unregister(cookie)
    }

    /// Runs the actions registered on `item` at the moment of the call,
    /// skipping any that an earlier action unregistered.
    ///
    /// Returns how many actions ran.
    pub fn invoke_all(&self, item: MenuItemId) -> usize {
        let snapshot = self.inner.borrow().callbacks_for(item);
        let mut ran = 0;
        for (cookie, action) in snapshot {
            if !self.inner.borrow().is_registered(cookie) {
                continue;
            }
            action();
            ran += 1;
        }
        ran
    }

    pub fn callback_count(&self, item: MenuItemId) -> usize {
        self.inner.borrow().callback_count(item)
    }
}
