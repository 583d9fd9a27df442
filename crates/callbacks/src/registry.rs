//! Item-keyed table of revocable callbacks.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::trace;

use crate::cookie::{MenuCallbackCookie, MenuItemId};

/// A zero-argument action attached to a menu item.
pub type MenuCallback = Rc<dyn Fn()>;

struct Entry {
    secret: u64,
    action: MenuCallback,
}

/// Maps menu items to the actions registered on them.
///
/// Actions on one item run in registration order until something is
/// unregistered; removal swaps the last entry into the freed slot, so the
/// relative order of the survivors may change. All of them still fire.
pub struct CallbackRegistry {
    entries: HashMap<MenuItemId, Vec<Entry>>,
    rng: StdRng,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.entries.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("CallbackRegistry")
            .field("entries", &counts)
            .finish_non_exhaustive()
    }
}

impl CallbackRegistry {
    /// Creates an empty registry seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty registry with a deterministic secret sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: HashMap::new(),
            rng,
        }
    }

    /// Attaches `action` to `item` and returns the cookie that revokes it.
    pub fn register<F>(&mut self, item: MenuItemId, action: F) -> MenuCallbackCookie
    where
        F: Fn() + 'static,
    {
        self.register_shared(item, Rc::new(action))
    }

    /// Like [`register`](Self::register) for an action that is already shared.
    pub fn register_shared(&mut self, item: MenuItemId, action: MenuCallback) -> MenuCallbackCookie {
        let secret = self.fresh_secret(item);
        self.entries
            .entry(item)
            .or_default()
            .push(Entry { secret, action });

        trace!(%item, "menu callback registered");
        MenuCallbackCookie::new(secret, item)
    }

    /// Removes the registration `cookie` refers to.
    ///
    /// Returns `false` when nothing matches: the cookie was already used, or
    /// was never issued for this registry.
    pub fn unregister(&mut self, cookie: MenuCallbackCookie) -> bool {
        let item = cookie.item();
        let Some(callbacks) = self.entries.get_mut(&item) else {
            return false;
        };

        let Some(index) = callbacks.iter().position(|e| e.secret == cookie.secret()) else {
            return false;
        };

        callbacks.swap_remove(index);
        if callbacks.is_empty() {
            // Drop the slot so an emptied item looks exactly like one that
            // never had registrations.
            self.entries.remove(&item);
        }

        trace!(%item, "menu callback unregistered");
        true
    }

    /// Runs every action currently registered on `item`, in table order.
    ///
    /// Returns how many actions ran. Unknown items are a no-op.
    pub fn invoke_all(&self, item: MenuItemId) -> usize {
        let Some(callbacks) = self.entries.get(&item) else {
            return 0;
        };

        for entry in callbacks {
            (entry.action)();
        }
        callbacks.len()
    }

    /// Returns a snapshot of the registrations on `item`.
    ///
    /// Lets a caller release its borrow of the registry before running them.
    /// The cookies allow checking [`is_registered`](Self::is_registered)
    /// right before each call.
    pub fn callbacks_for(&self, item: MenuItemId) -> Vec<(MenuCallbackCookie, MenuCallback)> {
        self.entries
            .get(&item)
            .map(|callbacks| {
                callbacks
                    .iter()
                    .map(|e| (MenuCallbackCookie::new(e.secret, item), Rc::clone(&e.action)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `cookie` still refers to a live registration.
    pub fn is_registered(&self, cookie: MenuCallbackCookie) -> bool {
        self.entries
            .get(&cookie.item())
            .is_some_and(|callbacks| callbacks.iter().any(|e| e.secret == cookie.secret()))
    }

    /// Number of live registrations on `item`.
    pub fn callback_count(&self, item: MenuItemId) -> usize {
        self.entries.get(&item).map_or(0, Vec::len)
    }

    /// Whether any item has a live registration.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh_secret(&mut self, item: MenuItemId) -> u64 {
        loop {
            let secret = self.rng.next_u64();
            let taken = self
                .entries
                .get(&item)
                .is_some_and(|callbacks| callbacks.iter().any(|e| e.secret == secret));
            if !taken {
                return secret;
            }
        }
    }
}
