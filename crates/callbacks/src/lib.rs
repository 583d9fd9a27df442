//! Callback registry for tray context menu items.
//!
//! Feature owners attach any number of independent actions to a menu item
//! and get back a [`MenuCallbackCookie`] for each. A cookie revokes exactly
//! the registration it was issued for, leaving the other actions on the same
//! item untouched.
//!
//! - [`CallbackRegistry`]: the plain table, owned by whoever drives the menu
//! - [`SharedCallbacks`]: a cloneable handle to a registry, handed out to
//!   feature initialization code
//!
//! # Threading
//!
//! Registry operations are not safe for concurrent use from several threads.
//! Everything here is expected to run on the thread that owns the host
//! message loop; [`SharedCallbacks`] is `!Send` so the compiler holds callers
//! to that.

mod cookie;
mod registry;
mod shared;

pub use cookie::{MenuCallbackCookie, MenuItemId};
pub use registry::{CallbackRegistry, MenuCallback};
pub use shared::SharedCallbacks;
