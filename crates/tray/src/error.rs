//! Error types for the tray context menu.

use traymux_callbacks::MenuItemId;

/// Errors produced by the context menu and its platform backends.
///
/// Only [`TrayMenuError::MenuLoad`] ever escapes the controller; everything
/// else is logged and absorbed during an activation.
#[derive(Debug, thiserror::Error)]
pub enum TrayMenuError {
    #[error("failed to load context menu: {0}")]
    MenuLoad(#[source] Box<TrayMenuError>),

    #[error("invalid menu template: {0}")]
    InvalidTemplate(String),

    #[error("{operation} failed (os error {code})")]
    Os { operation: &'static str, code: u32 },

    #[error("radio position {position} outside {first}..={last}")]
    RadioOutOfRange {
        first: MenuItemId,
        last: MenuItemId,
        position: MenuItemId,
    },

    #[error("unknown menu handle")]
    UnknownMenu,

    #[error("menu item {0} not found")]
    UnknownItem(MenuItemId),
}

impl TrayMenuError {
    /// Whether this error aborts controller construction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MenuLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_load_is_the_only_fatal_kind() {
        let fatal = TrayMenuError::MenuLoad(Box::new(TrayMenuError::UnknownMenu));
        assert!(fatal.is_fatal());
        assert!(!TrayMenuError::UnknownMenu.is_fatal());
        assert!(
            !TrayMenuError::Os {
                operation: "GetCursorPos",
                code: 5
            }
            .is_fatal()
        );
    }

    #[test]
    fn messages_name_the_failure() {
        let err = TrayMenuError::Os {
            operation: "TrackPopupMenu",
            code: 1401,
        };
        assert_eq!(err.to_string(), "TrackPopupMenu failed (os error 1401)");

        let err = TrayMenuError::RadioOutOfRange {
            first: MenuItemId(100),
            last: MenuItemId(103),
            position: MenuItemId(110),
        };
        assert_eq!(err.to_string(), "radio position 110 outside 100..=103");
    }

    #[test]
    fn menu_load_keeps_source() {
        use std::error::Error;

        let err = TrayMenuError::MenuLoad(Box::new(TrayMenuError::InvalidTemplate(
            "menu has no entries".into(),
        )));
        assert!(err.to_string().contains("menu has no entries"));
        assert!(err.source().is_some());
    }
}
