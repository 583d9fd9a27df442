//! Decoding of tray icon notifications.

const WM_CONTEXTMENU: u32 = 0x007B;
const WM_MOUSEMOVE: u32 = 0x0200;
const WM_LBUTTONDOWN: u32 = 0x0201;
const WM_LBUTTONUP: u32 = 0x0202;
const WM_LBUTTONDBLCLK: u32 = 0x0203;
const WM_RBUTTONDOWN: u32 = 0x0204;
const WM_RBUTTONUP: u32 = 0x0205;

/// A notification delivered by the tray icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayTrigger {
    LeftButtonDown,
    LeftButtonUp,
    LeftDoubleClick,
    RightButtonDown,
    RightButtonUp,
    ContextMenu,
    MouseMove,
    Other(u32),
}

impl TrayTrigger {
    /// Decodes the mouse message a tray icon callback carries.
    pub fn from_message(message: u32) -> Self {
        match message {
            WM_LBUTTONDOWN => Self::LeftButtonDown,
            WM_LBUTTONUP => Self::LeftButtonUp,
            WM_LBUTTONDBLCLK => Self::LeftDoubleClick,
            WM_RBUTTONDOWN => Self::RightButtonDown,
            WM_RBUTTONUP => Self::RightButtonUp,
            WM_CONTEXTMENU => Self::ContextMenu,
            WM_MOUSEMOVE => Self::MouseMove,
            other => Self::Other(other),
        }
    }

    /// Whether this notification opens the context menu.
    ///
    /// Only primary and secondary button releases do.
    pub fn opens_menu(self) -> bool {
        matches!(self, Self::LeftButtonUp | Self::RightButtonUp)
    }
}
