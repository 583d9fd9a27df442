//! Helpers that mirror feature state into menu visuals.
//!
//! Meant to be called from refresh callbacks right before the popup opens.

use traymux_callbacks::MenuItemId;

use crate::error::TrayMenuError;
use crate::platform::MenuBackend;

/// How a boolean feature value shows up on its menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolBindingEffect {
    /// Item is checked iff the value is true.
    Toggle,
    /// Item is enabled iff the value is true, grayed out otherwise.
    ControlsEnabled,
}

/// Applies a boolean value to `item` according to `effect`.
pub fn refresh_bool<B: MenuBackend + ?Sized>(
    backend: &B,
    menu: B::Handle,
    item: MenuItemId,
    value: bool,
    effect: BoolBindingEffect,
) -> Result<(), TrayMenuError> {
    match effect {
        BoolBindingEffect::Toggle => backend.check_item(menu, item, value),
        BoolBindingEffect::ControlsEnabled => backend.enable_item(menu, item, value),
    }
}

/// Selects `position` within the radio group `first..=last`.
///
/// A position outside the group (or an inverted group) leaves the menu
/// untouched and returns [`TrayMenuError::RadioOutOfRange`].
pub fn refresh_enum<B: MenuBackend + ?Sized>(
    backend: &B,
    menu: B::Handle,
    first: MenuItemId,
    last: MenuItemId,
    position: MenuItemId,
) -> Result<(), TrayMenuError> {
    if first > last || position < first || position > last {
        return Err(TrayMenuError::RadioOutOfRange {
            first,
            last,
            position,
        });
    }
    backend.check_radio_item(menu, first, last, position)
}

/// A contiguous run of item ids standing for mutually exclusive options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioGroup {
    pub first: MenuItemId,
    pub last: MenuItemId,
}

impl RadioGroup {
    pub const fn new(first: MenuItemId, last: MenuItemId) -> Self {
        Self { first, last }
    }

    /// Number of options. Wide enough for the full `0..=u32::MAX` range.
    pub fn len(&self) -> u64 {
        if self.first > self.last {
            0
        } else {
            u64::from(self.last.get() - self.first.get()) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: MenuItemId) -> bool {
        item >= self.first && item <= self.last
    }

    /// Item id of the option at `index`.
    pub fn item_at(&self, index: u32) -> Option<MenuItemId> {
        (u64::from(index) < self.len()).then(|| MenuItemId(self.first.get() + index))
    }

    /// Option index of `item`, if it belongs to the group.
    pub fn index_of(&self, item: MenuItemId) -> Option<u32> {
        self.contains(item).then(|| item.get() - self.first.get())
    }

    /// Iterates the group's item ids in order.
    pub fn items(&self) -> impl Iterator<Item = MenuItemId> + use<> {
        let (first, last) = (self.first.get(), self.last.get());
        (first..=last).map(MenuItemId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessMenu, HeadlessPlatform};
    use crate::template::{MenuEntry, MenuTemplate};

    fn radio_menu() -> (HeadlessPlatform, HeadlessMenu) {
        let platform = HeadlessPlatform::new();
        let entries = (100..=103)
            .map(|id| MenuEntry::item(MenuItemId(id), format!("Option {id}")))
            .chain([MenuEntry::item(MenuItemId(7), "Notifications")])
            .collect();
        let menu = platform.load_menu(&MenuTemplate::new(entries)).unwrap();
        (platform, menu)
    }

    fn checked(platform: &HeadlessPlatform, menu: HeadlessMenu, id: u32) -> bool {
        platform.item_state(menu, MenuItemId(id)).unwrap().checked
    }

    #[test]
    fn enum_selects_exactly_one() {
        let (platform, menu) = radio_menu();
        let (first, last) = (MenuItemId(100), MenuItemId(103));

        refresh_enum(&platform, menu, first, last, MenuItemId(101)).unwrap();
        assert!(!checked(&platform, menu, 100));
        assert!(checked(&platform, menu, 101));
        assert!(!checked(&platform, menu, 102));
        assert!(!checked(&platform, menu, 103));

        refresh_enum(&platform, menu, first, last, MenuItemId(103)).unwrap();
        let selected: Vec<u32> = (100..=103).filter(|id| checked(&platform, menu, *id)).collect();
        assert_eq!(selected, [103]);
    }

    #[test]
    fn enum_out_of_range_leaves_menu_alone() {
        let (platform, menu) = radio_menu();
        refresh_enum(&platform, menu, MenuItemId(100), MenuItemId(103), MenuItemId(102)).unwrap();

        let err = refresh_enum(&platform, menu, MenuItemId(100), MenuItemId(103), MenuItemId(104))
            .unwrap_err();
        assert!(matches!(err, TrayMenuError::RadioOutOfRange { .. }));
        assert!(checked(&platform, menu, 102));

        let inverted =
            refresh_enum(&platform, menu, MenuItemId(103), MenuItemId(100), MenuItemId(101));
        assert!(inverted.is_err());
    }

    #[test]
    fn toggle_tracks_value_idempotently() {
        let (platform, menu) = radio_menu();
        let item = MenuItemId(7);

        refresh_bool(&platform, menu, item, true, BoolBindingEffect::Toggle).unwrap();
        refresh_bool(&platform, menu, item, true, BoolBindingEffect::Toggle).unwrap();
        assert!(checked(&platform, menu, 7));

        refresh_bool(&platform, menu, item, false, BoolBindingEffect::Toggle).unwrap();
        refresh_bool(&platform, menu, item, false, BoolBindingEffect::Toggle).unwrap();
        assert!(!checked(&platform, menu, 7));
    }

    #[test]
    fn controls_enabled_grays_item() {
        let (platform, menu) = radio_menu();
        let item = MenuItemId(7);

        refresh_bool(&platform, menu, item, false, BoolBindingEffect::ControlsEnabled).unwrap();
        let state = platform.item_state(menu, item).unwrap();
        assert!(!state.enabled);
        assert!(!state.checked);

        refresh_bool(&platform, menu, item, true, BoolBindingEffect::ControlsEnabled).unwrap();
        assert!(platform.item_state(menu, item).unwrap().enabled);
    }

    #[test]
    fn bool_on_missing_item_fails() {
        let (platform, menu) = radio_menu();
        let err = refresh_bool(&platform, menu, MenuItemId(55), true, BoolBindingEffect::Toggle)
            .unwrap_err();
        assert!(matches!(err, TrayMenuError::UnknownItem(MenuItemId(55))));
    }

    #[test]
    fn radio_group_indexing() {
        let group = RadioGroup::new(MenuItemId(100), MenuItemId(103));
        assert_eq!(group.len(), 4);
        assert_eq!(group.item_at(1), Some(MenuItemId(101)));
        assert_eq!(group.item_at(4), None);
        assert_eq!(group.index_of(MenuItemId(103)), Some(3));
        assert_eq!(group.index_of(MenuItemId(99)), None);
        assert_eq!(group.items().count(), 4);

        let inverted = RadioGroup::new(MenuItemId(5), MenuItemId(4));
        assert!(inverted.is_empty());
        assert_eq!(inverted.item_at(0), None);
    }

    #[test]
    fn radio_group_spanning_every_id() {
        let group = RadioGroup::new(MenuItemId(0), MenuItemId(u32::MAX));
        assert_eq!(group.len(), 1 << 32);
        assert!(!group.is_empty());
        assert_eq!(group.item_at(u32::MAX), Some(MenuItemId(u32::MAX)));
        assert_eq!(group.index_of(MenuItemId(u32::MAX)), Some(u32::MAX));

        let single = RadioGroup::new(MenuItemId(u32::MAX), MenuItemId(u32::MAX));
        assert_eq!(single.len(), 1);
        assert_eq!(single.item_at(0), Some(MenuItemId(u32::MAX)));
        assert_eq!(single.item_at(1), None);
    }
}
