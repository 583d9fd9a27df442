//! Line format of the host script.
//!
//! ```text
//! <trigger> [outcome]
//! ```
//!
//! - trigger: `left`, `right` (button releases), `down`, `rdown`, `double`,
//!   `move`, or a raw message number such as `0x0205`
//! - outcome: an item id, `none` (dismiss, the default) or `fail`
//!
//! `quit` ends the session. Blank lines and lines starting with `#` are
//! skipped.

use anyhow::{Context, bail};
use traymux_tray::headless::PopupOutcome;
use traymux_tray::{MenuItemId, TrayTrigger};

/// One parsed script line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Event {
        trigger: TrayTrigger,
        outcome: PopupOutcome,
    },
    Quit,
}

/// Parses a script line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> anyhow::Result<Option<HostCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };
    if first.eq_ignore_ascii_case("quit") {
        return Ok(Some(HostCommand::Quit));
    }

    let trigger = parse_trigger(first)?;
    let outcome = match words.next() {
        Some(word) => parse_outcome(word)?,
        None => PopupOutcome::Dismiss,
    };
    if let Some(extra) = words.next() {
        bail!("unexpected trailing word '{extra}'");
    }

    Ok(Some(HostCommand::Event { trigger, outcome }))
}

fn parse_trigger(word: &str) -> anyhow::Result<TrayTrigger> {
    let trigger = match word.to_ascii_lowercase().as_str() {
        "left" => TrayTrigger::LeftButtonUp,
        "right" => TrayTrigger::RightButtonUp,
        "down" => TrayTrigger::LeftButtonDown,
        "rdown" => TrayTrigger::RightButtonDown,
        "double" => TrayTrigger::LeftDoubleClick,
        "move" => TrayTrigger::MouseMove,
        other => {
            let raw = match other.strip_prefix("0x") {
                Some(hex) => u32::from_str_radix(hex, 16),
                None => other.parse(),
            }
            .with_context(|| format!("unknown trigger '{word}'"))?;
            TrayTrigger::from_message(raw)
        }
    };
    Ok(trigger)
}

fn parse_outcome(word: &str) -> anyhow::Result<PopupOutcome> {
    match word.to_ascii_lowercase().as_str() {
        "none" | "dismiss" => Ok(PopupOutcome::Dismiss),
        "fail" => Ok(PopupOutcome::Fail),
        other => {
            let id: u32 = other
                .parse()
                .with_context(|| format!("invalid outcome '{word}'"))?;
            Ok(PopupOutcome::Select(MenuItemId(id)))
        }
    }
}
