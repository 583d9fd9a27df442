//! Host loop: wires the context menu, the demo features and the script.

use std::io::BufRead;
use std::rc::Rc;

use traymux_tray::TrayContextMenu;
use traymux_tray::headless::HeadlessPlatform;

use crate::config::Config;
use crate::features::{self, Accent};
use crate::script::{self, HostCommand};

/// Feature state at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Notifications that opened the menu.
    pub activations: usize,
    pub notifications: bool,
    pub auto_update: bool,
    pub accent: Accent,
    pub exited: bool,
}

/// Runs the host until the script ends, says `quit`, or Exit is picked.
pub fn run(config: &Config, input: impl BufRead) -> anyhow::Result<RunSummary> {
    let platform = Rc::new(HeadlessPlatform::new());
    let menu = TrayContextMenu::new(Rc::clone(&platform), &config.menu, config.options)?;
    let features = features::install(&menu);
    tracing::debug!(items = config.menu_ids().len(), "tray menu installed");

    let mut activations = 0;
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let command = match script::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping script line");
                continue;
            }
        };

        let HostCommand::Event { trigger, outcome } = command else {
            tracing::info!("quit requested");
            break;
        };

        // Outcomes only matter to popups that actually open.
        if trigger.opens_menu() {
            platform.queue_outcome(outcome);
            activations += 1;
        }
        platform.fire(trigger);

        if features.state.exit_requested.get() {
            break;
        }
    }

    features.uninstall();
    let state = Rc::clone(&features.state);
    drop(features);
    drop(menu);

    Ok(RunSummary {
        activations,
        notifications: state.notifications.get(),
        auto_update: state.auto_update.get(),
        accent: state.accent.get(),
        exited: state.exit_requested.get(),
    })
}
