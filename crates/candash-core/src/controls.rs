use crate::table::TableView;
use crate::ControlCommand;
use std::fmt;

/// The two acquisition channels with independent logging status.
pub const CHANNELS: [&str; 2] = ["can0", "can1"];

/// A status reading that may not have been reported yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    True,
    False,
    #[default]
    Unknown,
}

impl TriState {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TriState::True => "true",
            TriState::False => "false",
            TriState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlButton {
    StartLogging,
    StopLogging,
    EnableAuto,
    DisableAuto,
}

impl ControlButton {
    pub fn label(self) -> &'static str {
        match self {
            ControlButton::StartLogging => "Start Logging",
            ControlButton::StopLogging => "Stop Logging",
            ControlButton::EnableAuto => "Enable Auto Logging",
            ControlButton::DisableAuto => "Disable Auto Logging",
        }
    }

    pub fn command(self) -> ControlCommand {
        match self {
            ControlButton::StartLogging => ControlCommand::Start,
            ControlButton::StopLogging => ControlCommand::Stop,
            ControlButton::EnableAuto => ControlCommand::AutoOn,
            ControlButton::DisableAuto => ControlCommand::AutoOff,
        }
    }
}

/// The control affordances derived from the System table. Never stored
/// across events; always recomputed from the four well-known rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlPanel {
    pub logging: Vec<ControlButton>,
    pub autolog: Vec<ControlButton>,
    pub logging_state: [TriState; 2],
    pub autolog_state: [TriState; 2],
}

impl ControlPanel {
    /// Read back the per-channel logging and auto-log rows and compute
    /// which buttons should be visible.
    ///
    /// Auto-log is evaluated first: when fully engaged on both channels it
    /// owns the decision and manual logging controls are suppressed. Any
    /// split or unknown combination surfaces both actions rather than
    /// guessing, so a needed action is never unreachable.
    pub fn resolve(system: &TableView) -> Self {
        let logging_state = channel_states(system, "logging");
        let autolog_state = channel_states(system, "auto-log");

        let autolog = pair_buttons(
            autolog_state,
            ControlButton::EnableAuto,
            ControlButton::DisableAuto,
        );
        let auto_engaged = autolog_state == [TriState::True, TriState::True];
        let logging = if auto_engaged {
            Vec::new()
        } else {
            pair_buttons(
                logging_state,
                ControlButton::StartLogging,
                ControlButton::StopLogging,
            )
        };

        Self {
            logging,
            autolog,
            logging_state,
            autolog_state,
        }
    }

    pub fn contains(&self, button: ControlButton) -> bool {
        self.logging.contains(&button) || self.autolog.contains(&button)
    }

    pub fn auto_engaged(&self) -> bool {
        self.autolog_state == [TriState::True, TriState::True]
    }
}

fn channel_states(system: &TableView, indicator: &str) -> [TriState; 2] {
    [
        channel_state(system, CHANNELS[0], indicator),
        channel_state(system, CHANNELS[1], indicator),
    ]
}

fn channel_state(system: &TableView, channel: &str, indicator: &str) -> TriState {
    match system.row(&format!("{channel} {indicator}")) {
        Some(row) if row.flag == Some(true) => TriState::True,
        // A present row with any other value reads as false, including
        // non-boolean values such as log file names.
        Some(_) => TriState::False,
        None => TriState::Unknown,
    }
}

fn pair_buttons(
    states: [TriState; 2],
    when_idle: ControlButton,
    when_active: ControlButton,
) -> Vec<ControlButton> {
    match states {
        [TriState::True, TriState::True] => vec![when_active],
        [TriState::False, TriState::False] => vec![when_idle],
        _ => vec![when_idle, when_active],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RowUpdate;

    fn system_with(rows: &[(&str, Option<bool>)]) -> TableView {
        let mut table = TableView::new();
        table.apply(rows.iter().map(|(key, flag)| {
            let text = flag.map(|f| f.to_string()).unwrap_or_default();
            RowUpdate::new(*key, vec![key.to_string(), text]).with_flag(*flag)
        }));
        table
    }

    #[test]
    fn both_channels_logging_offers_only_stop() {
        let system = system_with(&[
            ("can0 logging", Some(true)),
            ("can1 logging", Some(true)),
        ]);
        let panel = ControlPanel::resolve(&system);
        assert_eq!(panel.logging, vec![ControlButton::StopLogging]);
    }

    #[test]
    fn split_logging_state_offers_both_actions() {
        let system = system_with(&[
            ("can0 logging", Some(true)),
            ("can1 logging", Some(false)),
        ]);
        let panel = ControlPanel::resolve(&system);
        assert_eq!(
            panel.logging,
            vec![ControlButton::StartLogging, ControlButton::StopLogging]
        );
    }

    #[test]
    fn both_channels_idle_offers_only_start() {
        let system = system_with(&[
            ("can0 logging", Some(false)),
            ("can1 logging", Some(false)),
        ]);
        let panel = ControlPanel::resolve(&system);
        assert_eq!(panel.logging, vec![ControlButton::StartLogging]);
    }

    #[test]
    fn missing_autolog_rows_surface_both_auto_actions() {
        let panel = ControlPanel::resolve(&TableView::new());
        assert_eq!(
            panel.autolog,
            vec![ControlButton::EnableAuto, ControlButton::DisableAuto]
        );
        assert_eq!(panel.autolog_state, [TriState::Unknown, TriState::Unknown]);
    }

    #[test]
    fn fully_engaged_autolog_suppresses_manual_controls() {
        let system = system_with(&[
            ("can0 logging", Some(true)),
            ("can1 logging", Some(true)),
            ("can0 auto-log", Some(true)),
            ("can1 auto-log", Some(true)),
        ]);
        let panel = ControlPanel::resolve(&system);
        assert!(panel.auto_engaged());
        assert_eq!(panel.autolog, vec![ControlButton::DisableAuto]);
        assert!(panel.logging.is_empty());
    }

    #[test]
    fn disabled_autolog_offers_enable_and_leaves_manual_controls() {
        let system = system_with(&[
            ("can0 logging", Some(false)),
            ("can1 logging", Some(false)),
            ("can0 auto-log", Some(false)),
            ("can1 auto-log", Some(false)),
        ]);
        let panel = ControlPanel::resolve(&system);
        assert_eq!(panel.autolog, vec![ControlButton::EnableAuto]);
        assert_eq!(panel.logging, vec![ControlButton::StartLogging]);
    }

    #[test]
    fn present_non_boolean_row_reads_as_false() {
        let system = system_with(&[
            ("can0 logging", None),
            ("can1 logging", Some(false)),
        ]);
        let panel = ControlPanel::resolve(&system);
        assert_eq!(panel.logging_state, [TriState::False, TriState::False]);
        assert_eq!(panel.logging, vec![ControlButton::StartLogging]);
    }

    #[test]
    fn buttons_map_to_wire_commands() {
        assert_eq!(ControlButton::StartLogging.command(), ControlCommand::Start);
        assert_eq!(ControlButton::StopLogging.command(), ControlCommand::Stop);
        assert_eq!(ControlButton::EnableAuto.command(), ControlCommand::AutoOn);
        assert_eq!(ControlButton::DisableAuto.command(), ControlCommand::AutoOff);
    }
}
