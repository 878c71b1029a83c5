use candash_core::format::{format_value, fps_key, system_key, vehicle_key};
use candash_core::{
    ControlButton, ControlCommand, ControlPanel, RowUpdate, StatsPayload, SystemStat, TableView,
    VehicleStatsPayload,
};
use crossterm::event::{KeyCode, KeyEvent};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::warn;

const MESSAGE_LOG_CAPACITY: usize = 200;

/// The one source of truth for control key bindings; input handling and
/// the rendered hints both read from it.
pub const CONTROL_KEYS: [(char, ControlButton); 4] = [
    ('l', ControlButton::StartLogging),
    ('L', ControlButton::StopLogging),
    ('a', ControlButton::EnableAuto),
    ('A', ControlButton::DisableAuto),
];

pub fn control_key(button: ControlButton) -> char {
    CONTROL_KEYS
        .iter()
        .find(|(_, bound)| *bound == button)
        .map(|(key, _)| *key)
        .unwrap_or(' ')
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub username: String,
}

/// Already-deserialized events delivered by the transport task.
#[derive(Debug)]
pub enum StreamEvent {
    Connected,
    ConnectError { message: String },
    Disconnected,
    Stats(StatsPayload),
    VehicleStats(VehicleStatsPayload),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Connection {
    #[default]
    Disconnected,
    Connected,
    Errored {
        message: String,
    },
}

impl Connection {
    pub fn label(&self) -> String {
        match self {
            Connection::Disconnected => "Disconnected".to_string(),
            Connection::Connected => "Connected".to_string(),
            Connection::Errored { message } => format!("Error: {message}"),
        }
    }
}

pub struct App {
    pub config: Config,
    pub connection: Connection,
    pub fps_table: TableView,
    pub system_table: TableView,
    pub vehicle_table: TableView,
    pub controls: ControlPanel,
    pub messages: Vec<String>,
    pub status_note: Option<String>,
    pub show_help: bool,
    command_tx: mpsc::Sender<ControlCommand>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, command_tx: mpsc::Sender<ControlCommand>) -> Self {
        Self {
            config,
            connection: Connection::Disconnected,
            fps_table: TableView::new(),
            system_table: TableView::new(),
            vehicle_table: TableView::new(),
            controls: ControlPanel::default(),
            messages: Vec::new(),
            status_note: None,
            show_help: false,
            command_tx,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Route one inbound event. All table reconciliation and control
    /// resolution completes synchronously here, so the renderer never
    /// observes a half-updated view.
    pub fn apply_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected => {
                self.connection = Connection::Connected;
            }
            StreamEvent::ConnectError { message } => {
                // Transient: reconnection may be in progress, so visible
                // data is kept.
                self.connection = Connection::Errored { message };
            }
            StreamEvent::Disconnected => {
                self.connection = Connection::Disconnected;
                self.fps_table.clear();
                self.system_table.clear();
                self.vehicle_table.clear();
                self.controls = ControlPanel::resolve(&self.system_table);
            }
            StreamEvent::Stats(payload) => {
                if let Some(fps) = payload.fps {
                    self.apply_fps(fps);
                }
                if let Some(system) = payload.system {
                    self.apply_system(system);
                }
            }
            StreamEvent::VehicleStats(payload) => self.apply_vehicle(payload),
            StreamEvent::Message(text) => self.push_message(text),
        }
    }

    fn apply_fps(&mut self, fps: HashMap<String, f64>) {
        let updates = fps.into_iter().map(|(channel, count)| {
            let cells = vec![channel.clone(), format_value(&Value::from(count), None, None)];
            RowUpdate::new(fps_key(&channel), cells)
        });
        self.fps_table.apply(updates);
    }

    fn apply_system(&mut self, system: HashMap<String, SystemStat>) {
        let updates = system.into_iter().map(|(item, stat)| {
            let flag = stat.as_flag();
            let cells = vec![item.clone(), format_value(stat.value(), None, stat.unit())];
            RowUpdate::new(system_key(&item), cells).with_flag(flag)
        });
        self.system_table.apply(updates);
        self.controls = ControlPanel::resolve(&self.system_table);
    }

    fn apply_vehicle(&mut self, payload: VehicleStatsPayload) {
        let mut updates = Vec::new();
        for (message_id, message) in payload {
            for (signal_id, signal) in message.data {
                let cells = vec![
                    message_id.clone(),
                    signal_id.clone(),
                    format_value(signal.value(), signal.name(), signal.unit()),
                ];
                updates.push(RowUpdate::new(vehicle_key(&message_id, &signal_id), cells));
            }
        }
        self.vehicle_table.apply(updates);
    }

    fn push_message(&mut self, text: String) {
        self.messages.push(text);
        if self.messages.len() > MESSAGE_LOG_CAPACITY {
            let excess = self.messages.len() - MESSAGE_LOG_CAPACITY;
            self.messages.drain(..excess);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
            }
            KeyCode::Char(pressed) => {
                if let Some((_, button)) =
                    CONTROL_KEYS.iter().find(|(key, _)| *key == pressed)
                {
                    self.trigger(*button);
                }
            }
            _ => {}
        }
    }

    fn trigger(&mut self, button: ControlButton) {
        if !self.controls.contains(button) {
            self.status_note = Some(format!("{} not available", button.label()));
            return;
        }
        self.send_control(button.command());
    }

    /// Queue a control command for the transport task. No local state
    /// changes here: the visible effect arrives when the server echoes
    /// updated System rows back through the stream.
    pub fn send_control(&mut self, command: ControlCommand) {
        if !matches!(self.connection, Connection::Connected) {
            self.status_note = Some("server offline; control unavailable".to_string());
            return;
        }
        match self.command_tx.try_send(command) {
            Ok(()) => {
                self.status_note = Some(format!("{command} sent"));
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(event = "control_queue_drop", reason = "queue_full", %command);
                self.status_note = Some("command queue full".to_string());
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(event = "control_queue_drop", reason = "channel_closed", %command);
                self.status_note = Some("command channel closed".to_string());
            }
        }
    }
}
