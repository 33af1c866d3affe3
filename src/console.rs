//! Console bridge between a rendered preview and its host.
//!
//! In the browser the generated harness posts `console-log` messages to the parent window.
//! This module models that path as a one-way channel so a host can consume the same events
//! in process: the sandbox side publishes, the host side drains and records.

use crate::types::{ConsoleLogEntry, ConsoleMessage, LogLevel};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Wire shape of a message crossing the sandbox boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    #[serde(rename = "console-log")]
    ConsoleLog { level: LogLevel, message: String },
}

impl From<ConsoleMessage> for BridgeMessage {
    fn from(msg: ConsoleMessage) -> Self {
        BridgeMessage::ConsoleLog {
            level: msg.level,
            message: msg.message,
        }
    }
}

impl From<BridgeMessage> for ConsoleMessage {
    fn from(msg: BridgeMessage) -> Self {
        match msg {
            BridgeMessage::ConsoleLog { level, message } => ConsoleMessage { level, message },
        }
    }
}

/// Parses a raw message payload. Anything that is not a well-formed `console-log` is `None`.
pub fn parse_bridge_message(raw: &str) -> Option<ConsoleMessage> {
    serde_json::from_str::<BridgeMessage>(raw)
        .ok()
        .map(ConsoleMessage::from)
}

/// Creates a connected publisher and host log.
pub fn console_bridge() -> (ConsolePublisher, ConsoleLog) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ConsolePublisher { tx }, ConsoleLog::new(rx))
}

/// Sandbox end of the bridge. Sending never fails from the caller's point of view.
#[derive(Debug, Clone)]
pub struct ConsolePublisher {
    tx: Sender<ConsoleMessage>,
}

impl ConsolePublisher {
    pub fn publish(&self, message: ConsoleMessage) {
        if self.tx.send(message).is_err() {
            #[cfg(feature = "logging")]
            tracing::trace!("console host disconnected, message dropped");
        }
    }

    /// Publishes a raw JSON payload. Returns `false` if the payload was not a console message.
    pub fn publish_raw(&self, raw: &str) -> bool {
        match parse_bridge_message(raw) {
            Some(message) => {
                self.publish(message);
                true
            }
            None => false,
        }
    }
}

/// In-process counterpart of the injected console harness.
///
/// Holds its own dedup set, so every harness (one per render) starts fresh. Runtime error
/// reports skip the dedup set and are always published.
#[derive(Debug)]
pub struct ConsoleHarness {
    publisher: ConsolePublisher,
    seen: HashSet<String>,
}

impl ConsoleHarness {
    pub fn new(publisher: ConsolePublisher) -> Self {
        Self {
            publisher,
            seen: HashSet::new(),
        }
    }

    pub fn log(&mut self, args: &[Value]) {
        self.report(LogLevel::Log, format_args_list(args));
    }

    pub fn warn(&mut self, args: &[Value]) {
        self.report(LogLevel::Warn, format_args_list(args));
    }

    pub fn error(&mut self, args: &[Value]) {
        self.report(LogLevel::Error, format_args_list(args));
    }

    pub fn report_script_error(&self, message: &str, line: u32) {
        self.post(
            LogLevel::Error,
            format!("Script Error: {} at line {}", message, line),
        );
    }

    pub fn report_unhandled_rejection(&self, reason: &str) {
        self.post(
            LogLevel::Error,
            format!("Unhandled Promise Rejection: {}", reason),
        );
    }

    pub fn report_execution_error(&self, message: &str) {
        self.post(
            LogLevel::Error,
            format!("JavaScript execution error: {}", message),
        );
    }

    fn report(&mut self, level: LogLevel, message: String) {
        let key = format!("{}:{}", level, message);
        if self.seen.insert(key) {
            self.post(level, message);
        }
    }

    fn post(&self, level: LogLevel, message: String) {
        self.publisher.publish(ConsoleMessage { level, message });
    }
}

/// Joins console arguments the way the harness does: objects as indented JSON, strings as
/// is, everything else through its display form, separated by single spaces.
pub fn format_args_list(args: &[Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            Value::Object(_) | Value::Array(_) | Value::Null => {
                serde_json::to_string_pretty(arg).unwrap_or_else(|_| arg.to_string())
            }
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Host end of the bridge: an ordered, deduplicated console log.
#[derive(Debug)]
pub struct ConsoleLog {
    rx: Receiver<ConsoleMessage>,
    entries: Vec<ConsoleLogEntry>,
}

impl ConsoleLog {
    fn new(rx: Receiver<ConsoleMessage>) -> Self {
        Self {
            rx,
            entries: Vec::new(),
        }
    }

    /// Receives every pending message, stamping each with the current local time.
    ///
    /// Returns the number of entries added.
    pub fn drain(&mut self) -> usize {
        let mut added = 0;
        while let Ok(message) = self.rx.try_recv() {
            let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
            if self.receive_at(message, timestamp) {
                added += 1;
            }
        }
        added
    }

    /// Records one message. Exact `(level, message, timestamp)` repeats are dropped.
    pub fn receive_at(&mut self, message: ConsoleMessage, timestamp: impl Into<String>) -> bool {
        let entry = ConsoleLogEntry {
            level: message.level,
            message: message.message,
            timestamp: timestamp.into(),
        };
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Number of messages published but not yet drained.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn entries(&self) -> &[ConsoleLogEntry] {
        &self.entries
    }

    /// Forgets recorded entries and anything still queued. Call before each regeneration.
    pub fn clear(&mut self) {
        self.entries.clear();
        while self.rx.try_recv().is_ok() {}
    }
}
