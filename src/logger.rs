use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

pub enum MessageLogMode {
    /// Log decoded payloads plus the raw frame bytes as hex.
    Full,
    /// Log decoded payloads only.
    PayloadOnly,
}

/// JSON-lines log of every protocol exchange, for debugging against real
/// hardware.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { mode, file })
    }

    pub fn log_request(&mut self, command: u16, payload: &[u8], frame: &[u8]) {
        let mut entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "cmd": format!("{command:#04x}"),
            "payload": String::from_utf8_lossy(payload),
        });
        if let MessageLogMode::Full = self.mode {
            entry["frame"] = Value::String(hex(frame));
        }
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, command: u16, payload: &[u8]) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "resp",
            "cmd": format!("{command:#04x}"),
            "payload": String::from_utf8_lossy(payload),
        });
        self.write_line(&entry);
    }

    pub fn log_auth(&mut self, ok: bool) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "auth",
            "ok": ok,
        });
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Err(e) = writeln!(self.file, "{entry}") {
            warn!(error = %e, "failed to write message log entry");
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
