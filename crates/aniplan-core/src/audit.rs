use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, Result};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC.
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    fn empty(event: &str, chat_id: i64) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            chat_id: Some(chat_id),
            user_id: None,
            sender: None,
            command: None,
            args: None,
            username: None,
            outcome: None,
            error: None,
        }
    }

    pub fn command(
        chat_id: i64,
        user_id: Option<i64>,
        sender: Option<&str>,
        command: &str,
        args: &[String],
    ) -> Self {
        Self {
            user_id,
            sender: sender.map(|s| s.to_string()),
            command: Some(command.to_string()),
            args: Some(args.join(" ")),
            ..Self::empty("command", chat_id)
        }
    }

    /// Registry mutation attempt (`register`/`remove`) and its outcome.
    pub fn registry(chat_id: i64, command: &str, username: &str, outcome: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            username: Some(username.to_string()),
            outcome: Some(outcome.to_string()),
            ..Self::empty("registry", chat_id)
        }
    }

    pub fn error(chat_id: i64, command: &str, error: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            error: Some(error.to_string()),
            ..Self::empty("error", chat_id)
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        for field in [&mut event.args, &mut event.error] {
            if let Some(s) = field.as_ref() {
                *field = Some(truncate_text(s, AUDIT_MAX_TEXT));
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }

    /// Write and log failures instead of returning them.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.write(event) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write audit event");
        }
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
