use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::core::error::RelayError;

/// Category tag on an audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Command,
    UserMessage,
    AiResponse,
    System,
    Error,
    AccessDenied,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditKind::Command => "command",
            AuditKind::UserMessage => "user_message",
            AuditKind::AiResponse => "ai_response",
            AuditKind::System => "system",
            AuditKind::Error => "error",
            AuditKind::AccessDenied => "access_denied",
        };
        f.write_str(name)
    }
}

/// Append-only, timestamped record of every observable bot action. Strictly
/// best-effort: a failed write is reported on the diagnostic channel and
/// swallowed so it can never interrupt message handling.
pub struct AuditLogger {
    file: Mutex<File>,
}

impl AuditLogger {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn record(&self, user_id: i64, username: Option<&str>, kind: AuditKind, content: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!(
            "[{}] User {} (@{}) | {}: {}\n",
            timestamp,
            user_id,
            username.unwrap_or("unknown"),
            kind,
            content
        );

        let Ok(mut file) = self.file.lock() else {
            tracing::warn!("audit log mutex poisoned, dropping entry");
            return;
        };

        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::warn!("failed to write audit log entry: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_log_vocabulary() {
        assert_eq!(AuditKind::UserMessage.to_string(), "user_message");
        assert_eq!(AuditKind::AiResponse.to_string(), "ai_response");
        assert_eq!(AuditKind::AccessDenied.to_string(), "access_denied");
    }

    #[test]
    fn record_appends_formatted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.txt");
        let logger = AuditLogger::open(&path).unwrap();

        logger.record(42, Some("alice"), AuditKind::Command, "/start");
        logger.record(42, None, AuditKind::System, "Conversation reset");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("User 42 (@alice) | command: /start"));
        assert!(lines[1].contains("User 42 (@unknown) | system: Conversation reset"));
        assert!(lines[0].starts_with('['));
    }
}
