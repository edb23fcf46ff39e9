use crate::core::error::RelayError;
use crate::dispatcher::RESET_BUTTON_LABEL;
use crate::telegram::types::{
    ApiResponse, GetUpdatesRequest, KeyboardButton, ReplyKeyboardMarkup, SendMessageRequest,
    Update, User,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Telegram caps message text at 4096 characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Minimal typed client for the Telegram Bot API: long-polling updates in,
/// text replies (with the one-button restart keyboard) out.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        // No global timeout so long polls can block for their full duration.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: format!("https://api.telegram.org/bot{}", token),
        }
    }

    async fn call<P, R>(&self, method: &str, payload: &P) -> Result<R, RelayError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayError::Telegram(format!("{} request failed: {}", method, e)))?;

        let body: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| RelayError::Telegram(format!("{} response malformed: {}", method, e)))?;

        if !body.ok {
            return Err(RelayError::Telegram(format!(
                "{} rejected: {}",
                method,
                body.description.as_deref().unwrap_or("no description")
            )));
        }

        body.result
            .ok_or_else(|| RelayError::Telegram(format!("{} returned no result", method)))
    }

    pub async fn get_me(&self) -> Result<User, RelayError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, RelayError> {
        let payload = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &payload).await
    }

    /// Sends a text reply, splitting it if it exceeds the Telegram limit.
    /// Every part carries the restart keyboard.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), RelayError> {
        for part in split_message(text, MAX_MESSAGE_LEN) {
            let payload = SendMessageRequest {
                chat_id,
                text: &part,
                reply_markup: restart_keyboard(),
            };
            let _: serde_json::Value = self.call("sendMessage", &payload).await?;
        }
        Ok(())
    }
}

fn restart_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup {
        keyboard: vec![vec![KeyboardButton {
            text: RESET_BUTTON_LABEL.to_string(),
        }]],
        resize_keyboard: true,
    }
}

/// Splits `text` into parts of at most `max_len` characters, preferring line
/// boundaries and hard-splitting single lines that are themselves too long.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        for chunk in chunk_line(line, max_len) {
            let chunk_len = chunk.chars().count();
            if current_len > 0 && current_len + 1 + chunk_len > max_len {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(&chunk);
            current_len += chunk_len;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Breaks one line into pieces no longer than `max_len` characters.
fn chunk_line(line: &str, max_len: usize) -> Vec<String> {
    if line.chars().count() <= max_len {
        return vec![line.to_string()];
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut len = 0usize;
    for ch in line.chars() {
        buf.push(ch);
        len += 1;
        if len == max_len {
            chunks.push(std::mem::take(&mut buf));
            len = 0;
        }
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_is_not_split() {
        assert_eq!(split_message("hello", 4096), vec!["hello"]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = format!("{}\n{}\n{}", "a".repeat(30), "b".repeat(30), "c".repeat(30));
        let parts = split_message(&text, 64);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], format!("{}\n{}", "a".repeat(30), "b".repeat(30)));
        assert_eq!(parts[1], "c".repeat(30));
    }

    #[test]
    fn hard_splits_an_oversized_line() {
        let text = "x".repeat(100);
        let parts = split_message(&text, 40);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 40));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn every_part_respects_the_limit() {
        let text = format!("{}\n\n{}", "line ".repeat(500), "y".repeat(5000));
        for part in split_message(&text, MAX_MESSAGE_LEN) {
            assert!(part.chars().count() <= MAX_MESSAGE_LEN);
        }
    }
}
