use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::audit::{AuditKind, AuditLogger};
use crate::core::error::RelayError;
use crate::providers::{CompletionProvider, Message, Role};
use crate::store::HistoryStore;

/// Label of the single reply-keyboard button. A message with exactly this
/// text is the reset trigger and never reaches the completion provider.
pub const RESET_BUTTON_LABEL: &str = "🔄 Restart Conversation";

pub const GREETING: &str =
    "Hi! I am your AI assistant. Send me a message and I will respond using AI.";
pub const HELP_TEXT: &str = "Send me any message and I will respond using AI. \
     Use \"🔄 Restart Conversation\" to start a new conversation.";
pub const RESET_CONFIRMATION: &str =
    "Conversation has been reset. Send a new message to start.";
pub const APOLOGY: &str = "Sorry, I encountered an error processing your request.";
pub const UNAUTHORIZED: &str = "Sorry, you are not authorized to use this bot.";

/// Narrow view of an inbound message, decoupled from the transport types.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
    pub is_command: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
}

impl Reply {
    fn fixed(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// Routes inbound events: commands, the reset trigger, and free text. Holds
/// no conversation state of its own; the history store is the only state
/// carried across events.
pub struct Dispatcher {
    store: Arc<dyn HistoryStore>,
    provider: Arc<dyn CompletionProvider>,
    audit: Arc<AuditLogger>,
    system_prompt: Option<String>,
    allowed_users: Vec<i64>,
    user_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        provider: Arc<dyn CompletionProvider>,
        audit: Arc<AuditLogger>,
        system_prompt: Option<String>,
        allowed_users: Vec<i64>,
    ) -> Self {
        Self {
            store,
            provider,
            audit,
            system_prompt,
            allowed_users,
            user_locks: DashMap::new(),
        }
    }

    pub async fn handle(&self, event: &ChatEvent) -> Reply {
        let user_id = event.user_id;
        let username = event.username.as_deref();

        if !self.is_allowed(user_id) {
            self.audit.record(
                user_id,
                username,
                AuditKind::AccessDenied,
                "User not in allowed list",
            );
            return Reply::fixed(UNAUTHORIZED);
        }

        if event.is_command {
            self.audit
                .record(user_id, username, AuditKind::Command, &event.text);
            let text = match event.text.split_whitespace().next() {
                Some("/start") => GREETING,
                _ => HELP_TEXT,
            };
            return Reply::fixed(text);
        }

        // One turn at a time per user, so a rapid double-send cannot race
        // get/set and silently drop a round from history.
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        if event.text == RESET_BUTTON_LABEL {
            if let Err(e) = self.store.clear(user_id).await {
                self.audit.record(
                    user_id,
                    username,
                    AuditKind::Error,
                    &format!("Failed to clear conversation: {}", e),
                );
            }
            self.audit
                .record(user_id, username, AuditKind::System, "Conversation reset");
            return Reply::fixed(RESET_CONFIRMATION);
        }

        self.audit
            .record(user_id, username, AuditKind::UserMessage, &event.text);

        match self.completion_turn(event).await {
            Ok(reply) => {
                self.audit
                    .record(user_id, username, AuditKind::AiResponse, &reply);
                Reply { text: reply }
            }
            Err(e) => {
                self.audit
                    .record(user_id, username, AuditKind::Error, &e.to_string());
                Reply::fixed(APOLOGY)
            }
        }
    }

    /// One full round: get → append user turn → complete → append assistant
    /// turn → set. The appended turns live only in the working copy until
    /// the round succeeds, so a failed turn leaves the store untouched.
    async fn completion_turn(&self, event: &ChatEvent) -> Result<String, RelayError> {
        let mut history = self.store.get(event.user_id).await?;

        if history.is_empty() {
            if let Some(prompt) = &self.system_prompt {
                history.push(Message::new(Role::System, prompt.clone()));
            }
        }
        history.push(Message::new(Role::User, event.text.clone()));

        let reply = self.provider.complete(&history).await?;

        history.push(Message::new(Role::Assistant, reply.clone()));
        self.store.set(event.user_id, &history).await?;

        Ok(reply)
    }

    fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }

    fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().clone()
    }
}
