use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tgrelay::audit::AuditLogger;
use tgrelay::config::Config;
use tgrelay::core::error::RelayError;
use tgrelay::dispatcher::{ChatEvent, Dispatcher};
use tgrelay::providers::openrouter::OpenRouterProvider;
use tgrelay::store::RedisStore;
use tgrelay::telegram::TelegramClient;

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), RelayError> {
    let config = Config::from_env()?;

    let audit = Arc::new(AuditLogger::open(&config.audit_log_file)?);
    let store = Arc::new(RedisStore::connect(&config.redis.url()).await?);
    let provider = Arc::new(OpenRouterProvider::new(
        config.openrouter_api_key.clone(),
        config.openrouter_model.clone(),
    ));

    let telegram = TelegramClient::new(&config.telegram_token);
    let me = telegram.get_me().await?;
    info!(
        "Bot started as @{}",
        me.username.as_deref().unwrap_or("unknown")
    );

    let dispatcher = Arc::new(Dispatcher::new(
        store,
        provider,
        audit,
        config.system_prompt.clone(),
        config.allowed_users.clone(),
    ));

    run_event_loop(telegram, dispatcher).await
}

async fn run_event_loop(
    telegram: TelegramClient,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), RelayError> {
    let mut offset = 0i64;

    loop {
        let result = tokio::select! {
            result = telegram.get_updates(offset, POLL_TIMEOUT_SECS) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                return Ok(());
            }
        };

        let updates = match result {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let chat_id = message.chat.id;
            let (Some(from), Some(text)) = (message.from, message.text) else {
                continue;
            };

            let event = ChatEvent {
                user_id: from.id,
                username: from.username,
                is_command: text.starts_with('/'),
                text,
            };

            // Handlers for different users run concurrently; the dispatcher
            // serializes turns per user internally.
            let telegram = telegram.clone();
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                let reply = dispatcher.handle(&event).await;
                if let Err(e) = telegram.send_message(chat_id, &reply.text).await {
                    warn!("Failed to send reply to chat {}: {}", chat_id, e);
                }
            });
        }
    }
}
