mod client;
mod types;

pub use client::TelegramClient;
pub use types::{Chat, TelegramMessage, Update, User};
