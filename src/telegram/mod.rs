// Telegram Bot API transport: wire types and the outbound client.

pub mod client;
pub mod types;

pub use client::{ApiError, BotApi};
