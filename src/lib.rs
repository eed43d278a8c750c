//! This is the library of the bbchat webhook relay.
//!
//! It translates Bitbucket Cloud webhook events into chat notification
//! messages that an external delivery system can post as-is.
pub mod bitbucket;
pub mod config;
pub mod relay;
pub mod server;

pub use config::RelayConfig;
pub use relay::message::{Attachment, ChatMessage, WebhookResponse};
pub use relay::{handle_webhook, RelayContext};
pub use server::{create_app, ServerState};

#[cfg(test)]
mod tests;
