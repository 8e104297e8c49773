//! Telegram transport for reelsmith.
//!
//! Long-polls the Bot API with teloxide, turns updates into
//! [`InboundEvent`](reelsmith_chat::InboundEvent)s for the conversation
//! service, and implements the outbound and file-store seams on top of the
//! same `Bot` handle.

pub mod bot;
pub mod error;
pub mod files;
pub mod handlers;
pub mod outbound;

pub use {
    bot::{build_bot, register_commands, run_polling},
    error::{Error, Result},
    files::TelegramFiles,
    outbound::TelegramOutbound,
};
