//! Shared identifiers and error plumbing used across all reelsmith crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{Identity, ReplyTarget},
};
