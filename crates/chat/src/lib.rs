//! Conversation layer between the chat transport and the media core.
//!
//! The transport decodes updates into [`InboundEvent`]s and hands them to
//! [`ConversationService::handle`], usually through an [`EventDispatcher`]
//! that keeps each identity's events in order. Everything sent back goes
//! through the [`ChatOutbound`] trait.

pub mod callbacks;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod outbound;
pub mod prompts;
pub mod service;

pub use {
    callbacks::Action,
    dispatch::EventDispatcher,
    error::{Error, Result},
    event::{Command, InboundEvent, InboundKind},
    outbound::{Button, ChatOutbound, FileKind, Keyboard},
    prompts::Texts,
    service::ConversationService,
};
