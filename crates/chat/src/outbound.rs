use std::path::Path;

use {async_trait::async_trait, reelsmith_common::ReplyTarget};

use crate::error::Result;

/// One inline button: visible label plus callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    #[must_use]
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons attached to the message, answered with callback data.
    Inline(Vec<Vec<Button>>),
    /// Buttons that replace the text keyboard and send their label as text.
    Reply(Vec<Vec<String>>),
    /// Take down a previously shown reply keyboard.
    Remove,
}

/// How a result file is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Animation,
    Audio,
}

/// Outbound half of the chat transport.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    async fn reply(&self, to: &ReplyTarget, text: &str, keyboard: Option<Keyboard>) -> Result<()>;

    async fn send_file(
        &self,
        to: &ReplyTarget,
        path: &Path,
        kind: FileKind,
        caption: &str,
    ) -> Result<()>;

    /// Dismiss the loading state of a pressed button.
    async fn answer_callback(&self, _callback_id: &str) -> Result<()> {
        Ok(())
    }
}
