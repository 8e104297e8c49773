use std::error::Error as StdError;

use reelsmith_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("`{tool}` exited with status {code:?}: {stderr_tail}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr_tail: String,
    },

    #[error("`{tool}` timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("encoding failed after {attempts} attempt(s): {last}")]
    EncodeFailed {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },

    /// The downloader skipped the item because it is over `limit` bytes.
    #[error("download skipped, file is larger than {limit} bytes")]
    SizeLimitExceeded { limit: u64 },
}

impl Error {
    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

reelsmith_common::impl_context!();

/// Why a source could not be acquired.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// Declared or on-disk size exceeds the per-file ceiling.
    #[error("source is {size} bytes, over the {limit} byte limit")]
    Denied { size: u64, limit: u64 },

    /// The downloader refused an item over the ceiling before fetching it.
    #[error("source is over the {limit} byte limit")]
    OverLimit { limit: u64 },

    /// URL is malformed or its host is not on the allow-list.
    #[error("unsupported source url `{url}`")]
    UnsupportedUrl { url: String },

    /// Network, platform or downloader failure.
    #[error("source unreachable: {0}")]
    Unreachable(#[source] Error),
}
