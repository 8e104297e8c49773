use {
    reelsmith_media::{AcquireError, job::Seconds},
    thiserror::Error,
};

/// User-facing failure categories.
///
/// `QuotaExceeded` and `InvalidInput` are recovered in place; the rest end
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FailureKind {
    #[error("quota exceeded")]
    QuotaExceeded,
    #[error("source too large")]
    SourceTooLarge,
    #[error("source unreachable")]
    SourceUnreachable,
    #[error("invalid input")]
    InvalidInput,
    #[error("encoding failed")]
    EncodeFailed,
    #[error("insufficient session data")]
    InsufficientSessionData,
}

impl FailureKind {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::QuotaExceeded | Self::InvalidInput)
    }
}

impl From<&AcquireError> for FailureKind {
    fn from(error: &AcquireError) -> Self {
        match error {
            AcquireError::Denied { .. } | AcquireError::OverLimit { .. } => Self::SourceTooLarge,
            AcquireError::UnsupportedUrl { .. } => Self::InvalidInput,
            AcquireError::Unreachable(_) => Self::SourceUnreachable,
        }
    }
}

/// Why a piece of user input was refused. The session stays where it was.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InputError {
    #[error("unrecognized time format")]
    InvalidTime,
    #[error("time must not be negative")]
    NegativeTime,
    #[error("end time must be after the start time ({start}s)")]
    EndNotAfterStart { start: Seconds },
    #[error("input does not match the current step")]
    UnexpectedInput,
}

impl From<InputError> for FailureKind {
    fn from(_: InputError) -> Self {
        Self::InvalidInput
    }
}

#[cfg(test)]
mod tests {
    use {super::*, reelsmith_media::Error as MediaError};

    #[test]
    fn only_quota_and_input_are_recoverable() {
        assert!(!FailureKind::QuotaExceeded.is_terminal());
        assert!(!FailureKind::InvalidInput.is_terminal());
        assert!(FailureKind::SourceTooLarge.is_terminal());
        assert!(FailureKind::SourceUnreachable.is_terminal());
        assert!(FailureKind::EncodeFailed.is_terminal());
        assert!(FailureKind::InsufficientSessionData.is_terminal());
    }

    #[test]
    fn acquisition_errors_map_to_kinds() {
        let denied = AcquireError::Denied { size: 2, limit: 1 };
        assert_eq!(FailureKind::from(&denied), FailureKind::SourceTooLarge);
        let skipped = AcquireError::OverLimit { limit: 1 };
        assert_eq!(FailureKind::from(&skipped), FailureKind::SourceTooLarge);
        let unsupported = AcquireError::UnsupportedUrl { url: "x".into() };
        assert_eq!(FailureKind::from(&unsupported), FailureKind::InvalidInput);
        let unreachable = AcquireError::Unreachable(MediaError::Message("dns".into()));
        assert_eq!(FailureKind::from(&unreachable), FailureKind::SourceUnreachable);
    }
}
