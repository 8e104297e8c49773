use std::{fmt, str::FromStr};

use reelsmith_media::{AudioFormat, Bitrate, Operation, Quality, Seconds, VideoFormat};

use crate::error::{FailureKind, InputError};

/// Named state of one identity's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// No session.
    #[default]
    Idle,
    /// Source is being fetched; only cancel is accepted.
    Acquiring,
    AwaitingOperation,
    AwaitingFormat,
    AwaitingQuality,
    AwaitingAudioFormat,
    AwaitingBitrate,
    AwaitingTrimStart,
    AwaitingTrimEnd,
    /// Job handed to the executor; no input accepted until it finishes.
    Executing,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::AwaitingOperation => "awaiting_operation",
            Self::AwaitingFormat => "awaiting_format",
            Self::AwaitingQuality => "awaiting_quality",
            Self::AwaitingAudioFormat => "awaiting_audio_format",
            Self::AwaitingBitrate => "awaiting_bitrate",
            Self::AwaitingTrimStart => "awaiting_trim_start",
            Self::AwaitingTrimEnd => "awaiting_trim_end",
            Self::Executing => "executing",
        }
    }

    /// Whether the phase waits on a user choice.
    #[must_use]
    pub fn is_awaiting(self) -> bool {
        !matches!(self, Self::Idle | Self::Acquiring | Self::Executing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation picked at [`Phase::AwaitingOperation`], before its parameters exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Convert,
    Compress,
    ExtractAudio,
    Trim,
}

impl OperationKind {
    pub const ALL: [Self; 4] = [Self::Convert, Self::Compress, Self::ExtractAudio, Self::Trim];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::Compress => "compress",
            Self::ExtractAudio => "extract_audio",
            Self::Trim => "trim",
        }
    }

    /// First parameter phase for this operation.
    #[must_use]
    pub fn first_phase(self) -> Phase {
        match self {
            Self::Convert => Phase::AwaitingFormat,
            Self::Compress => Phase::AwaitingQuality,
            Self::ExtractAudio => Phase::AwaitingAudioFormat,
            Self::Trim => Phase::AwaitingTrimStart,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OperationKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == s)
            .ok_or(InputError::UnexpectedInput)
    }
}

/// End of a trim range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimEnd {
    ToEnd,
    At(Seconds),
}

impl TrimEnd {
    #[must_use]
    pub fn seconds(self) -> Option<Seconds> {
        match self {
            Self::ToEnd => None,
            Self::At(secs) => Some(secs),
        }
    }
}

/// Choices accumulated so far. Earlier choices survive a "back".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    pub operation: Option<OperationKind>,
    pub format: Option<VideoFormat>,
    pub quality: Option<Quality>,
    pub audio_format: Option<AudioFormat>,
    pub bitrate: Option<Bitrate>,
    pub trim_start: Option<Seconds>,
    pub trim_end: Option<TrimEnd>,
}

impl Parameters {
    /// Assemble the operation for execution.
    ///
    /// A missing field means the machine reached execution through a path
    /// that skipped a prompt.
    pub fn to_operation(&self) -> Result<Operation, FailureKind> {
        let missing = FailureKind::InsufficientSessionData;
        match self.operation.ok_or(missing)? {
            OperationKind::Convert => Ok(Operation::Convert {
                format: self.format.ok_or(missing)?,
            }),
            OperationKind::Compress => Ok(Operation::Compress {
                quality: self.quality.ok_or(missing)?,
            }),
            OperationKind::ExtractAudio => Ok(Operation::ExtractAudio {
                format: self.audio_format.ok_or(missing)?,
                bitrate: self.bitrate.ok_or(missing)?,
                start: None,
                end: None,
            }),
            OperationKind::Trim => Ok(Operation::Trim {
                start: self.trim_start.ok_or(missing)?,
                end: self.trim_end.ok_or(missing)?.seconds(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(OperationKind::Convert, Phase::AwaitingFormat)]
    #[case(OperationKind::Compress, Phase::AwaitingQuality)]
    #[case(OperationKind::ExtractAudio, Phase::AwaitingAudioFormat)]
    #[case(OperationKind::Trim, Phase::AwaitingTrimStart)]
    fn operation_starts_at_its_first_parameter(#[case] kind: OperationKind, #[case] phase: Phase) {
        assert_eq!(kind.first_phase(), phase);
        assert_eq!(kind.code().parse::<OperationKind>(), Ok(kind));
    }

    #[test]
    fn complete_parameters_build_operations() {
        let params = Parameters {
            operation: Some(OperationKind::Trim),
            trim_start: Some(10.0),
            trim_end: Some(TrimEnd::At(40.0)),
            ..Parameters::default()
        };
        assert_eq!(
            params.to_operation(),
            Ok(Operation::Trim {
                start: 10.0,
                end: Some(40.0)
            })
        );

        let params = Parameters {
            operation: Some(OperationKind::ExtractAudio),
            audio_format: Some(AudioFormat::Mp3),
            bitrate: Some(Bitrate::K192),
            ..Parameters::default()
        };
        assert_eq!(
            params.to_operation(),
            Ok(Operation::ExtractAudio {
                format: AudioFormat::Mp3,
                bitrate: Bitrate::K192,
                start: None,
                end: None
            })
        );
    }

    #[rstest]
    #[case(Parameters::default())]
    #[case(Parameters { operation: Some(OperationKind::Convert), ..Parameters::default() })]
    #[case(Parameters {
        operation: Some(OperationKind::ExtractAudio),
        audio_format: Some(AudioFormat::Wav),
        ..Parameters::default()
    })]
    #[case(Parameters {
        operation: Some(OperationKind::Trim),
        trim_start: Some(3.0),
        ..Parameters::default()
    })]
    fn incomplete_parameters_are_insufficient(#[case] params: Parameters) {
        assert_eq!(
            params.to_operation(),
            Err(FailureKind::InsufficientSessionData)
        );
    }

    #[test]
    fn only_choice_phases_are_awaiting() {
        assert!(!Phase::Idle.is_awaiting());
        assert!(!Phase::Acquiring.is_awaiting());
        assert!(!Phase::Executing.is_awaiting());
        assert!(Phase::AwaitingTrimEnd.is_awaiting());
    }
}
