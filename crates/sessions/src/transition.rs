//! Pure conversation transition function.
//!
//! `transition(phase, event, params)` decides the next phase, the updated
//! parameters, and a single [`Effect`] for the caller to carry out. Nothing
//! here touches the network, the filesystem, or the session table.

use reelsmith_media::{AudioFormat, Bitrate, Operation, Quality, VideoFormat};

use crate::{
    error::{FailureKind, InputError},
    phase::{OperationKind, Parameters, Phase, TrimEnd},
    time::{EndPreset, parse_end, parse_time, resolve_preset},
};

/// Input to the machine, already decoded from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The source artifact finished downloading.
    SourceReady,
    Cancel,
    Back,
    SelectOperation(OperationKind),
    SelectFormat(VideoFormat),
    SelectQuality(Quality),
    SelectAudioFormat(AudioFormat),
    SelectBitrate(Bitrate),
    /// Free text, used for trim times.
    Text(String),
    EndPreset(EndPreset),
}

/// Question shown to the user for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    Operation,
    Format,
    Quality,
    AudioFormat,
    Bitrate,
    TrimStart,
    TrimEnd,
}

impl Prompt {
    #[must_use]
    pub fn for_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::AwaitingOperation => Some(Self::Operation),
            Phase::AwaitingFormat => Some(Self::Format),
            Phase::AwaitingQuality => Some(Self::Quality),
            Phase::AwaitingAudioFormat => Some(Self::AudioFormat),
            Phase::AwaitingBitrate => Some(Self::Bitrate),
            Phase::AwaitingTrimStart => Some(Self::TrimStart),
            Phase::AwaitingTrimEnd => Some(Self::TrimEnd),
            Phase::Idle | Phase::Acquiring | Phase::Executing => None,
        }
    }
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Prompt(Prompt),
    /// Input was refused; ask the same question again with the reason.
    Reprompt { prompt: Prompt, error: InputError },
    /// All parameters collected; run this operation on the session source.
    Execute(Operation),
    /// Session discarded on request; release its artifact.
    Cancelled,
    NothingToCancel,
    /// A session is open and cannot take this event.
    Busy,
    Ignored,
    /// Session ended by a terminal failure; release its artifact.
    Abort(FailureKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub phase: Phase,
    pub params: Parameters,
    pub effect: Effect,
}

impl Transition {
    fn stay(phase: Phase, params: &Parameters, effect: Effect) -> Self {
        Self {
            phase,
            params: params.clone(),
            effect,
        }
    }

    fn to(phase: Phase, params: Parameters) -> Self {
        let effect = Prompt::for_phase(phase).map_or(Effect::Ignored, Effect::Prompt);
        Self {
            phase,
            params,
            effect,
        }
    }

    fn end(effect: Effect) -> Self {
        Self {
            phase: Phase::Idle,
            params: Parameters::default(),
            effect,
        }
    }
}

#[must_use]
pub fn transition(phase: Phase, event: Event, params: &Parameters) -> Transition {
    match (phase, event) {
        (Phase::Idle, Event::Cancel) => Transition::stay(phase, params, Effect::NothingToCancel),
        (Phase::Idle, _) => Transition::stay(phase, params, Effect::Ignored),

        (Phase::Executing, _) => Transition::stay(phase, params, Effect::Busy),

        (_, Event::Cancel) => Transition::end(Effect::Cancelled),

        (Phase::Acquiring, Event::SourceReady) => {
            Transition::to(Phase::AwaitingOperation, params.clone())
        },
        (Phase::Acquiring, _) => Transition::stay(phase, params, Effect::Busy),

        (_, Event::Back) => back(phase, params),

        (Phase::AwaitingOperation, Event::SelectOperation(kind)) => {
            let next = Parameters {
                operation: Some(kind),
                ..params.clone()
            };
            Transition::to(kind.first_phase(), next)
        },
        (Phase::AwaitingFormat, Event::SelectFormat(format)) => execute(Parameters {
            format: Some(format),
            ..params.clone()
        }),
        (Phase::AwaitingQuality, Event::SelectQuality(quality)) => execute(Parameters {
            quality: Some(quality),
            ..params.clone()
        }),
        (Phase::AwaitingAudioFormat, Event::SelectAudioFormat(format)) => {
            Transition::to(Phase::AwaitingBitrate, Parameters {
                audio_format: Some(format),
                ..params.clone()
            })
        },
        (Phase::AwaitingBitrate, Event::SelectBitrate(bitrate)) => execute(Parameters {
            bitrate: Some(bitrate),
            ..params.clone()
        }),
        (Phase::AwaitingTrimStart, Event::Text(text)) => match parse_time(&text) {
            Ok(start) => Transition::to(Phase::AwaitingTrimEnd, Parameters {
                trim_start: Some(start),
                ..params.clone()
            }),
            Err(error) => reprompt(phase, params, error),
        },
        (Phase::AwaitingTrimEnd, Event::Text(text)) => {
            let Some(start) = params.trim_start else {
                return Transition::end(Effect::Abort(FailureKind::InsufficientSessionData));
            };
            match parse_end(&text, start) {
                Ok(end) => execute(Parameters {
                    trim_end: Some(TrimEnd::At(end)),
                    ..params.clone()
                }),
                Err(error) => reprompt(phase, params, error),
            }
        },
        (Phase::AwaitingTrimEnd, Event::EndPreset(preset)) => {
            let Some(start) = params.trim_start else {
                return Transition::end(Effect::Abort(FailureKind::InsufficientSessionData));
            };
            match resolve_preset(preset, start) {
                Ok(end) => execute(Parameters {
                    trim_end: Some(end.map_or(TrimEnd::ToEnd, TrimEnd::At)),
                    ..params.clone()
                }),
                Err(error) => reprompt(phase, params, error),
            }
        },

        (_, _) => reprompt(phase, params, InputError::UnexpectedInput),
    }
}

fn back(phase: Phase, params: &Parameters) -> Transition {
    let previous = match phase {
        Phase::AwaitingBitrate => Phase::AwaitingAudioFormat,
        Phase::AwaitingTrimEnd => Phase::AwaitingTrimStart,
        _ => Phase::AwaitingOperation,
    };
    Transition::to(previous, params.clone())
}

fn reprompt(phase: Phase, params: &Parameters, error: InputError) -> Transition {
    match Prompt::for_phase(phase) {
        Some(prompt) => Transition::stay(phase, params, Effect::Reprompt { prompt, error }),
        None => Transition::stay(phase, params, Effect::Ignored),
    }
}

fn execute(params: Parameters) -> Transition {
    match params.to_operation() {
        Ok(operation) => Transition {
            phase: Phase::Executing,
            params,
            effect: Effect::Execute(operation),
        },
        Err(kind) => Transition::end(Effect::Abort(kind)),
    }
}
