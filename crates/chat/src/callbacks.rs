//! Typed callback data carried by inline buttons.
//!
//! The wire form is `prefix:value`, short enough for Telegram's 64-byte limit.

use {
    reelsmith_i18n::Language,
    reelsmith_media::{AudioFormat, Bitrate, Quality, VideoFormat},
    reelsmith_sessions::{Event, OperationKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Operation(OperationKind),
    Format(VideoFormat),
    Quality(Quality),
    AudioFormat(AudioFormat),
    Bitrate(Bitrate),
    Back,
    Cancel,
    Language(Language),
}

impl Action {
    #[must_use]
    pub fn encode(self) -> String {
        match self {
            Self::Operation(kind) => format!("op:{}", kind.code()),
            Self::Format(format) => format!("fmt:{}", format.code()),
            Self::Quality(quality) => format!("q:{}", quality.code()),
            Self::AudioFormat(format) => format!("af:{}", format.code()),
            Self::Bitrate(bitrate) => format!("br:{}", bitrate.code()),
            Self::Back => "nav:back".to_string(),
            Self::Cancel => "nav:cancel".to_string(),
            Self::Language(language) => format!("lang:{}", language.code()),
        }
    }

    #[must_use]
    pub fn decode(data: &str) -> Option<Self> {
        let (prefix, value) = data.split_once(':')?;
        match prefix {
            "op" => value.parse().ok().map(Self::Operation),
            "fmt" => value.parse().ok().map(Self::Format),
            "q" => value.parse().ok().map(Self::Quality),
            "af" => value.parse().ok().map(Self::AudioFormat),
            "br" => value.parse().ok().map(Self::Bitrate),
            "nav" => match value {
                "back" => Some(Self::Back),
                "cancel" => Some(Self::Cancel),
                _ => None,
            },
            "lang" => Language::from_code(value).map(Self::Language),
            _ => None,
        }
    }

    /// State machine event for this action. Language changes are handled
    /// outside the conversation.
    #[must_use]
    pub fn to_event(self) -> Option<Event> {
        match self {
            Self::Operation(kind) => Some(Event::SelectOperation(kind)),
            Self::Format(format) => Some(Event::SelectFormat(format)),
            Self::Quality(quality) => Some(Event::SelectQuality(quality)),
            Self::AudioFormat(format) => Some(Event::SelectAudioFormat(format)),
            Self::Bitrate(bitrate) => Some(Event::SelectBitrate(bitrate)),
            Self::Back => Some(Event::Back),
            Self::Cancel => Some(Event::Cancel),
            Self::Language(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("op:extract_audio", Action::Operation(OperationKind::ExtractAudio))]
    #[case("fmt:gif", Action::Format(VideoFormat::Gif))]
    #[case("q:medium", Action::Quality(Quality::Medium))]
    #[case("af:wav", Action::AudioFormat(AudioFormat::Wav))]
    #[case("br:320k", Action::Bitrate(Bitrate::K320))]
    #[case("nav:back", Action::Back)]
    #[case("nav:cancel", Action::Cancel)]
    #[case("lang:uz", Action::Language(Language::Uz))]
    fn decodes_known_data(#[case] data: &str, #[case] action: Action) {
        assert_eq!(Action::decode(data), Some(action));
        assert_eq!(action.encode(), data);
    }

    #[rstest]
    #[case("")]
    #[case("op")]
    #[case("op:explode")]
    #[case("fmt:flv")]
    #[case("nav:forward")]
    #[case("lang:de")]
    #[case("sessions_switch:1")]
    fn rejects_unknown_data(#[case] data: &str) {
        assert_eq!(Action::decode(data), None);
    }

    #[test]
    fn language_is_not_a_conversation_event() {
        assert_eq!(Action::Language(Language::En).to_event(), None);
        assert_eq!(Action::Cancel.to_event(), Some(Event::Cancel));
    }
}
