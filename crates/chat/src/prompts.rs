//! Localized texts and keyboards for every conversation step.

use {
    reelsmith_i18n::{Language, Localizer},
    reelsmith_media::{AudioFormat, Bitrate, Operation, Quality, VideoFormat},
    reelsmith_sessions::{EndPreset, Event, FailureKind, InputError, OperationKind, Prompt},
};

use crate::{
    callbacks::Action,
    event::Command,
    outbound::{Button, Keyboard},
};

/// Texts for one language.
#[derive(Clone, Copy)]
pub struct Texts<'a> {
    localizer: &'a Localizer,
    language: Language,
}

impl<'a> Texts<'a> {
    #[must_use]
    pub fn new(localizer: &'a Localizer, language: Language) -> Self {
        Self {
            localizer,
            language,
        }
    }

    #[must_use]
    pub fn get(&self, category: &str, key: &str) -> String {
        self.localizer.text(category, key, self.language, &[])
    }

    #[must_use]
    pub fn with(&self, category: &str, key: &str, params: &[(&str, &str)]) -> String {
        self.localizer.text(category, key, self.language, params)
    }

    fn button(&self, key: &str, action: Action) -> Button {
        Button::new(self.get("button", key), action.encode())
    }

    fn nav_row(&self, with_back: bool) -> Vec<Button> {
        let mut row = Vec::with_capacity(2);
        if with_back {
            row.push(self.button("back", Action::Back));
        }
        row.push(self.button("cancel", Action::Cancel));
        row
    }

    /// Question and keyboard for a phase prompt.
    #[must_use]
    pub fn prompt(&self, prompt: Prompt) -> (String, Keyboard) {
        let keyboard = match prompt {
            Prompt::Operation => Keyboard::Inline(vec![
                vec![
                    self.operation_button(OperationKind::Convert),
                    self.operation_button(OperationKind::Compress),
                ],
                vec![
                    self.operation_button(OperationKind::ExtractAudio),
                    self.operation_button(OperationKind::Trim),
                ],
                self.nav_row(false),
            ]),
            Prompt::Format => {
                let mut rows: Vec<Vec<Button>> = VideoFormat::ALL
                    .chunks(3)
                    .map(|chunk| {
                        chunk
                            .iter()
                            .map(|f| Button::new(f.code().to_uppercase(), Action::Format(*f).encode()))
                            .collect()
                    })
                    .collect();
                rows.push(self.nav_row(true));
                Keyboard::Inline(rows)
            },
            Prompt::Quality => {
                let mut rows: Vec<Vec<Button>> = Quality::ALL
                    .iter()
                    .map(|q| {
                        vec![self.button(&format!("quality_{}", q.code()), Action::Quality(*q))]
                    })
                    .collect();
                rows.push(self.nav_row(true));
                Keyboard::Inline(rows)
            },
            Prompt::AudioFormat => Keyboard::Inline(vec![
                AudioFormat::ALL
                    .iter()
                    .map(|f| Button::new(f.code().to_uppercase(), Action::AudioFormat(*f).encode()))
                    .collect(),
                self.nav_row(true),
            ]),
            Prompt::Bitrate => {
                let mut rows: Vec<Vec<Button>> = Bitrate::ALL
                    .iter()
                    .map(|b| {
                        vec![self.button(&format!("bitrate_{}", b.code()), Action::Bitrate(*b))]
                    })
                    .collect();
                rows.push(self.nav_row(true));
                Keyboard::Inline(rows)
            },
            Prompt::TrimStart => Keyboard::Inline(vec![self.nav_row(true)]),
            Prompt::TrimEnd => {
                let presets: Vec<String> = EndPreset::RELATIVE
                    .iter()
                    .map(|p| self.get("button", p.key()))
                    .collect();
                let mut rows = vec![vec![self.get("button", EndPreset::ToEnd.key())]];
                rows.extend(presets.chunks(3).map(<[String]>::to_vec));
                rows.push(vec![self.get("button", "back"), self.get("button", "cancel")]);
                Keyboard::Reply(rows)
            },
        };
        (self.get("prompt", prompt_key(prompt)), keyboard)
    }

    fn operation_button(&self, kind: OperationKind) -> Button {
        self.button(kind.code(), Action::Operation(kind))
    }

    /// Refusal text for the same prompt, with the prompt's keyboard.
    #[must_use]
    pub fn reprompt(&self, prompt: Prompt, error: &InputError) -> (String, Keyboard) {
        let (_, keyboard) = self.prompt(prompt);
        (self.input_error(error), keyboard)
    }

    #[must_use]
    pub fn input_error(&self, error: &InputError) -> String {
        match error {
            InputError::InvalidTime => self.get("error", "invalid_time"),
            InputError::NegativeTime => self.get("error", "negative_time"),
            InputError::EndNotAfterStart { start } => {
                self.with("error", "end_before_start", &[("start", &start.to_string())])
            },
            InputError::UnexpectedInput => self.get("error", "unexpected_input"),
        }
    }

    /// User-facing text for a failure category.
    #[must_use]
    pub fn failure(&self, kind: FailureKind, detail: Option<&str>, max_file_size_mb: u64) -> String {
        match kind {
            FailureKind::QuotaExceeded => self.get("error", "quota_exceeded"),
            FailureKind::SourceTooLarge => self.with("error", "too_large", &[(
                "max_file_size",
                &max_file_size_mb.to_string(),
            )]),
            FailureKind::SourceUnreachable => self.get("error", "unreachable"),
            FailureKind::InvalidInput => self.get("error", "unsupported_url"),
            FailureKind::EncodeFailed => {
                self.with("error", "encode_failed", &[("error", detail.unwrap_or("-"))])
            },
            FailureKind::InsufficientSessionData => self.get("error", "insufficient_data"),
        }
    }

    /// Operation with its parameters, e.g. "compression with medium quality".
    #[must_use]
    pub fn describe(&self, operation: &Operation) -> String {
        match operation {
            Operation::Convert { format } => self.with("describe", "convert", &[(
                "format",
                &format.code().to_uppercase(),
            )]),
            Operation::Compress { quality } => {
                let quality = self.get("quality", quality.code());
                self.with("describe", "compress", &[("quality", &quality)])
            },
            Operation::ExtractAudio {
                format, bitrate, ..
            } => self.with("describe", "extract_audio", &[
                ("format", &format.code().to_uppercase()),
                ("bitrate", bitrate.code()),
            ]),
            Operation::Trim {
                start,
                end: Some(end),
            } => self.with("describe", "trim_range", &[
                ("start", &start.to_string()),
                ("end", &end.to_string()),
            ]),
            Operation::Trim { start, end: None } => {
                self.with("describe", "trim_to_end", &[("start", &start.to_string())])
            },
        }
    }

    #[must_use]
    pub fn caption(&self, operation: &Operation) -> String {
        match operation {
            Operation::ExtractAudio {
                format, bitrate, ..
            } => self.with("caption", "audio", &[
                ("format", &format.code().to_uppercase()),
                ("bitrate", bitrate.code()),
            ]),
            _ => self.with("caption", "video", &[("operation", &self.describe(operation))]),
        }
    }

    #[must_use]
    pub fn done(&self, operation: &Operation) -> String {
        self.with("status", "done", &[("operation", &self.describe(operation))])
    }

    #[must_use]
    pub fn greeting(&self, name: &str) -> String {
        self.with("start", "greeting", &[("name", name)])
    }

    #[must_use]
    pub fn help(&self, max_file_size_mb: u64, max_requests: u32) -> String {
        let commands = self
            .commands()
            .into_iter()
            .map(|(cmd, description)| format!("/{} - {description}", cmd.name()))
            .collect::<Vec<_>>()
            .join("\n");
        [
            self.get("help", "title"),
            commands,
            String::new(),
            self.get("help", "usage_title"),
            self.get("help", "usage_steps"),
            String::new(),
            self.get("help", "limits_title"),
            self.with("help", "max_file_size", &[(
                "max_file_size",
                &max_file_size_mb.to_string(),
            )]),
            self.with("help", "max_requests", &[(
                "max_requests",
                &max_requests.to_string(),
            )]),
        ]
        .join("\n")
    }

    /// Command names with their localized descriptions.
    #[must_use]
    pub fn commands(&self) -> Vec<(Command, String)> {
        Command::ALL
            .into_iter()
            .map(|cmd| (cmd, self.get("commands", cmd.name())))
            .collect()
    }

    #[must_use]
    pub fn settings(&self) -> (String, Keyboard) {
        let text = [
            self.get("settings", "title"),
            self.with("settings", "language", &[(
                "language",
                self.language.native_name(),
            )]),
            self.get("settings", "choose"),
        ]
        .join("\n");
        let row = Language::ALL
            .iter()
            .map(|l| Button::new(l.native_name(), Action::Language(*l).encode()))
            .collect();
        (text, Keyboard::Inline(vec![row]))
    }
}

fn prompt_key(prompt: Prompt) -> &'static str {
    match prompt {
        Prompt::Operation => "operation",
        Prompt::Format => "format",
        Prompt::Quality => "quality",
        Prompt::AudioFormat => "audio_format",
        Prompt::Bitrate => "bitrate",
        Prompt::TrimStart => "trim_start",
        Prompt::TrimEnd => "trim_end",
    }
}

/// Map a reply-keyboard label back to its event, in any supported language.
#[must_use]
pub fn reply_label_event(localizer: &Localizer, text: &str) -> Option<Event> {
    let text = text.trim();
    let presets = std::iter::once(EndPreset::ToEnd).chain(EndPreset::RELATIVE);
    Language::ALL.into_iter().find_map(|language| {
        let label = |key: &str| localizer.text("button", key, language, &[]);
        if label("back") == text {
            return Some(Event::Back);
        }
        if label("cancel") == text {
            return Some(Event::Cancel);
        }
        presets
            .clone()
            .find(|preset| label(preset.key()) == text)
            .map(Event::EndPreset)
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn en() -> Localizer {
        Localizer::new(Language::En)
    }

    #[test]
    fn compress_caption_names_quality() {
        let localizer = en();
        let texts = Texts::new(&localizer, Language::En);
        let caption = texts.caption(&Operation::Compress {
            quality: Quality::Medium,
        });
        assert!(caption.contains("compression with medium quality"), "{caption}");
    }

    #[test]
    fn trim_description_formats_seconds() {
        let localizer = en();
        let texts = Texts::new(&localizer, Language::En);
        let text = texts.describe(&Operation::Trim {
            start: 10.0,
            end: Some(40.0),
        });
        assert!(text.contains("10") && text.contains("40"), "{text}");
        assert!(!text.contains("10.0"));
    }

    #[test]
    fn operation_prompt_offers_every_operation() {
        let localizer = en();
        let (_, keyboard) = Texts::new(&localizer, Language::En).prompt(Prompt::Operation);
        let Keyboard::Inline(rows) = keyboard else {
            panic!("operation prompt must use inline buttons");
        };
        let data: Vec<&str> = rows.iter().flatten().map(|b| b.data.as_str()).collect();
        for kind in OperationKind::ALL {
            assert!(data.contains(&Action::Operation(kind).encode().as_str()));
        }
        assert!(data.contains(&"nav:cancel"));
    }

    #[test]
    fn trim_end_prompt_uses_reply_keyboard_with_presets() {
        let localizer = en();
        let (_, keyboard) = Texts::new(&localizer, Language::En).prompt(Prompt::TrimEnd);
        let Keyboard::Reply(rows) = keyboard else {
            panic!("trim end prompt must use a reply keyboard");
        };
        let labels: Vec<&String> = rows.iter().flatten().collect();
        assert_eq!(labels.len(), 9);
    }

    #[rstest]
    #[case(Language::En)]
    #[case(Language::Ru)]
    #[case(Language::Uz)]
    fn reply_labels_map_back_to_events(#[case] language: Language) {
        let localizer = Localizer::new(Language::Ru);
        let (_, keyboard) = Texts::new(&localizer, language).prompt(Prompt::TrimEnd);
        let Keyboard::Reply(rows) = keyboard else {
            panic!("expected reply keyboard");
        };
        let events: Vec<Event> = rows
            .iter()
            .flatten()
            .map(|label| reply_label_event(&localizer, label).unwrap())
            .collect();
        assert_eq!(events[0], Event::EndPreset(EndPreset::ToEnd));
        assert_eq!(events[1], Event::EndPreset(EndPreset::Plus10s));
        assert_eq!(events[6], Event::EndPreset(EndPreset::Plus10m));
        assert_eq!(events[7], Event::Back);
        assert_eq!(events[8], Event::Cancel);
    }

    #[test]
    fn free_text_is_not_a_label() {
        assert_eq!(reply_label_event(&en(), "+30 sec"), None);
        assert_eq!(reply_label_event(&en(), "40"), None);
    }

    #[rstest]
    #[case(FailureKind::QuotaExceeded)]
    #[case(FailureKind::SourceTooLarge)]
    #[case(FailureKind::SourceUnreachable)]
    #[case(FailureKind::InvalidInput)]
    #[case(FailureKind::EncodeFailed)]
    #[case(FailureKind::InsufficientSessionData)]
    fn every_failure_has_text(#[case] kind: FailureKind) {
        let localizer = en();
        let text = Texts::new(&localizer, Language::En).failure(kind, Some("boom"), 50);
        assert!(!text.starts_with('['), "{text}");
    }

    #[test]
    fn help_lists_commands_and_limits() {
        let localizer = en();
        let help = Texts::new(&localizer, Language::En).help(50, 5);
        for cmd in Command::ALL {
            assert!(help.contains(&format!("/{}", cmd.name())));
        }
        assert!(help.contains("50"));
        assert!(help.contains('5'));
    }
}
