use {
    reelsmith_common::{Identity, ReplyTarget},
    reelsmith_media::FileRef,
};

/// An inbound update, already stripped of transport details.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub identity: Identity,
    pub reply_to: ReplyTarget,
    /// Language code reported by the platform, e.g. `en-US`.
    pub language_hint: Option<String>,
    pub display_name: Option<String>,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundKind {
    Command(Command),
    /// A video, animation or video document hosted by the platform.
    File(FileRef),
    Text(String),
    Callback { id: String, data: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Settings,
}

impl Command {
    pub const ALL: [Self; 4] = [Self::Start, Self::Help, Self::Cancel, Self::Settings];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Cancel => "cancel",
            Self::Settings => "settings",
        }
    }

    /// Parse `/name`, `/name@bot` or `/name args`. Unknown commands are `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(name))
    }
}

/// First `http://` or `https://` token in `text`.
#[must_use]
pub fn find_url(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|word| word.starts_with("http://") || word.starts_with("https://"))
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("/start", Some(Command::Start))]
    #[case("/help@reelsmith_bot", Some(Command::Help))]
    #[case("  /cancel now", Some(Command::Cancel))]
    #[case("/SETTINGS", Some(Command::Settings))]
    #[case("/unknown", None)]
    #[case("cancel", None)]
    #[case("/", None)]
    fn parses_commands(#[case] text: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::parse(text), expected);
    }

    #[rstest]
    #[case("look https://youtu.be/abc now", Some("https://youtu.be/abc"))]
    #[case("http://vimeo.com/1", Some("http://vimeo.com/1"))]
    #[case("no link here", None)]
    #[case("ftp://host/file", None)]
    fn finds_first_url(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(find_url(text), expected);
    }
}
