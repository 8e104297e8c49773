use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use uuid::Uuid;

use crate::{error::Error, temp::TempArea};

/// A file on disk produced or consumed by a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    other => Err(Error::invalid_input(format!(
                        concat!("unknown ", stringify!($name), " `{}`"),
                        other
                    ))),
                }
            }
        }
    };
}

choice_enum! {
    /// Target container for `convert`.
    VideoFormat {
        Mp4 => "mp4",
        Mkv => "mkv",
        Avi => "avi",
        Mov => "mov",
        Webm => "webm",
        Gif => "gif",
    }
}

choice_enum! {
    /// Compression tier.
    Quality {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

choice_enum! {
    AudioFormat {
        Mp3 => "mp3",
        Wav => "wav",
        Aac => "aac",
    }
}

choice_enum! {
    Bitrate {
        K320 => "320k",
        K192 => "192k",
        K128 => "128k",
    }
}

/// Seconds offset into the source, fractional allowed.
pub type Seconds = f64;

/// A fully parameterized operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Convert {
        format: VideoFormat,
    },
    Compress {
        quality: Quality,
    },
    ExtractAudio {
        format: AudioFormat,
        bitrate: Bitrate,
        start: Option<Seconds>,
        end: Option<Seconds>,
    },
    Trim {
        start: Seconds,
        /// `None` trims to the end of the source.
        end: Option<Seconds>,
    },
}

impl Operation {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Convert { .. } => "convert",
            Self::Compress { .. } => "compress",
            Self::ExtractAudio { .. } => "extract_audio",
            Self::Trim { .. } => "trim",
        }
    }

    /// Extension of the output artifact. Operations that keep the container
    /// reuse the input's when it is a video container, falling back to mp4.
    #[must_use]
    pub fn output_extension(&self, input: &Path) -> &'static str {
        match self {
            Self::Convert { format } => format.code(),
            Self::ExtractAudio { format, .. } => format.code(),
            Self::Compress { .. } | Self::Trim { .. } => input
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .and_then(|ext| match ext.as_str() {
                    "mp4" => Some("mp4"),
                    "mkv" => Some("mkv"),
                    "mov" => Some("mov"),
                    "avi" => Some("avi"),
                    _ => None,
                })
                .unwrap_or("mp4"),
        }
    }

    #[must_use]
    pub fn produces_audio(&self) -> bool {
        matches!(self, Self::ExtractAudio { .. })
    }

    #[must_use]
    pub fn produces_animation(&self) -> bool {
        matches!(self, Self::Convert {
            format: VideoFormat::Gif
        })
    }
}

/// One invocation request: input, operation, and a fresh output path.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaJob {
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub operation: Operation,
}

impl MediaJob {
    /// Build a job whose output path is allocated in `temp`.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, operation: Operation, temp: &TempArea) -> Self {
        let input = input.into();
        let output = temp.allocate(operation.output_extension(&input));
        Self {
            id: Uuid::new_v4(),
            input,
            output,
            operation,
        }
    }
}
