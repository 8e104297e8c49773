//! Deterministic encoder option building.
//!
//! Every [`Operation`] maps to a fixed [`EncodePlan`]: one invocation for
//! most operations, two for GIF (palette generation, then paletted encode).

use std::path::{Path, PathBuf};

use crate::{
    job::{AudioFormat, MediaJob, Operation, Quality, Seconds, VideoFormat},
    temp::TempArea,
};

const GIF_FPS: u32 = 12;
const GIF_WIDTH: u32 = 640;
const GIF_DITHER: &str = "sierra2_4a";

/// Ordered `key -> value` options. A `None` value is a bare flag (`-vn`).
pub type OptionList = Vec<(String, Option<String>)>;

/// Options for one encoder invocation, split by where they go on the
/// command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeOptions {
    /// Placed before the first input, so seeking happens before decoding.
    pub input: OptionList,
    pub output: OptionList,
}

impl EncodeOptions {
    fn input(mut self, key: &str, value: impl Into<String>) -> Self {
        self.input.push((key.to_string(), Some(value.into())));
        self
    }

    fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.output.push((key.to_string(), Some(value.into())));
        self
    }

    fn flag(mut self, key: &str) -> Self {
        self.output.push((key.to_string(), None));
        self
    }

    /// Value of `key`, output options searched first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.output
            .iter()
            .chain(self.input.iter())
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.output
            .iter()
            .chain(self.input.iter())
            .any(|(k, _)| k == key)
    }
}

/// A single call to the media tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// The first input receives `options.input`; later inputs are plain.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub options: EncodeOptions,
}

/// The invocations needed for a job plus transient files to delete afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    pub invocations: Vec<Invocation>,
    pub intermediates: Vec<PathBuf>,
}

impl EncodePlan {
    fn single(input: &Path, output: &Path, options: EncodeOptions) -> Self {
        Self {
            invocations: vec![Invocation {
                inputs: vec![input.to_path_buf()],
                output: output.to_path_buf(),
                options,
            }],
            intermediates: Vec::new(),
        }
    }
}

/// Build the plan for `job`. Intermediate paths are allocated in `temp`.
#[must_use]
pub fn plan(job: &MediaJob, temp: &TempArea) -> EncodePlan {
    let streaming = streams_from_start(&job.output);
    match &job.operation {
        Operation::Convert {
            format: VideoFormat::Gif,
        } => gif_plan(&job.input, &job.output, temp.allocate("png")),
        Operation::Convert { format } => {
            EncodePlan::single(&job.input, &job.output, convert_options(*format))
        },
        Operation::Compress { quality } => EncodePlan::single(
            &job.input,
            &job.output,
            compress_options(*quality, streaming),
        ),
        Operation::ExtractAudio {
            format,
            bitrate,
            start,
            end,
        } => {
            let mut options = seek(EncodeOptions::default(), *start, *end).flag("vn");
            options = match format {
                AudioFormat::Mp3 => options
                    .set("c:a", "libmp3lame")
                    .set("b:a", bitrate.code()),
                AudioFormat::Aac => options.set("c:a", "aac").set("b:a", bitrate.code()),
                // PCM has a fixed bitrate.
                AudioFormat::Wav => options.set("c:a", "pcm_s16le"),
            };
            EncodePlan::single(&job.input, &job.output, options)
        },
        Operation::Trim { start, end } => {
            let mut options = seek(EncodeOptions::default(), Some(*start), *end)
                .set("c:v", "libx264")
                .set("crf", "16")
                .set("preset", "medium")
                .set("c:a", "aac")
                .set("b:a", "192k")
                .set("flags", "+global_header");
            if streaming {
                options = options.set("movflags", "+faststart");
            }
            EncodePlan::single(&job.input, &job.output, options)
        },
    }
}

/// mp4 and mov carry a moov atom that can be moved to the front.
fn streams_from_start(output: &Path) -> bool {
    matches!(
        output.extension().and_then(|e| e.to_str()),
        Some("mp4" | "mov")
    )
}

fn seek(options: EncodeOptions, start: Option<Seconds>, end: Option<Seconds>) -> EncodeOptions {
    let options = match start {
        Some(s) => options.input("ss", format_seconds(s)),
        None => options,
    };
    match end {
        Some(e) => options.input("to", format_seconds(e)),
        None => options,
    }
}

fn format_seconds(value: Seconds) -> String {
    format!("{value}")
}

fn convert_options(format: VideoFormat) -> EncodeOptions {
    let base = EncodeOptions::default();
    match format {
        VideoFormat::Mp4 | VideoFormat::Mov => h264_convert(base).set("movflags", "+faststart"),
        VideoFormat::Mkv => h264_convert(base),
        VideoFormat::Webm => base
            .set("c:v", "libvpx-vp9")
            .set("crf", "30")
            .set("b:v", "0")
            .set("deadline", "good")
            .set("c:a", "libopus")
            .set("b:a", "128k"),
        VideoFormat::Avi => base
            .set("c:v", "mpeg4")
            .set("q:v", "3")
            .set("c:a", "libmp3lame")
            .set("b:a", "192k"),
        VideoFormat::Gif => base,
    }
}

fn h264_convert(options: EncodeOptions) -> EncodeOptions {
    options
        .set("c:v", "libx264")
        .set("crf", "20")
        .set("preset", "medium")
        .set("pix_fmt", "yuv420p")
        .set("c:a", "aac")
        .set("b:a", "192k")
}

/// CRF and preset per tier.
#[must_use]
pub fn compression_tier(quality: Quality) -> (u8, &'static str) {
    match quality {
        Quality::Low => (28, "faster"),
        Quality::Medium => (23, "medium"),
        Quality::High => (20, "medium"),
    }
}

fn compress_options(quality: Quality, streaming: bool) -> EncodeOptions {
    let (crf, preset) = compression_tier(quality);
    let options = EncodeOptions::default()
        .set("c:v", "libx264")
        .set("crf", crf.to_string())
        .set("preset", preset);
    if streaming {
        options.set("movflags", "+faststart")
    } else {
        options
    }
}

fn gif_plan(input: &Path, output: &Path, palette: PathBuf) -> EncodePlan {
    let scale = format!("fps={GIF_FPS},scale={GIF_WIDTH}:-1:flags=lanczos");
    let palettegen = EncodeOptions::default().set("vf", format!("{scale},palettegen=stats_mode=diff"));
    let paletteuse = EncodeOptions::default().set(
        "filter_complex",
        format!("{scale}[x];[x][1:v]paletteuse=dither={GIF_DITHER}:diff_mode=rectangle"),
    );
    EncodePlan {
        invocations: vec![
            Invocation {
                inputs: vec![input.to_path_buf()],
                output: palette.clone(),
                options: palettegen,
            },
            Invocation {
                inputs: vec![input.to_path_buf(), palette.clone()],
                output: output.to_path_buf(),
                options: paletteuse,
            },
        ],
        intermediates: vec![palette],
    }
}
