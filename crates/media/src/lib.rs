//! Media pipeline: temp artifacts, job description, encoder option building,
//! retrying job execution, and source acquisition.

pub mod acquire;
pub mod encoder;
pub mod error;
pub mod executor;
pub mod job;
pub mod options;
pub mod process;
pub mod temp;

pub use {
    acquire::{
        DomainAllowlist, Downloader, FileRef, PlatformFileStore, RemoteFile, SourceAcquirer,
        YtDlpDownloader,
    },
    encoder::{Encoder, FfmpegEncoder},
    error::{AcquireError, Error, Result},
    executor::{JobExecutor, RetryPolicy},
    job::{Artifact, AudioFormat, Bitrate, MediaJob, Operation, Quality, Seconds, VideoFormat},
    options::{EncodeOptions, EncodePlan, Invocation},
    temp::TempArea,
};
