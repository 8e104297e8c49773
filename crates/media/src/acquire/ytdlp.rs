use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use {async_trait::async_trait, tracing::debug, url::Url};

use crate::{
    acquire::Downloader,
    error::{Error, Result},
    process::run_tool,
};

/// Downloader backed by the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlpDownloader {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn fetch(&self, url: &Url, output_template: &Path, max_bytes: Option<u64>) -> Result<PathBuf> {
        let output = run_tool(
            &self.program,
            &command_args(url, output_template, max_bytes),
            self.timeout,
        )
        .await?;

        let reported = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(PathBuf::from);

        match (reported, max_bytes) {
            (Some(path), _) => Ok(path),
            // An item over --max-filesize is skipped with a zero exit and no
            // printed path. The notice itself is suppressed in --print mode.
            (None, Some(limit)) => {
                if mentions_size_limit(&output.stdout) || mentions_size_limit(&output.stderr_tail) {
                    debug!(%url, limit, "downloader skipped oversized item");
                } else {
                    debug!(%url, limit, "downloader reported no path under a size limit");
                }
                Err(Error::SizeLimitExceeded { limit })
            },
            (None, None) => Err(Error::Message(
                "downloader did not report an output path".into(),
            )),
        }
    }
}

fn mentions_size_limit(text: &str) -> bool {
    text.contains("larger than max-filesize")
}

/// Single item, mp4 preferred, final path printed on stdout.
fn command_args(url: &Url, output_template: &Path, max_bytes: Option<u64>) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--format",
        "best[ext=mp4]/best",
        "--no-playlist",
        "--restrict-filenames",
        "--no-warnings",
        "--no-progress",
        "--print",
        "after_move:filepath",
        "--no-simulate",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    if let Some(max) = max_bytes {
        args.push("--max-filesize".into());
        args.push(max.to_string().into());
    }
    args.push("--output".into());
    args.push(output_template.as_os_str().to_owned());
    args.push("--".into());
    args.push(url.as_str().into());
    args
}
