use std::{ffi::OsString, path::PathBuf, time::Duration};

use async_trait::async_trait;

use crate::{error::Result, options::Invocation, process::run_tool};

/// The external media tool, treated as a black box.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Run one invocation. Success means the tool exited cleanly; the caller
    /// checks the output file.
    async fn encode(&self, invocation: &Invocation) -> Result<()>;
}

/// Encoder backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegEncoder {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, invocation: &Invocation) -> Result<()> {
        run_tool(&self.program, &command_args(invocation), self.timeout).await?;
        Ok(())
    }
}

/// Full argument vector for one invocation, overwriting the output.
#[must_use]
pub fn command_args(invocation: &Invocation) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect();

    for (index, input) in invocation.inputs.iter().enumerate() {
        if index == 0 {
            push_options(&mut args, &invocation.options.input);
        }
        args.push("-i".into());
        args.push(input.as_os_str().to_owned());
    }
    push_options(&mut args, &invocation.options.output);
    args.push(invocation.output.as_os_str().to_owned());
    args
}

fn push_options(args: &mut Vec<OsString>, options: &[(String, Option<String>)]) {
    for (key, value) in options {
        args.push(format!("-{key}").into());
        if let Some(value) = value {
            args.push(value.into());
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::options::EncodeOptions};

    #[test]
    fn input_options_precede_first_input_only() {
        let invocation = Invocation {
            inputs: vec!["/t/in.mp4".into(), "/t/palette.png".into()],
            output: "/t/out.gif".into(),
            options: EncodeOptions {
                input: vec![("ss".into(), Some("10".into()))],
                output: vec![("vn".into(), None), ("b:a".into(), Some("192k".into()))],
            },
        };
        let args: Vec<String> = command_args(&invocation)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(args, [
            "-hide_banner",
            "-nostdin",
            "-y",
            "-ss",
            "10",
            "-i",
            "/t/in.mp4",
            "-i",
            "/t/palette.png",
            "-vn",
            "-b:a",
            "192k",
            "/t/out.gif",
        ]);
    }
}
