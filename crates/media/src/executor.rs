use std::{sync::Arc, time::Duration};

#[cfg(feature = "metrics")]
use std::time::Instant;

use tracing::{info, warn};

#[cfg(feature = "metrics")]
use reelsmith_metrics::{counter, histogram, jobs as job_metrics, labels};

use crate::{
    encoder::Encoder,
    error::{Error, Result},
    job::{Artifact, MediaJob},
    options::{Invocation, plan},
    temp::TempArea,
};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included. Zero is treated as one.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Runs [`MediaJob`]s against an [`Encoder`], owning retry and the
/// lifecycle of intermediate and partial files.
#[derive(Clone)]
pub struct JobExecutor {
    encoder: Arc<dyn Encoder>,
    temp: TempArea,
    retry: RetryPolicy,
}

impl JobExecutor {
    pub fn new(encoder: Arc<dyn Encoder>, temp: TempArea, retry: RetryPolicy) -> Self {
        Self {
            encoder,
            temp,
            retry,
        }
    }

    #[must_use]
    pub fn temp(&self) -> &TempArea {
        &self.temp
    }

    /// Execute `job`. On success the output artifact exists; on failure no
    /// output or intermediate file is left behind. The input is untouched.
    pub async fn run(&self, job: &MediaJob) -> Result<Artifact> {
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let plan = plan(job, &self.temp);
        let mut outcome = Ok(());
        for invocation in &plan.invocations {
            outcome = self.invoke_with_retry(job, invocation).await;
            if outcome.is_err() {
                break;
            }
        }

        for intermediate in &plan.intermediates {
            self.temp.cleanup(intermediate);
        }

        let result = outcome.and_then(|()| {
            let size = std::fs::metadata(&job.output)
                .map_err(|e| Error::external("encoder reported success but produced no output", e))?
                .len();
            Ok(Artifact {
                path: job.output.clone(),
                size,
            })
        });

        match &result {
            Ok(artifact) => info!(
                job_id = %job.id,
                operation = job.operation.name(),
                size = artifact.size,
                "job finished"
            ),
            Err(e) => {
                self.temp.cleanup(&job.output);
                warn!(job_id = %job.id, operation = job.operation.name(), error = %e, "job failed");
            },
        }

        #[cfg(feature = "metrics")]
        {
            let outcome = if result.is_ok() {
                "success"
            } else {
                "failure"
            };
            counter!(
                job_metrics::EXECUTED_TOTAL,
                labels::OPERATION => job.operation.name(),
                labels::OUTCOME => outcome
            )
            .increment(1);
            histogram!(job_metrics::DURATION_SECONDS, labels::OPERATION => job.operation.name())
                .record(started.elapsed().as_secs_f64());
        }

        result
    }

    async fn invoke_with_retry(&self, job: &MediaJob, invocation: &Invocation) -> Result<()> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.encoder.encode(invocation).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(
                        job_id = %job.id,
                        attempt,
                        attempts,
                        error = %e,
                        "encoder attempt failed, retrying"
                    );
                    #[cfg(feature = "metrics")]
                    counter!(job_metrics::RETRIES_TOTAL).increment(1);
                    self.temp.cleanup(&invocation.output);
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    return Err(Error::EncodeFailed {
                        attempts,
                        last: Box::new(e),
                    });
                },
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    };

    use {async_trait::async_trait, tokio::time::Instant};

    use super::*;
    use crate::job::{Operation, Quality, VideoFormat};

    /// Fails the first `failures` calls, then writes the output file.
    struct FlakyEncoder {
        failures: u32,
        calls: AtomicU32,
        seen: Mutex<Vec<Invocation>>,
    }

    impl FlakyEncoder {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Encoder for FlakyEncoder {
        async fn encode(&self, invocation: &Invocation) -> Result<()> {
            self.seen.lock().unwrap().push(invocation.clone());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            std::fs::write(&invocation.output, b"partial").unwrap();
            if call < self.failures {
                return Err(Error::ToolFailed {
                    tool: "ffmpeg".into(),
                    code: Some(1),
                    stderr_tail: "resource busy".into(),
                });
            }
            Ok(())
        }
    }

    fn setup(failures: u32) -> (tempfile::TempDir, Arc<FlakyEncoder>, JobExecutor) {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempArea::open(dir.path()).unwrap();
        let encoder = FlakyEncoder::new(failures);
        let executor = JobExecutor::new(encoder.clone(), temp, RetryPolicy::default());
        (dir, encoder, executor)
    }

    fn compress_job(executor: &JobExecutor) -> MediaJob {
        let input = executor.temp().allocate("mp4");
        std::fs::write(&input, b"source").unwrap();
        MediaJob::new(
            input,
            Operation::Compress {
                quality: Quality::Medium,
            },
            executor.temp(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried_with_fixed_delay() {
        let (_dir, encoder, executor) = setup(2);
        let job = compress_job(&executor);

        let started = Instant::now();
        let artifact = executor.run(&job).await.unwrap();

        assert_eq!(encoder.calls.load(Ordering::SeqCst), 3);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(5));
        assert_eq!(artifact.path, job.output);
        assert!(artifact.path.exists());
        assert!(job.input.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts_and_removes_partial_output() {
        let (_dir, encoder, executor) = setup(u32::MAX);
        let job = compress_job(&executor);

        let err = executor.run(&job).await.unwrap_err();

        assert!(matches!(err, Error::EncodeFailed { attempts: 3, .. }));
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 3);
        assert!(!job.output.exists());
        assert!(job.input.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn gif_palette_is_removed_on_success() {
        let (_dir, encoder, executor) = setup(0);
        let input = executor.temp().allocate("mp4");
        std::fs::write(&input, b"source").unwrap();
        let job = MediaJob::new(
            input,
            Operation::Convert {
                format: VideoFormat::Gif,
            },
            executor.temp(),
        );

        executor.run(&job).await.unwrap();

        let seen = encoder.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let palette = &seen[0].output;
        assert!(!palette.exists());
        assert!(job.output.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn gif_palette_is_removed_when_second_stage_fails() {
        struct SecondStageFails(AtomicU32);

        #[async_trait]
        impl Encoder for SecondStageFails {
            async fn encode(&self, invocation: &Invocation) -> Result<()> {
                std::fs::write(&invocation.output, b"x").unwrap();
                if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(())
                } else {
                    Err(Error::invalid_input("bad palette"))
                }
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let temp = TempArea::open(dir.path()).unwrap();
        let executor = JobExecutor::new(
            Arc::new(SecondStageFails(AtomicU32::new(0))),
            temp.clone(),
            RetryPolicy::default(),
        );
        let input = temp.allocate("mp4");
        std::fs::write(&input, b"source").unwrap();
        let job = MediaJob::new(
            input.clone(),
            Operation::Convert {
                format: VideoFormat::Gif,
            },
            &temp,
        );

        assert!(executor.run(&job).await.is_err());

        let left: Vec<_> = std::fs::read_dir(temp.root())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(left, vec![input]);
    }
}
