//! Metric name and label definitions.
//!
//! Every metric the bot records is named here so dashboards have one place
//! to look.

/// Quota guard metrics
pub mod quota {
    /// Requests evaluated by the quota guard
    pub const DECISIONS_TOTAL: &str = "reelsmith_quota_decisions_total";
    /// Requests rejected because the window was full
    pub const REJECTED_TOTAL: &str = "reelsmith_quota_rejected_total";
}

/// Session metrics
pub mod sessions {
    /// Sessions opened by an accepted source
    pub const STARTED_TOTAL: &str = "reelsmith_sessions_started_total";
    /// Sessions ended by an explicit cancel
    pub const CANCELLED_TOTAL: &str = "reelsmith_sessions_cancelled_total";
    /// Submissions refused because a session was already open
    pub const BUSY_TOTAL: &str = "reelsmith_sessions_busy_total";
    /// Number of currently open sessions
    pub const ACTIVE: &str = "reelsmith_sessions_active";
}

/// Media job metrics
pub mod jobs {
    /// Jobs executed, labelled by operation and outcome
    pub const EXECUTED_TOTAL: &str = "reelsmith_jobs_executed_total";
    /// Encoder invocations that failed and were retried
    pub const RETRIES_TOTAL: &str = "reelsmith_jobs_retries_total";
    /// Wall-clock duration of a whole job in seconds
    pub const DURATION_SECONDS: &str = "reelsmith_job_duration_seconds";
}

/// Source acquisition metrics
pub mod acquire {
    /// Sources acquired, labelled by origin (platform or url)
    pub const ACQUIRED_TOTAL: &str = "reelsmith_acquire_total";
    /// Acquisitions refused, labelled by error type
    pub const REJECTED_TOTAL: &str = "reelsmith_acquire_rejected_total";
    /// Bytes pulled into the temp area
    pub const BYTES_TOTAL: &str = "reelsmith_acquire_bytes_total";
}

/// Telegram transport metrics
pub mod telegram {
    pub const UPDATES_TOTAL: &str = "reelsmith_telegram_updates_total";
    pub const SEND_ERRORS_TOTAL: &str = "reelsmith_telegram_send_errors_total";
    /// Sends delayed by a Bot API flood-control response
    pub const RETRY_AFTER_TOTAL: &str = "reelsmith_telegram_retry_after_total";
}

/// Common label keys
pub mod labels {
    pub const OPERATION: &str = "operation";
    pub const OUTCOME: &str = "outcome";
    pub const ORIGIN: &str = "origin";
    pub const ERROR_TYPE: &str = "error_type";
    pub const KIND: &str = "kind";
}

/// Histogram buckets
pub mod buckets {
    /// Job duration buckets (in seconds), 100ms to 30 minutes
    pub const JOB_DURATION: &[f64] = &[
        0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
    ];
}
