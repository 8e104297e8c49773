mod config_commands;
mod doctor_commands;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    reelsmith_chat::ConversationService,
    reelsmith_common::Identity,
    reelsmith_config::{ReelsmithConfig, Severity},
    reelsmith_i18n::{Language, Localizer},
    reelsmith_media::{
        DomainAllowlist, FfmpegEncoder, JobExecutor, RetryPolicy, SourceAcquirer, TempArea,
        YtDlpDownloader,
    },
    reelsmith_metrics::MetricsRecorderConfig,
    reelsmith_sessions::{QuotaGuard, QuotaPolicy, SessionStore},
    reelsmith_telegram::{TelegramFiles, TelegramOutbound},
};

#[derive(Parser)]
#[command(name = "reelsmith", about = "reelsmith: Telegram video conversion bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "REELSMITH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Check configuration, external tools and the temp directory.
    Doctor,
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: Option<config_commands::ConfigAction>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// File (or defaults) with environment overrides applied.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<ReelsmithConfig> {
    let mut config = reelsmith_config::discover_and_load(explicit)?;
    reelsmith_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "reelsmith starting");
            let config = load_config(cli.config.as_deref())?;
            run_bot(config).await
        },
        Some(Commands::Doctor) => doctor_commands::handle_doctor(cli.config.as_deref()),
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action.unwrap_or_default(), cli.config.as_deref())
        },
    }
}

async fn run_bot(config: ReelsmithConfig) -> anyhow::Result<()> {
    let report = reelsmith_config::validate(&config);
    for d in &report.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    if report.has_errors() {
        anyhow::bail!("configuration has errors, run `reelsmith doctor` for details");
    }

    reelsmith_metrics::init_metrics(&MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        listen: config.metrics.listen.clone(),
    })?;

    let temp = TempArea::open(&config.media.temp_dir)?;
    let swept = temp.purge()?;
    if swept > 0 {
        info!(count = swept, dir = %temp.root().display(), "removed leftover temp files");
    }

    let default_language = Language::from_code(&config.i18n.default_language).unwrap_or_else(|| {
        warn!(
            language = %config.i18n.default_language,
            "unsupported default language, falling back to ru"
        );
        Language::Ru
    });
    let localizer = Localizer::new(default_language);

    let bot = reelsmith_telegram::build_bot(&config.telegram.token, &config.telegram.api_url)?;
    reelsmith_telegram::register_commands(&bot, &localizer).await;

    let limits = &config.limits;
    let quota = QuotaGuard::new(
        QuotaPolicy {
            max_requests: limits.max_requests_per_window,
            window: Duration::from_secs(limits.window_secs),
        },
        limits.admin_ids.iter().copied().map(Identity),
    );

    let tool_timeout = Duration::from_secs(config.media.encode_timeout_secs);
    let acquirer = SourceAcquirer::new(
        Arc::new(TelegramFiles::new(bot.clone())),
        Arc::new(YtDlpDownloader::new(
            config.media.downloader_path.clone(),
            tool_timeout,
        )),
        DomainAllowlist::new(&config.media.allowed_domains),
        temp.clone(),
        limits.max_file_size_bytes(),
    );
    let executor = JobExecutor::new(
        Arc::new(FfmpegEncoder::new(config.media.ffmpeg_path.clone(), tool_timeout)),
        temp,
        RetryPolicy {
            attempts: config.media.encode_attempts,
            delay: Duration::from_millis(config.media.retry_delay_ms),
        },
    );

    let service = Arc::new(ConversationService::new(
        quota,
        SessionStore::new(),
        acquirer,
        executor,
        Arc::new(TelegramOutbound::new(bot.clone())),
        localizer,
    ));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                shutdown.cancel();
            },
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    reelsmith_telegram::run_polling(bot, service, cancel).await?;
    info!("reelsmith stopped");
    Ok(())
}
