use std::{sync::Arc, time::Duration};

use {
    reelsmith_chat::{Command, ConversationService, EventDispatcher, Texts},
    reelsmith_i18n::{Language, Localizer},
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        ApiError, RequestError,
        payloads::SetMyCommandsSetters,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use reelsmith_metrics::{counter, labels, telegram as tg_metrics};

use crate::{
    error::{Error, Result},
    handlers,
};

/// Long-poll timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;

/// Build a bot handle for `api_url`.
///
/// The client timeout is longer than the long-polling timeout so the HTTP
/// client doesn't abort the request before Telegram responds.
pub fn build_bot(token: &Secret<String>, api_url: &str) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(45))
        .build()?;
    let url = reqwest::Url::parse(api_url)
        .map_err(|e| Error::external(format!("invalid bot api url `{api_url}`"), e))?;
    Ok(Bot::with_client(token.expose_secret(), client).set_api_url(url))
}

/// Register the slash commands in every supported language, plus a default
/// list for clients in other languages.
pub async fn register_commands(bot: &Bot, localizer: &Localizer) {
    let commands_for = |language: Language| {
        Texts::new(localizer, language)
            .commands()
            .into_iter()
            .map(|(command, description)| BotCommand::new(command.name(), description))
            .collect::<Vec<_>>()
    };

    if let Err(e) = bot
        .set_my_commands(commands_for(localizer.default_language()))
        .await
    {
        warn!(error = %e, "failed to register bot commands");
    }
    for language in Language::ALL {
        if let Err(e) = bot
            .set_my_commands(commands_for(language))
            .language_code(language.code())
            .await
        {
            warn!(language = language.code(), error = %e, "failed to register bot commands");
        }
    }
    debug!(count = Command::ALL.len(), "bot commands registered");
}

/// Poll for updates until `cancel` fires. Updates are handed to `service`
/// through an [`EventDispatcher`], in order per user and concurrently across
/// users.
///
/// Returns an error when another process is already polling with the same
/// token; the token is cancelled in that case.
pub async fn run_polling(
    bot: Bot,
    service: Arc<ConversationService>,
    cancel: CancellationToken,
) -> Result<()> {
    let me = bot.get_me().await?;
    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;
    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    let dispatcher = EventDispatcher::new(service);

    let mut offset: i32 = 0;
    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);

        let result = tokio::select! {
            () = cancel.cancelled() => {
                info!("telegram polling stopped");
                return Ok(());
            },
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    let event = match update.kind {
                        UpdateKind::Message(msg) => {
                            record_update("message");
                            handlers::message_event(&msg)
                        },
                        UpdateKind::CallbackQuery(query) => {
                            record_update("callback");
                            debug!(callback_data = ?query.data, "received telegram callback query");
                            handlers::callback_event(&query)
                        },
                        other => {
                            debug!("ignoring non-message update: {other:?}");
                            None
                        },
                    };
                    if let Some(event) = event {
                        dispatcher.dispatch(event);
                    }
                }
            },
            Err(e) => {
                // Another bot instance is running with the same token.
                if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                    warn!("telegram polling disabled: another instance is already running with this token");
                    cancel.cancel();
                    return Err(e.into());
                }

                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => return Ok(()),
                    () = tokio::time::sleep(Duration::from_secs(5)) => {},
                }
            },
        }
    }
}

#[cfg(feature = "metrics")]
fn record_update(kind: &'static str) {
    counter!(tg_metrics::UPDATES_TOTAL, labels::KIND => kind).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_update(_: &'static str) {}
