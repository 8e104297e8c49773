use std::{future::Future, path::Path, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        RequestError,
        payloads::{SendAnimationSetters, SendAudioSetters, SendMessageSetters, SendVideoSetters},
        prelude::*,
        types::{
            ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
            KeyboardMarkup, KeyboardRemove, MessageId, ReplyMarkup, ReplyParameters,
        },
    },
    tracing::{debug, info, warn},
};

use {
    reelsmith_chat::{ChatOutbound, Error as ChatError, FileKind, Keyboard, Result as ChatResult},
    reelsmith_common::ReplyTarget,
};

#[cfg(feature = "metrics")]
use reelsmith_metrics::{counter, labels, telegram as tg_metrics};

/// Outbound message sender for Telegram.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn run_telegram_request_with_retry<T, F, Fut>(
        &self,
        chat_id: i64,
        operation: &'static str,
        mut request: F,
    ) -> ChatResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        record_send_error(operation);
                        return Err(ChatError::outbound(operation, err));
                    };

                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id,
                            operation,
                            retries,
                            max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        record_send_error(operation);
                        return Err(ChatError::outbound(operation, err));
                    }

                    retries += 1;
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    record_retry_after();
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

#[async_trait]
impl ChatOutbound for TelegramOutbound {
    async fn reply(&self, to: &ReplyTarget, text: &str, keyboard: Option<Keyboard>) -> ChatResult<()> {
        let chat_id = ChatId(to.chat_id);
        let reply_params = reply_params(to);
        let markup = keyboard.map(reply_markup);

        self.run_telegram_request_with_retry(to.chat_id, "send message", || {
            let mut req = self.bot.send_message(chat_id, text);
            if let Some(ref rp) = reply_params {
                req = req.reply_parameters(rp.clone());
            }
            if let Some(ref markup) = markup {
                req = req.reply_markup(markup.clone());
            }
            async move { req.await }
        })
        .await?;

        debug!(chat_id = to.chat_id, text_len = text.len(), "telegram message sent");
        Ok(())
    }

    async fn send_file(
        &self,
        to: &ReplyTarget,
        path: &Path,
        kind: FileKind,
        caption: &str,
    ) -> ChatResult<()> {
        let chat_id = ChatId(to.chat_id);
        let reply_params = reply_params(to);
        let size = tokio::fs::metadata(path).await.map(|m| m.len()).ok();

        match kind {
            FileKind::Video => {
                self.run_telegram_request_with_retry(to.chat_id, "send video", || {
                    let mut req = self
                        .bot
                        .send_video(chat_id, InputFile::file(path.to_path_buf()))
                        .caption(caption)
                        .supports_streaming(true);
                    if let Some(ref rp) = reply_params {
                        req = req.reply_parameters(rp.clone());
                    }
                    async move { req.await }
                })
                .await?;
            },
            FileKind::Animation => {
                self.run_telegram_request_with_retry(to.chat_id, "send animation", || {
                    let mut req = self
                        .bot
                        .send_animation(chat_id, InputFile::file(path.to_path_buf()))
                        .caption(caption);
                    if let Some(ref rp) = reply_params {
                        req = req.reply_parameters(rp.clone());
                    }
                    async move { req.await }
                })
                .await?;
            },
            FileKind::Audio => {
                self.run_telegram_request_with_retry(to.chat_id, "send audio", || {
                    let mut req = self
                        .bot
                        .send_audio(chat_id, InputFile::file(path.to_path_buf()))
                        .caption(caption);
                    if let Some(ref rp) = reply_params {
                        req = req.reply_parameters(rp.clone());
                    }
                    async move { req.await }
                })
                .await?;
            },
        }

        info!(
            chat_id = to.chat_id,
            reply_to = ?to.message_id,
            ?kind,
            size,
            caption_len = caption.len(),
            "telegram result file sent"
        );
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> ChatResult<()> {
        self.bot
            .answer_callback_query(callback_id)
            .await
            .map_err(|e| ChatError::outbound("answer callback", e))?;
        Ok(())
    }
}

/// Thread replies under the triggering message; still send if it was deleted.
fn reply_params(to: &ReplyTarget) -> Option<ReplyParameters> {
    to.message_id
        .map(|id| ReplyParameters::new(MessageId(id)).allow_sending_without_reply())
}

fn reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
            rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|button| InlineKeyboardButton::callback(button.label, button.data))
                    .collect::<Vec<_>>()
            }),
        )),
        Keyboard::Reply(rows) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(
                rows.into_iter()
                    .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
            )
            .resize_keyboard(),
        ),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[cfg(feature = "metrics")]
fn record_send_error(operation: &'static str) {
    counter!(tg_metrics::SEND_ERRORS_TOTAL, labels::OPERATION => operation).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_send_error(_: &'static str) {}

#[cfg(feature = "metrics")]
fn record_retry_after() {
    counter!(tg_metrics::RETRY_AFTER_TOTAL).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_retry_after() {}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, reelsmith_chat::Button};

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[test]
    fn reply_params_follow_message_id() {
        assert!(reply_params(&ReplyTarget::new(42, None)).is_none());
        let params = reply_params(&ReplyTarget::new(42, Some(7))).unwrap();
        assert_eq!(params.message_id, MessageId(7));
    }

    #[test]
    fn inline_keyboard_keeps_rows_and_callback_data() {
        let markup = reply_markup(Keyboard::Inline(vec![
            vec![Button::new("MP4", "fmt:mp4"), Button::new("GIF", "fmt:gif")],
            vec![Button::new("Cancel", "nav:cancel")],
        ]));
        let ReplyMarkup::InlineKeyboard(inline) = markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(inline.inline_keyboard.len(), 2);
        assert_eq!(inline.inline_keyboard[0].len(), 2);
        assert_eq!(inline.inline_keyboard[1][0].text, "Cancel");
    }

    #[test]
    fn reply_keyboard_sends_labels_as_text() {
        let markup = reply_markup(Keyboard::Reply(vec![
            vec!["End of video".into()],
            vec!["+10 sec".into(), "+30 sec".into(), "+1 min".into()],
        ]));
        let ReplyMarkup::Keyboard(keyboard) = markup else {
            panic!("expected reply keyboard");
        };
        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[1][2].text, "+1 min");
    }

    #[test]
    fn remove_maps_to_keyboard_remove() {
        assert!(matches!(
            reply_markup(Keyboard::Remove),
            ReplyMarkup::KeyboardRemove(_)
        ));
    }
}
