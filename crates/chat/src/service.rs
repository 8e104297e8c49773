//! The conversation service: one entry point per inbound event.
//!
//! Control flow for a source submission is quota check, session claim,
//! acquisition, operation prompt. Later events run through the session
//! store's transition and the resulting [`Effect`] is carried out here:
//! prompts go out, jobs run, artifacts are released. Every terminal failure
//! produces exactly one reply to the event that opened the session.

use std::{path::Path, sync::Arc};

use {
    reelsmith_common::{Identity, ReplyTarget},
    reelsmith_i18n::{Language, LanguagePrefs, Localizer},
    reelsmith_media::{FileRef, JobExecutor, MediaJob, Operation, SourceAcquirer},
    reelsmith_sessions::{
        Applied, Effect, Event, FailureKind, Phase, QuotaGuard, SessionStore,
    },
    tracing::{debug, error, info, warn},
    url::Url,
};

use crate::{
    callbacks::Action,
    error::Result,
    event::{Command, InboundEvent, InboundKind, find_url},
    outbound::{ChatOutbound, FileKind, Keyboard},
    prompts::{Texts, reply_label_event},
};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Who an event came from and where to answer it.
struct Turn {
    identity: Identity,
    reply_to: ReplyTarget,
    language: Language,
}

enum Source {
    Platform(FileRef),
    Url(String),
}

/// A source that passed validation.
enum Fetch {
    Platform(FileRef),
    Url(Url),
}

pub struct ConversationService {
    quota: QuotaGuard,
    sessions: SessionStore,
    acquirer: SourceAcquirer,
    executor: JobExecutor,
    outbound: Arc<dyn ChatOutbound>,
    localizer: Localizer,
    prefs: LanguagePrefs,
}

impl ConversationService {
    pub fn new(
        quota: QuotaGuard,
        sessions: SessionStore,
        acquirer: SourceAcquirer,
        executor: JobExecutor,
        outbound: Arc<dyn ChatOutbound>,
        localizer: Localizer,
    ) -> Self {
        Self {
            quota,
            sessions,
            acquirer,
            executor,
            outbound,
            localizer,
            prefs: LanguagePrefs::new(),
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    fn texts(&self, language: Language) -> Texts<'_> {
        Texts::new(&self.localizer, language)
    }

    fn max_file_size_mb(&self) -> u64 {
        self.acquirer.max_bytes() / BYTES_PER_MB
    }

    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        let language = self.prefs.resolve(
            event.identity,
            event.language_hint.as_deref(),
            self.localizer.default_language(),
        );
        let turn = Turn {
            identity: event.identity,
            reply_to: event.reply_to,
            language,
        };

        match event.kind {
            InboundKind::Command(command) => {
                self.on_command(&turn, command, event.display_name.as_deref())
                    .await
            },
            InboundKind::File(file) => self.accept_source(&turn, Source::Platform(file)).await,
            InboundKind::Text(text) => self.on_text(&turn, &text).await,
            InboundKind::Callback { id, data } => self.on_callback(&turn, &id, &data).await,
        }
    }

    async fn on_command(&self, turn: &Turn, command: Command, name: Option<&str>) -> Result<()> {
        let texts = self.texts(turn.language);
        match command {
            Command::Start => {
                let text = texts.greeting(name.unwrap_or_default());
                self.say(&turn.reply_to, &text, None).await
            },
            Command::Help => {
                let text = texts.help(self.max_file_size_mb(), self.quota.policy().max_requests);
                self.say(&turn.reply_to, &text, None).await
            },
            Command::Cancel => self.advance(turn, Event::Cancel).await,
            Command::Settings => {
                let (text, keyboard) = texts.settings();
                self.say(&turn.reply_to, &text, Some(keyboard)).await
            },
        }
    }

    async fn on_text(&self, turn: &Turn, text: &str) -> Result<()> {
        let phase = self.sessions.phase(turn.identity);
        if phase == Phase::Idle {
            return match find_url(text) {
                Some(url) => self.accept_source(turn, Source::Url(url.to_string())).await,
                None => {
                    let prompt = self.texts(turn.language).get("status", "send_source");
                    self.say(&turn.reply_to, &prompt, None).await
                },
            };
        }

        let takes_text = matches!(phase, Phase::AwaitingTrimStart | Phase::AwaitingTrimEnd);
        if !takes_text && find_url(text).is_some() {
            return self.busy(turn).await;
        }

        let event = if phase == Phase::AwaitingTrimEnd {
            reply_label_event(&self.localizer, text).unwrap_or_else(|| Event::Text(text.into()))
        } else {
            match reply_label_event(&self.localizer, text) {
                Some(Event::Cancel) => Event::Cancel,
                _ => Event::Text(text.into()),
            }
        };
        self.advance(turn, event).await
    }

    async fn on_callback(&self, turn: &Turn, id: &str, data: &str) -> Result<()> {
        if let Err(e) = self.outbound.answer_callback(id).await {
            warn!(identity = %turn.identity, error = %e, "failed to answer callback");
        }

        match Action::decode(data) {
            Some(Action::Language(language)) => {
                self.prefs.set(turn.identity, language);
                info!(identity = %turn.identity, %language, "language changed");
                let text = self.texts(language).get("settings", "changed");
                self.say(&turn.reply_to, &text, None).await
            },
            Some(action) => match action.to_event() {
                Some(event) => self.advance(turn, event).await,
                None => Ok(()),
            },
            None => {
                debug!(identity = %turn.identity, data, "ignoring unknown callback data");
                Ok(())
            },
        }
    }

    /// Open a session for a new source and fetch it.
    async fn accept_source(&self, turn: &Turn, source: Source) -> Result<()> {
        let identity = turn.identity;
        if self.sessions.phase(identity) != Phase::Idle {
            return self.busy(turn).await;
        }

        let fetch = match source {
            Source::Url(raw) => match self.acquirer.check_url(&raw) {
                Ok(url) => Fetch::Url(url),
                Err(e) => return self.fail(turn, &turn.reply_to, FailureKind::from(&e), None).await,
            },
            Source::Platform(file) => Fetch::Platform(file),
        };

        let admission = self.quota.admit(identity);
        if !admission.allowed {
            return self
                .fail(turn, &turn.reply_to, FailureKind::QuotaExceeded, None)
                .await;
        }

        if !self.sessions.claim(identity, turn.reply_to.clone()) {
            return self.busy(turn).await;
        }

        let privileged = self.quota.is_privileged(identity);
        let texts = self.texts(turn.language);
        let fetched = match &fetch {
            Fetch::Url(url) => {
                self.notify(&turn.reply_to, &texts.get("status", "downloading"), None)
                    .await;
                self.acquirer.fetch_from_url(url, privileged).await
            },
            Fetch::Platform(file) => {
                self.notify(&turn.reply_to, &texts.get("status", "receiving"), None)
                    .await;
                self.acquirer.fetch_from_platform(file, privileged).await
            },
        };

        match fetched {
            Ok(artifact) => match self.sessions.source_ready(identity, artifact.path.clone()) {
                Some(applied) => self.carry_out(turn, applied).await,
                None => {
                    info!(%identity, "source arrived after the session was closed");
                    self.release(&artifact.path);
                    Ok(())
                },
            },
            Err(e) => {
                warn!(%identity, error = %e, "source acquisition failed");
                match self.sessions.abandon(identity) {
                    Some(session) => {
                        self.fail(turn, &session.reply_to, FailureKind::from(&e), None)
                            .await
                    },
                    None => Ok(()),
                }
            },
        }
    }

    async fn advance(&self, turn: &Turn, event: Event) -> Result<()> {
        let from = self.sessions.phase(turn.identity);
        let applied = self.sessions.apply(turn.identity, event);

        // The trim end prompt shows a reply keyboard; it has to be cleared
        // explicitly when the next prompt does not replace it.
        if from == Phase::AwaitingTrimEnd
            && applied.phase != Phase::AwaitingTrimEnd
            && let Effect::Prompt(prompt) = &applied.effect
        {
            let (text, _) = self.texts(turn.language).prompt(*prompt);
            return self.say(&turn.reply_to, &text, Some(Keyboard::Remove)).await;
        }
        self.carry_out(turn, applied).await
    }

    async fn carry_out(&self, turn: &Turn, applied: Applied) -> Result<()> {
        let texts = self.texts(turn.language);
        match applied.effect {
            Effect::Prompt(prompt) => {
                let (text, keyboard) = texts.prompt(prompt);
                self.say(&turn.reply_to, &text, Some(keyboard)).await
            },
            Effect::Reprompt { prompt, error } => {
                debug!(identity = %turn.identity, %error, "input refused");
                let (text, keyboard) = texts.reprompt(prompt, &error);
                self.say(&turn.reply_to, &text, Some(keyboard)).await
            },
            Effect::Execute(operation) => {
                let reply_to = applied.reply_to.unwrap_or_else(|| turn.reply_to.clone());
                self.execute(turn, operation, applied.source.as_deref(), &reply_to)
                    .await
            },
            Effect::Cancelled => {
                if let Some(source) = &applied.source {
                    self.release(source);
                }
                info!(identity = %turn.identity, "session cancelled");
                let text = texts.get("status", "cancelled");
                self.say(&turn.reply_to, &text, Some(Keyboard::Remove)).await
            },
            Effect::NothingToCancel => {
                let text = texts.get("status", "nothing_to_cancel");
                self.say(&turn.reply_to, &text, None).await
            },
            Effect::Busy => self.busy(turn).await,
            Effect::Ignored => {
                debug!(identity = %turn.identity, phase = %applied.phase, "event ignored");
                Ok(())
            },
            Effect::Abort(kind) => {
                if let Some(source) = &applied.source {
                    self.release(source);
                }
                let reply_to = applied.reply_to.unwrap_or_else(|| turn.reply_to.clone());
                self.fail(turn, &reply_to, kind, None).await
            },
        }
    }

    /// Run the job, deliver the result, and close the session. Source and
    /// output are released before the session returns to idle, whatever the
    /// outcome.
    async fn execute(
        &self,
        turn: &Turn,
        operation: Operation,
        source: Option<&Path>,
        reply_to: &ReplyTarget,
    ) -> Result<()> {
        let identity = turn.identity;
        let Some(input) = source else {
            error!(%identity, "executing session has no source");
            self.sessions.finish(identity);
            return self
                .fail(turn, reply_to, FailureKind::InsufficientSessionData, None)
                .await;
        };

        let texts = self.texts(turn.language);
        self.notify(
            &turn.reply_to,
            &texts.get("status", "processing"),
            Some(Keyboard::Remove),
        )
        .await;

        let job = MediaJob::new(input, operation, self.executor.temp());
        info!(%identity, job_id = %job.id, operation = job.operation.name(), "job started");

        let outcome = match self.executor.run(&job).await {
            Ok(artifact) => {
                let delivered = self.deliver(&texts, &job.operation, &artifact.path, reply_to).await;
                self.release(&artifact.path);
                match delivered {
                    Ok(()) => {
                        info!(%identity, job_id = %job.id, "job delivered");
                        Ok(())
                    },
                    Err(e) => {
                        error!(%identity, job_id = %job.id, error = %e, "delivery failed");
                        self.notify(
                            reply_to,
                            &texts.get("error", "delivery_failed"),
                            Some(Keyboard::Remove),
                        )
                        .await;
                        Err(e)
                    },
                }
            },
            Err(e) => {
                error!(%identity, job_id = %job.id, error = %e, "job failed");
                let detail = e.to_string();
                self.fail(turn, reply_to, FailureKind::EncodeFailed, Some(&detail))
                    .await
            },
        };

        self.release(input);
        self.sessions.finish(identity);
        outcome
    }

    async fn deliver(
        &self,
        texts: &Texts<'_>,
        operation: &Operation,
        path: &Path,
        reply_to: &ReplyTarget,
    ) -> Result<()> {
        let kind = if operation.produces_audio() {
            FileKind::Audio
        } else if operation.produces_animation() {
            FileKind::Animation
        } else {
            FileKind::Video
        };
        self.outbound
            .send_file(reply_to, path, kind, &texts.caption(operation))
            .await?;
        self.notify(reply_to, &texts.done(operation), None).await;
        Ok(())
    }

    async fn busy(&self, turn: &Turn) -> Result<()> {
        let text = self.texts(turn.language).get("status", "busy");
        self.say(&turn.reply_to, &text, None).await
    }

    /// The single failure reply for `kind`.
    async fn fail(
        &self,
        turn: &Turn,
        reply_to: &ReplyTarget,
        kind: FailureKind,
        detail: Option<&str>,
    ) -> Result<()> {
        if kind.is_terminal() {
            warn!(identity = %turn.identity, %kind, "session failed");
        } else {
            debug!(identity = %turn.identity, %kind, "request refused");
        }
        let text = self
            .texts(turn.language)
            .failure(kind, detail, self.max_file_size_mb());
        self.say(reply_to, &text, Some(Keyboard::Remove)).await
    }

    async fn say(&self, to: &ReplyTarget, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        self.outbound.reply(to, text, keyboard).await
    }

    /// Progress message; a failed send does not interrupt the flow.
    async fn notify(&self, to: &ReplyTarget, text: &str, keyboard: Option<Keyboard>) {
        if let Err(e) = self.outbound.reply(to, text, keyboard).await {
            warn!(chat_id = to.chat_id, error = %e, "failed to send status message");
        }
    }

    fn release(&self, path: &Path) {
        if self.executor.temp().cleanup(path) {
            debug!(path = %path.display(), "released artifact");
        }
    }
}
