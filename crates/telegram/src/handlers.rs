//! Update to [`InboundEvent`] mapping.

use {
    reelsmith_chat::{Command, InboundEvent, InboundKind},
    reelsmith_common::{Identity, ReplyTarget},
    reelsmith_media::FileRef,
    teloxide::types::{CallbackQuery, MediaKind, Message, MessageKind, User},
    tracing::debug,
};

/// Map a message to an event. Messages without a sender, and media other
/// than videos, animations and video documents, yield `None`.
pub fn message_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let kind = match message_kind(msg) {
        Some(kind) => kind,
        None => {
            debug!(chat_id = msg.chat.id.0, "ignoring unsupported telegram message");
            return None;
        },
    };

    Some(InboundEvent {
        identity: identity_of(user)?,
        reply_to: ReplyTarget::new(msg.chat.id.0, Some(msg.id.0)),
        language_hint: user.language_code.clone(),
        display_name: display_name(user),
        kind,
    })
}

/// Map an inline button press. Presses on messages Telegram no longer
/// reports a chat for are dropped.
pub fn callback_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let data = query.data.clone()?;
    let chat_id = query.message.as_ref().map(|m| m.chat().id.0)?;

    Some(InboundEvent {
        identity: identity_of(&query.from)?,
        // Button presses have no message of their own to reply-thread to.
        reply_to: ReplyTarget::new(chat_id, None),
        language_hint: query.from.language_code.clone(),
        display_name: display_name(&query.from),
        kind: InboundKind::Callback {
            id: query.id.clone(),
            data,
        },
    })
}

fn message_kind(msg: &Message) -> Option<InboundKind> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    match &common.media_kind {
        MediaKind::Text(t) => Some(match Command::parse(&t.text) {
            Some(command) => InboundKind::Command(command),
            None => InboundKind::Text(t.text.clone()),
        }),
        MediaKind::Video(v) => Some(InboundKind::File(FileRef {
            id: v.video.file.id.clone(),
            declared_size: declared(v.video.file.size),
            file_name: v.video.file_name.clone(),
        })),
        MediaKind::Animation(a) => Some(InboundKind::File(FileRef {
            id: a.animation.file.id.clone(),
            declared_size: declared(a.animation.file.size),
            file_name: a.animation.file_name.clone(),
        })),
        MediaKind::Document(d) => {
            let is_video = d
                .document
                .mime_type
                .as_ref()
                .is_some_and(|m| m.as_ref().starts_with("video/"));
            is_video.then(|| {
                InboundKind::File(FileRef {
                    id: d.document.file.id.clone(),
                    declared_size: declared(d.document.file.size),
                    file_name: d.document.file_name.clone(),
                })
            })
        },
        _ => None,
    }
}

fn identity_of(user: &User) -> Option<Identity> {
    i64::try_from(user.id.0).ok().map(Identity)
}

fn display_name(user: &User) -> Option<String> {
    let first = &user.first_name;
    let last = user.last_name.as_deref().unwrap_or("");
    let name = format!("{first} {last}").trim().to_string();
    if name.is_empty() {
        user.username.clone()
    } else {
        Some(name)
    }
}

/// Telegram reports 0 when the size is unknown.
fn declared(size: u32) -> Option<u64> {
    (size > 0).then_some(u64::from(size))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn message(body: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 17,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "last_name": "Liddell",
                "username": "alice",
                "language_code": "en"
            }
        });
        for (key, field) in body.as_object().unwrap() {
            value[key] = field.clone();
        }
        serde_json::from_value(value).expect("deserialize message")
    }

    #[test]
    fn text_becomes_text_event() {
        let event = message_event(&message(json!({ "text": "https://youtu.be/abc" }))).unwrap();
        assert_eq!(event.identity, Identity(1001));
        assert_eq!(event.reply_to, ReplyTarget::new(42, Some(17)));
        assert_eq!(event.language_hint.as_deref(), Some("en"));
        assert_eq!(event.display_name.as_deref(), Some("Alice Liddell"));
        assert_eq!(event.kind, InboundKind::Text("https://youtu.be/abc".into()));
    }

    #[test]
    fn commands_are_recognised() {
        let event = message_event(&message(json!({
            "text": "/cancel@reelsmith_bot",
            "entities": [{ "type": "bot_command", "offset": 0, "length": 21 }]
        })))
        .unwrap();
        assert_eq!(event.kind, InboundKind::Command(Command::Cancel));
    }

    #[test]
    fn video_carries_declared_size() {
        let event = message_event(&message(json!({
            "video": {
                "file_id": "video-file-id",
                "file_unique_id": "video-unique-id",
                "width": 640,
                "height": 360,
                "duration": 12,
                "file_name": "clip.mp4",
                "mime_type": "video/mp4",
                "file_size": 2048
            }
        })))
        .unwrap();
        assert_eq!(
            event.kind,
            InboundKind::File(FileRef {
                id: "video-file-id".into(),
                declared_size: Some(2048),
                file_name: Some("clip.mp4".into()),
            })
        );
    }

    #[test]
    fn video_documents_are_sources() {
        let event = message_event(&message(json!({
            "document": {
                "file_id": "doc-file-id",
                "file_unique_id": "doc-unique-id",
                "file_name": "raw.mkv",
                "mime_type": "video/x-matroska",
                "file_size": 4096
            }
        })))
        .unwrap();
        let InboundKind::File(file) = event.kind else {
            panic!("expected a file event");
        };
        assert_eq!(file.id, "doc-file-id");
        assert_eq!(file.file_name.as_deref(), Some("raw.mkv"));
    }

    #[test]
    fn other_documents_are_ignored() {
        let msg = message(json!({
            "document": {
                "file_id": "pdf-file-id",
                "file_unique_id": "pdf-unique-id",
                "file_name": "notes.pdf",
                "mime_type": "application/pdf",
                "file_size": 100
            }
        }));
        assert!(message_event(&msg).is_none());
    }

    #[test]
    fn voice_messages_are_ignored() {
        let msg = message(json!({
            "voice": {
                "file_id": "voice-file-id",
                "file_unique_id": "voice-unique-id",
                "duration": 1,
                "mime_type": "audio/ogg",
                "file_size": 123
            }
        }));
        assert!(message_event(&msg).is_none());
    }

    #[test]
    fn callback_replies_to_chat_without_threading() {
        let query: CallbackQuery = serde_json::from_value(json!({
            "id": "cb-1",
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "language_code": "uz"
            },
            "chat_instance": "ci",
            "data": "q:medium",
            "message": {
                "message_id": 5,
                "date": 1,
                "chat": { "id": 42, "type": "private", "first_name": "Alice" },
                "text": "Choose quality"
            }
        }))
        .expect("deserialize callback query");

        let event = callback_event(&query).unwrap();
        assert_eq!(event.reply_to, ReplyTarget::new(42, None));
        assert_eq!(event.language_hint.as_deref(), Some("uz"));
        assert_eq!(
            event.kind,
            InboundKind::Callback {
                id: "cb-1".into(),
                data: "q:medium".into(),
            }
        );
    }
}
