// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator-side broadcast flow.
//!
//! `/broadcast [pin] [silent]` opens a draft; the operator's next
//! message becomes the content and is previewed back to them only;
//! `/send` confirms (snapshotting the recipient set) and runs the
//! fan-out; `/cancel` discards a draft or cooperatively stops a running
//! job. One job at a time: drafting while a job runs is rejected.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use herald_broadcast::{
    BroadcastJob, DeliveredMessage, DeliverySink, JobStatus, MediaAttachment, ProgressObserver,
    run_job,
};
use herald_core::{
    BroadcastOptions, HeraldError, MediaKind, Progress, Reachability, Recipient, RecipientId,
    RecordStore,
};
use herald_telegram::TelegramSender;
use teloxide::types::{ChatId, Message, MessageId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{BroadcastSlot, Ctx};

const DRAFT_PROMPT: &str = "Broadcast drafting started. Send the message to deliver \
    (text, photo, video, document, voice, audio, or sticker).\n\n\
    Trailing lines shaped like `Label | https://example.com` become link buttons.\n\n\
    /send delivers it, /cancel discards it.";

const CONFIRM_PROMPT: &str =
    "That's the preview. /send delivers it to every recipient, /cancel discards it.";

/// Reads `pin` and `silent` flags off the `/broadcast` command line.
pub(crate) fn parse_broadcast_options(command_text: &str) -> BroadcastOptions {
    let mut options = BroadcastOptions::default();
    for token in command_text.split_whitespace().skip(1) {
        match token {
            "pin" => options.pin = true,
            "silent" => options.silent = true,
            other => debug!(flag = other, "ignoring unknown broadcast flag"),
        }
    }
    options
}

/// `/broadcast`: open a draft, unless a job is already running.
pub(crate) async fn begin_draft(
    ctx: Rc<Ctx>,
    chat: ChatId,
    command_text: &str,
) -> Result<(), HeraldError> {
    let running = {
        let mut slot = ctx.slot.borrow_mut();
        if matches!(&*slot, BroadcastSlot::Running { .. }) {
            true
        } else {
            *slot = BroadcastSlot::AwaitingContent(parse_broadcast_options(command_text));
            false
        }
    };

    if running {
        ctx.sender
            .send_text(
                chat,
                "A broadcast is already running. /cancel it before drafting a new one.",
            )
            .await?;
    } else {
        ctx.sender.send_text(chat, DRAFT_PROMPT).await?;
    }
    Ok(())
}

/// The operator's first message after `/broadcast`: stage it, preview
/// it back to the operator, and wait for confirmation.
pub(crate) async fn capture_draft(
    ctx: Rc<Ctx>,
    chat: ChatId,
    msg: &Message,
) -> Result<(), HeraldError> {
    let options = match &*ctx.slot.borrow() {
        BroadcastSlot::AwaitingContent(options) => *options,
        _ => return Ok(()),
    };

    let (text, media) = draft_source(msg);
    if text.is_empty() && media.is_none() {
        ctx.sender
            .send_text(chat, "I can't broadcast that message type. Try again or /cancel.")
            .await?;
        return Ok(());
    }

    let mut job = BroadcastJob::stage(&text, media, options);

    // Preview goes to the operator only; counters and snapshot untouched.
    let preview_options = BroadcastOptions {
        pin: false,
        silent: true,
    };
    if let Err(e) = ctx
        .sender
        .deliver_to_chat(chat, job.content(), preview_options)
        .await
    {
        warn!(error = %e, "broadcast preview failed");
        *ctx.slot.borrow_mut() = BroadcastSlot::Idle;
        ctx.sender
            .send_text(chat, "The preview failed to render; the draft was discarded.")
            .await?;
        return Ok(());
    }

    job.mark_awaiting()?;
    *ctx.slot.borrow_mut() = BroadcastSlot::Pending(job);
    ctx.sender.send_text(chat, CONFIRM_PROMPT).await?;
    Ok(())
}

/// `/send`: snapshot the recipient set, run the fan-out to completion.
pub(crate) async fn confirm_and_run(ctx: Rc<Ctx>, chat: ChatId) -> Result<(), HeraldError> {
    let pending = {
        let mut slot = ctx.slot.borrow_mut();
        match std::mem::replace(&mut *slot, BroadcastSlot::Idle) {
            BroadcastSlot::Pending(job) => Some(job),
            other => {
                *slot = other;
                None
            }
        }
    };

    let Some(mut job) = pending else {
        ctx.sender
            .send_text(chat, "No drafted broadcast to send. /broadcast starts one.")
            .await?;
        return Ok(());
    };

    let snapshot = ctx.store.recipients().await?;
    job.confirm(snapshot)?;
    *ctx.slot.borrow_mut() = BroadcastSlot::Running {
        token: job.cancel_token(),
    };
    info!(
        job_id = %job.id(),
        recipients = job.snapshot().len(),
        "broadcast confirmed"
    );

    let sink = StoreSink {
        sender: ctx.sender.clone(),
        store: ctx.store.clone(),
    };
    let observer = OperatorObserver::new(ctx.sender.clone(), chat);
    observer.announce(job.progress()).await;

    let pacing = Duration::from_millis(ctx.config.broadcast.pace_ms);
    let result = run_job(
        &mut job,
        &sink,
        &observer,
        pacing,
        ctx.config.broadcast.progress_every,
    )
    .await;

    *ctx.slot.borrow_mut() = BroadcastSlot::Idle;

    match result {
        Ok(progress) => {
            info!(job_id = %job.id(), %progress, status = ?job.status(), "broadcast finished");
            if job.status() == JobStatus::Cancelled {
                ctx.sender
                    .send_text(chat, &format!("Broadcast cancelled: {progress}"))
                    .await?;
            }
        }
        Err(e) => {
            warn!(job_id = %job.id(), error = %e, "broadcast run failed");
            ctx.sender
                .send_text(chat, "The broadcast could not be run.")
                .await?;
        }
    }
    Ok(())
}

/// `/cancel`: discard a draft, or cooperatively stop a running job.
pub(crate) async fn cancel(ctx: Rc<Ctx>, chat: ChatId) -> Result<(), HeraldError> {
    enum Action {
        Discarded,
        Stopping,
        Nothing,
    }

    let action = {
        let mut slot = ctx.slot.borrow_mut();
        match &*slot {
            BroadcastSlot::AwaitingContent(_) | BroadcastSlot::Pending(_) => {
                *slot = BroadcastSlot::Idle;
                Action::Discarded
            }
            BroadcastSlot::Running { token } => {
                token.cancel();
                Action::Stopping
            }
            BroadcastSlot::Idle => Action::Nothing,
        }
    };

    let reply = match action {
        Action::Discarded => "Broadcast draft discarded.",
        Action::Stopping => "Cancelling the broadcast after the current recipient.",
        Action::Nothing => "Nothing to cancel.",
    };
    ctx.sender.send_text(chat, reply).await?;
    Ok(())
}

/// Picks the draft body and media out of the operator's message.
///
/// The media kind is chosen once here, by whichever field is populated;
/// the caption (or text) becomes the body.
pub(crate) fn draft_source(msg: &Message) -> (String, Option<MediaAttachment>) {
    let text = msg
        .caption()
        .or_else(|| msg.text())
        .unwrap_or_default()
        .to_owned();

    let media = if let Some(sizes) = msg.photo() {
        sizes.last().map(|photo| MediaAttachment {
            kind: MediaKind::Photo,
            file_id: photo.file.id.0.clone(),
        })
    } else if let Some(video) = msg.video() {
        Some(MediaAttachment {
            kind: MediaKind::Video,
            file_id: video.file.id.0.clone(),
        })
    } else if let Some(document) = msg.document() {
        Some(MediaAttachment {
            kind: MediaKind::Document,
            file_id: document.file.id.0.clone(),
        })
    } else if let Some(voice) = msg.voice() {
        Some(MediaAttachment {
            kind: MediaKind::Voice,
            file_id: voice.file.id.0.clone(),
        })
    } else if let Some(audio) = msg.audio() {
        Some(MediaAttachment {
            kind: MediaKind::Audio,
            file_id: audio.file.id.0.clone(),
        })
    } else {
        msg.sticker().map(|sticker| MediaAttachment {
            kind: MediaKind::Sticker,
            file_id: sticker.file.id.0.clone(),
        })
    };

    (text, media)
}

/// Delivery sink that records reachability outcomes against the store.
///
/// Store failures stay out of the delivery result; a broken bookkeeping
/// write must not count as a send failure.
pub(crate) struct StoreSink {
    pub(crate) sender: TelegramSender,
    pub(crate) store: Arc<dyn RecordStore>,
}

impl StoreSink {
    async fn note(&self, id: RecipientId, state: Reachability) {
        if let Err(e) = self.store.set_reachability(id, state).await {
            debug!(recipient = %id, error = %e, "failed to record reachability");
        }
    }
}

#[async_trait]
impl DeliverySink for StoreSink {
    async fn deliver(
        &self,
        recipient: &Recipient,
        content: &herald_broadcast::BroadcastContent,
        options: BroadcastOptions,
    ) -> Result<DeliveredMessage, HeraldError> {
        match self
            .sender
            .deliver_to_chat(ChatId(recipient.id.0), content, options)
            .await
        {
            Ok(delivered) => {
                self.note(recipient.id, Reachability::Ok).await;
                Ok(delivered)
            }
            Err(e) if e.is_unreachable() => {
                self.note(recipient.id, Reachability::Blocked).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn pin(
        &self,
        recipient: &Recipient,
        message: DeliveredMessage,
        silent: bool,
    ) -> Result<(), HeraldError> {
        self.sender
            .pin_message(ChatId(recipient.id.0), message.message_id, silent)
            .await
    }
}

/// Reports progress to the operator by editing one status message in
/// place, the way a human would watch a counter tick up.
pub(crate) struct OperatorObserver {
    sender: TelegramSender,
    chat: ChatId,
    progress_message: Mutex<Option<MessageId>>,
}

impl OperatorObserver {
    pub(crate) fn new(sender: TelegramSender, chat: ChatId) -> Self {
        Self {
            sender,
            chat,
            progress_message: Mutex::new(None),
        }
    }

    /// Posts the initial status line before the first recipient.
    pub(crate) async fn announce(&self, progress: Progress) {
        self.report(format!("Broadcasting... {progress}")).await;
    }

    async fn report(&self, line: String) {
        let mut slot = self.progress_message.lock().await;
        match *slot {
            Some(id) => {
                if let Err(e) = self.sender.edit_text(self.chat, id, &line).await {
                    debug!(error = %e, "failed to edit progress message");
                }
            }
            None => match self.sender.send_text(self.chat, &line).await {
                Ok(id) => *slot = Some(id),
                Err(e) => debug!(error = %e, "failed to send progress message"),
            },
        }
    }
}

#[async_trait]
impl ProgressObserver for OperatorObserver {
    async fn on_progress(&self, progress: Progress) {
        self.report(format!("Broadcasting... {progress}")).await;
    }

    async fn on_complete(&self, progress: Progress) {
        self.report(format!("Broadcast finished: {progress}")).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_from_json(json: serde_json::Value) -> Message {
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn base_chat() -> serde_json::Value {
        serde_json::json!({"id": 42i64, "type": "private", "first_name": "Op"})
    }

    #[test]
    fn broadcast_flags_parse_from_the_command_line() {
        assert_eq!(parse_broadcast_options("/broadcast"), BroadcastOptions::default());
        let options = parse_broadcast_options("/broadcast pin silent");
        assert!(options.pin);
        assert!(options.silent);
        let options = parse_broadcast_options("/broadcast silent");
        assert!(!options.pin);
        assert!(options.silent);
    }

    #[test]
    fn text_draft_has_no_media() {
        let msg = message_from_json(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": base_chat(),
            "text": "Hello\nJoin | https://x.test",
        }));
        let (text, media) = draft_source(&msg);
        assert_eq!(text, "Hello\nJoin | https://x.test");
        assert!(media.is_none());
    }

    #[test]
    fn photo_draft_uses_largest_size_and_caption() {
        let msg = message_from_json(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": base_chat(),
            "photo": [
                {"file_id": "small", "file_unique_id": "u1", "width": 90, "height": 90},
                {"file_id": "large", "file_unique_id": "u2", "width": 800, "height": 800},
            ],
            "caption": "look at this",
        }));
        let (text, media) = draft_source(&msg);
        assert_eq!(text, "look at this");
        let media = media.unwrap();
        assert_eq!(media.kind, MediaKind::Photo);
        assert_eq!(media.file_id, "large");
    }

    #[test]
    fn document_draft_maps_to_document_kind() {
        let msg = message_from_json(serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": base_chat(),
            "document": {
                "file_id": "doc1",
                "file_unique_id": "u3",
                "file_name": "notes.pdf",
                "mime_type": "application/pdf",
            },
        }));
        let (text, media) = draft_source(&msg);
        assert!(text.is_empty());
        let media = media.unwrap();
        assert_eq!(media.kind, MediaKind::Document);
        assert_eq!(media.file_id, "doc1");
    }
}
