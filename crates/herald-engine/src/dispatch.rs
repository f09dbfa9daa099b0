// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-update routing on the engine thread.
//!
//! Every update lands here from the handoff queue: contact and activity
//! bookkeeping, ban checks, command routing, the admin broadcast flow,
//! and the two conversation paths (text and photo) that call upstream.

use std::rc::Rc;

use herald_core::{ActivityKind, HeraldError, Recipient, RecipientId, RecipientKind};
use herald_gemini::{GenerateRequest, InlineData};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Update, UpdateKind};
use tracing::{debug, warn};

use crate::broadcast_ctl;
use crate::history::{ConversationWindow, Turn};
use crate::{BroadcastSlot, Ctx};

const WELCOME: &str = "Hi! I'm Herald, your study assistant.\n\n\
    Send me a question and I'll answer it, or send a photo and I'll \
    describe what's in it.\n\n\
    /new starts a fresh conversation.";

const APOLOGY: &str =
    "Sorry, something went wrong on my side. Please try again in a moment.";

const BANNED: &str = "Sorry, you have been banned from using this bot.";

const NEW_CONVERSATION: &str = "Started a new conversation. How can I help?";

/// Commands Herald understands. Broadcast commands are admin-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    NewConversation,
    Broadcast,
    Send,
    Cancel,
}

/// Parses the leading `/command` token, tolerating an `@botname` suffix.
pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?.split('@').next()?;
    match name {
        "start" => Some(Command::Start),
        "new" => Some(Command::NewConversation),
        "broadcast" => Some(Command::Broadcast),
        "send" => Some(Command::Send),
        "cancel" => Some(Command::Cancel),
        _ => None,
    }
}

/// Routes one dequeued update.
pub(crate) async fn dispatch(ctx: Rc<Ctx>, update: Update) -> Result<(), HeraldError> {
    match update.kind {
        UpdateKind::Message(msg) => handle_message(ctx, msg).await,
        _ => {
            debug!(update_id = update.id.0, "ignoring unsupported update kind");
            Ok(())
        }
    }
}

async fn handle_message(ctx: Rc<Ctx>, msg: Message) -> Result<(), HeraldError> {
    let chat = msg.chat.id;
    let recipient_id = RecipientId(chat.0);
    let is_private = matches!(msg.chat.kind, ChatKind::Private(_));

    let kind = if is_private {
        RecipientKind::User
    } else {
        RecipientKind::Group
    };
    ctx.store
        .record_contact(Recipient::new(recipient_id, kind))
        .await?;

    if !is_private {
        // Groups are broadcast recipients; their traffic is bookkeeping only.
        if msg.text().is_some() {
            ctx.store
                .record_activity(recipient_id, ActivityKind::Text)
                .await?;
        }
        return Ok(());
    }

    if ctx.store.is_banned(recipient_id).await? {
        ctx.sender.send_text(chat, BANNED).await?;
        return Ok(());
    }

    let is_admin = msg
        .from
        .as_ref()
        .map(|user| ctx.config.telegram.admin_ids.contains(&(user.id.0 as i64)))
        .unwrap_or(false);

    if let Some(command) = msg.text().and_then(parse_command) {
        ctx.store
            .record_activity(recipient_id, ActivityKind::Command)
            .await?;
        return handle_command(ctx, chat, recipient_id, command, &msg, is_admin).await;
    }

    // An admin who opened a broadcast draft: the next message is content.
    if is_admin && matches!(&*ctx.slot.borrow(), BroadcastSlot::AwaitingContent(_)) {
        return broadcast_ctl::capture_draft(ctx, chat, &msg).await;
    }

    if msg.photo().is_some() {
        return handle_photo(ctx, chat, recipient_id, &msg).await;
    }

    if let Some(text) = msg.text() {
        let text = text.to_owned();
        return handle_chat(ctx, chat, recipient_id, text).await;
    }

    debug!(chat_id = chat.0, "ignoring unsupported message type");
    Ok(())
}

async fn handle_command(
    ctx: Rc<Ctx>,
    chat: ChatId,
    recipient_id: RecipientId,
    command: Command,
    msg: &Message,
    is_admin: bool,
) -> Result<(), HeraldError> {
    match command {
        Command::Start => {
            ctx.windows.borrow_mut().remove(&recipient_id);
            ctx.sender.send_text(chat, WELCOME).await?;
        }
        Command::NewConversation => {
            if let Some(window) = ctx.windows.borrow_mut().get_mut(&recipient_id) {
                window.clear();
            }
            ctx.sender.send_text(chat, NEW_CONVERSATION).await?;
        }
        Command::Broadcast | Command::Send | Command::Cancel if !is_admin => {
            debug!(chat_id = chat.0, "ignoring operator command from non-admin");
        }
        Command::Broadcast => {
            broadcast_ctl::begin_draft(ctx, chat, msg.text().unwrap_or_default()).await?
        }
        Command::Send => broadcast_ctl::confirm_and_run(ctx, chat).await?,
        Command::Cancel => broadcast_ctl::cancel(ctx, chat).await?,
    }
    Ok(())
}

/// The text conversation path.
async fn handle_chat(
    ctx: Rc<Ctx>,
    chat: ChatId,
    recipient_id: RecipientId,
    text: String,
) -> Result<(), HeraldError> {
    ctx.store
        .record_activity(recipient_id, ActivityKind::Text)
        .await?;
    converse(ctx, chat, recipient_id, Turn::user(text)).await
}

/// The photo path: download the largest size and attach it inline to
/// the user turn, so follow-up questions keep the image in context.
async fn handle_photo(
    ctx: Rc<Ctx>,
    chat: ChatId,
    recipient_id: RecipientId,
    msg: &Message,
) -> Result<(), HeraldError> {
    ctx.store
        .record_activity(recipient_id, ActivityKind::Photo)
        .await?;

    // Telegram provides multiple sizes; the last one is the largest.
    let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) else {
        debug!(chat_id = chat.0, "photo message without photo sizes");
        return Ok(());
    };

    let bytes = match download_photo(&ctx, largest).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(user_id = recipient_id.0, error = %e, "photo download failed");
            ctx.sender.send_text(chat, APOLOGY).await?;
            return Ok(());
        }
    };

    use base64::Engine as _;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

    let caption = msg
        .caption()
        .unwrap_or("Describe this image and explain what it shows.");
    let turn = Turn::user_with_image(
        caption,
        InlineData {
            mime_type: "image/jpeg".into(),
            data: encoded,
        },
    );
    converse(ctx, chat, recipient_id, turn).await
}

/// Pushes a user turn into the window, calls upstream, and replies.
///
/// The user turn stays in the window even when the upstream call fails;
/// only a successful reply appends a model turn. Raw upstream errors are
/// never shown to the user.
async fn converse(
    ctx: Rc<Ctx>,
    chat: ChatId,
    recipient_id: RecipientId,
    turn: Turn,
) -> Result<(), HeraldError> {
    if let Err(e) = ctx.sender.send_typing(chat).await {
        debug!(chat_id = chat.0, error = %e, "failed to send typing indicator");
    }

    let contents = {
        let mut windows = ctx.windows.borrow_mut();
        let window = windows
            .entry(recipient_id)
            .or_insert_with(|| ConversationWindow::new(ctx.config.engine.history_limit));
        window.push(turn);
        window.to_contents()
    };

    let request = GenerateRequest::new(contents, ctx.config.gemini.max_output_tokens);
    match ctx.gemini.generate_text(&request).await {
        Ok(reply) => {
            ctx.windows
                .borrow_mut()
                .entry(recipient_id)
                .and_modify(|window| window.push(Turn::model(reply.clone())));
            ctx.sender.send_text(chat, &reply).await?;
        }
        Err(e) => {
            warn!(user_id = recipient_id.0, error = %e, "upstream call failed");
            ctx.sender.send_text(chat, APOLOGY).await?;
        }
    }
    Ok(())
}

async fn download_photo(
    ctx: &Ctx,
    photo: &teloxide::types::PhotoSize,
) -> Result<Vec<u8>, HeraldError> {
    let bot = ctx.sender.bot();
    let file = bot
        .get_file(photo.file.id.clone())
        .await
        .map_err(|e| HeraldError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| HeraldError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(size = buf.len(), "downloaded photo from Telegram");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_and_without_bot_suffix() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/new"), Some(Command::NewConversation));
        assert_eq!(parse_command("/broadcast pin"), Some(Command::Broadcast));
        assert_eq!(parse_command("/send@herald_bot"), Some(Command::Send));
        assert_eq!(parse_command("/cancel"), Some(Command::Cancel));
    }

    #[test]
    fn non_commands_do_not_parse() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("start"), None);
    }
}
