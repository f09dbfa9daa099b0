// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram outbound delivery for Herald.
//!
//! Wraps a teloxide [`Bot`] behind [`TelegramSender`]: plain replies,
//! broadcast content delivery (text plus the closed media-kind set, with
//! inline link buttons, silent mode, and best-effort pinning), and the
//! unreachable-vs-other classification of send failures.

pub mod outcome;

use herald_broadcast::{BroadcastContent, DeliveredMessage, LinkButton, MediaAttachment};
use herald_core::{BroadcastOptions, HeraldError, MediaKind, RecipientId};
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
    ParseMode,
};
use tracing::{debug, warn};

pub use outcome::{is_unreachable, map_send_error};

/// Outbound Telegram client.
///
/// `Bot` is a cheap handle over a shared connection pool, so the sender
/// is `Clone` and freely shared across engine tasks.
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// The underlying bot handle.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Sends a text reply with Markdown formatting, falling back to
    /// plain text when the body does not survive entity parsing.
    pub async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, HeraldError> {
        let result = self
            .bot
            .send_message(chat, text)
            .parse_mode(ParseMode::Markdown)
            .await;

        match result {
            Ok(message) => Ok(message.id),
            Err(e) if is_entity_parse_error(&e) => {
                warn!(chat_id = chat.0, "Markdown failed, sending as plain text");
                self.bot
                    .send_message(chat, text)
                    .await
                    .map(|m| m.id)
                    .map_err(|e| map_send_error(RecipientId(chat.0), e))
            }
            Err(e) => Err(map_send_error(RecipientId(chat.0), e)),
        }
    }

    /// Edits a previously sent message; "message is not modified" is a
    /// benign outcome and swallowed.
    pub async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), HeraldError> {
        match self.bot.edit_message_text(chat, message, text).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(map_send_error(RecipientId(chat.0), e)),
        }
    }

    /// Shows the typing indicator while a reply is being generated.
    pub async fn send_typing(&self, chat: ChatId) -> Result<(), HeraldError> {
        self.bot
            .send_chat_action(chat, ChatAction::Typing)
            .await
            .map_err(|e| map_send_error(RecipientId(chat.0), e))?;
        Ok(())
    }

    /// Delivers staged broadcast content to one chat.
    ///
    /// The media kind was fixed at draft time; this dispatches on it
    /// once. Button and silent options apply to every kind; stickers
    /// carry no caption.
    pub async fn deliver_to_chat(
        &self,
        chat: ChatId,
        content: &BroadcastContent,
        options: BroadcastOptions,
    ) -> Result<DeliveredMessage, HeraldError> {
        let recipient = RecipientId(chat.0);
        let keyboard = keyboard_for(&content.buttons)?;
        let caption = (!content.body.is_empty()).then_some(content.body.as_str());

        let message_id = match &content.media {
            None => {
                let mut request = self
                    .bot
                    .send_message(chat, &content.body)
                    .parse_mode(ParseMode::Markdown)
                    .disable_notification(options.silent);
                if let Some(kb) = keyboard.clone() {
                    request = request.reply_markup(kb);
                }
                match request.await {
                    Ok(m) => m.id,
                    Err(e) if is_entity_parse_error(&e) => {
                        let mut retry = self
                            .bot
                            .send_message(chat, &content.body)
                            .disable_notification(options.silent);
                        if let Some(kb) = keyboard {
                            retry = retry.reply_markup(kb);
                        }
                        retry.await.map(|m| m.id).map_err(|e| map_send_error(recipient, e))?
                    }
                    Err(e) => return Err(map_send_error(recipient, e)),
                }
            }
            Some(attachment) => {
                self.send_media(chat, attachment, caption, keyboard, options.silent)
                    .await
                    .map_err(|e| map_send_error(recipient, e))?
            }
        };

        debug!(chat_id = chat.0, message_id = message_id.0, "delivered");
        Ok(DeliveredMessage {
            message_id: message_id.0,
        })
    }

    /// Pins a delivered message. Callers treat failures as best-effort.
    pub async fn pin_message(
        &self,
        chat: ChatId,
        message_id: i32,
        silent: bool,
    ) -> Result<(), HeraldError> {
        self.bot
            .pin_chat_message(chat, MessageId(message_id))
            .disable_notification(silent)
            .await
            .map_err(|e| map_send_error(RecipientId(chat.0), e))?;
        Ok(())
    }

    async fn send_media(
        &self,
        chat: ChatId,
        attachment: &MediaAttachment,
        caption: Option<&str>,
        keyboard: Option<InlineKeyboardMarkup>,
        silent: bool,
    ) -> Result<MessageId, teloxide::RequestError> {
        let input = InputFile::file_id(FileId(attachment.file_id.clone()));

        let message = match attachment.kind {
            MediaKind::Photo => {
                let mut request = self
                    .bot
                    .send_photo(chat, input)
                    .disable_notification(silent);
                if let Some(text) = caption {
                    request = request.caption(text).parse_mode(ParseMode::Markdown);
                }
                if let Some(kb) = keyboard {
                    request = request.reply_markup(kb);
                }
                request.await?
            }
            MediaKind::Video => {
                let mut request = self
                    .bot
                    .send_video(chat, input)
                    .disable_notification(silent);
                if let Some(text) = caption {
                    request = request.caption(text).parse_mode(ParseMode::Markdown);
                }
                if let Some(kb) = keyboard {
                    request = request.reply_markup(kb);
                }
                request.await?
            }
            MediaKind::Document => {
                let mut request = self
                    .bot
                    .send_document(chat, input)
                    .disable_notification(silent);
                if let Some(text) = caption {
                    request = request.caption(text).parse_mode(ParseMode::Markdown);
                }
                if let Some(kb) = keyboard {
                    request = request.reply_markup(kb);
                }
                request.await?
            }
            MediaKind::Voice => {
                let mut request = self
                    .bot
                    .send_voice(chat, input)
                    .disable_notification(silent);
                if let Some(text) = caption {
                    request = request.caption(text).parse_mode(ParseMode::Markdown);
                }
                if let Some(kb) = keyboard {
                    request = request.reply_markup(kb);
                }
                request.await?
            }
            MediaKind::Audio => {
                let mut request = self
                    .bot
                    .send_audio(chat, input)
                    .disable_notification(silent);
                if let Some(text) = caption {
                    request = request.caption(text).parse_mode(ParseMode::Markdown);
                }
                if let Some(kb) = keyboard {
                    request = request.reply_markup(kb);
                }
                request.await?
            }
            // Stickers cannot carry a caption.
            MediaKind::Sticker => {
                let mut request = self
                    .bot
                    .send_sticker(chat, input)
                    .disable_notification(silent);
                if let Some(kb) = keyboard {
                    request = request.reply_markup(kb);
                }
                request.await?
            }
        };

        Ok(message.id)
    }
}

#[async_trait::async_trait]
impl herald_broadcast::DeliverySink for TelegramSender {
    async fn deliver(
        &self,
        recipient: &herald_core::Recipient,
        content: &BroadcastContent,
        options: BroadcastOptions,
    ) -> Result<DeliveredMessage, HeraldError> {
        self.deliver_to_chat(ChatId(recipient.id.0), content, options)
            .await
    }

    async fn pin(
        &self,
        recipient: &herald_core::Recipient,
        message: DeliveredMessage,
        silent: bool,
    ) -> Result<(), HeraldError> {
        self.pin_message(ChatId(recipient.id.0), message.message_id, silent)
            .await
    }
}

/// Builds the inline keyboard for extracted link buttons: one button
/// per row, preserving extraction order.
pub fn keyboard_for(buttons: &[LinkButton]) -> Result<Option<InlineKeyboardMarkup>, HeraldError> {
    if buttons.is_empty() {
        return Ok(None);
    }

    let mut rows = Vec::with_capacity(buttons.len());
    for button in buttons {
        let parsed = url::Url::parse(&button.url).map_err(|e| HeraldError::Channel {
            message: format!("button url `{}` is invalid: {e}", button.url),
            source: None,
        })?;
        rows.push(vec![InlineKeyboardButton::url(button.label.clone(), parsed)]);
    }

    Ok(Some(InlineKeyboardMarkup::new(rows)))
}

fn is_entity_parse_error(err: &teloxide::RequestError) -> bool {
    err.to_string().contains("can't parse entities")
}
