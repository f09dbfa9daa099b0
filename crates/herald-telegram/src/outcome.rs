// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of Telegram send failures.
//!
//! A recipient that blocked the bot, deleted their account, or removed
//! the bot from a chat is *unreachable*: the failure belongs to that
//! recipient alone and must never abort a broadcast batch. Everything
//! else is an ordinary channel error.

use herald_core::{HeraldError, RecipientId};
use teloxide::{ApiError, RequestError};

/// True when the error means this recipient cannot be delivered to.
pub fn is_unreachable(err: &RequestError) -> bool {
    matches!(
        err,
        RequestError::Api(
            ApiError::BotBlocked | ApiError::ChatNotFound | ApiError::UserDeactivated
        )
    )
}

/// Maps a teloxide send failure into the Herald taxonomy.
pub fn map_send_error(recipient: RecipientId, err: RequestError) -> HeraldError {
    if is_unreachable(&err) {
        HeraldError::Unreachable { recipient }
    } else {
        HeraldError::Channel {
            message: format!("failed to deliver to {recipient}: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_bot_is_unreachable() {
        let err = RequestError::Api(ApiError::BotBlocked);
        assert!(is_unreachable(&err));
        let mapped = map_send_error(RecipientId(7), err);
        assert!(mapped.is_unreachable());
    }

    #[test]
    fn missing_chat_is_unreachable() {
        assert!(is_unreachable(&RequestError::Api(ApiError::ChatNotFound)));
    }

    #[test]
    fn deactivated_user_is_unreachable() {
        assert!(is_unreachable(&RequestError::Api(ApiError::UserDeactivated)));
    }

    #[test]
    fn other_api_errors_are_channel_errors() {
        let err = RequestError::Api(ApiError::MessageTextIsEmpty);
        assert!(!is_unreachable(&err));
        let mapped = map_send_error(RecipientId(7), err);
        assert!(matches!(mapped, HeraldError::Channel { .. }));
    }
}
