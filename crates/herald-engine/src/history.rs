// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-user conversation history.
//!
//! The upstream protocol wants strictly alternating user/model turns
//! starting with a user turn, so trimming does two things: evict the
//! oldest turns past the bound, then drop a leading model turn if
//! eviction exposed one.

use std::collections::VecDeque;

use herald_gemini::{Content, InlineData};

/// Who produced a turn, in upstream role terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// One conversation turn.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Attached binary payload (base64), for turns carrying an image.
    pub inline_data: Option<InlineData>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            inline_data: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            inline_data: None,
        }
    }

    /// A user turn carrying an image alongside its caption.
    pub fn user_with_image(text: impl Into<String>, inline: InlineData) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            inline_data: Some(inline),
        }
    }
}

/// Bounded ordered turn history for one user.
///
/// Created on the user's first turn, cleared by the new-conversation
/// command, never persisted.
#[derive(Debug)]
pub struct ConversationWindow {
    turns: VecDeque<Turn>,
    limit: usize,
}

impl ConversationWindow {
    pub fn new(limit: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Appends a turn and re-establishes the window invariants.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.limit {
            self.turns.pop_front();
        }
        // Eviction may expose a model turn at the front; the sequence
        // must open with the initiating role.
        while matches!(self.turns.front(), Some(t) if t.role == Role::Model) {
            self.turns.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the window as upstream request contents.
    pub fn to_contents(&self) -> Vec<Content> {
        self.turns
            .iter()
            .map(|turn| match (&turn.inline_data, turn.role) {
                (Some(inline), Role::User) => {
                    Content::user_with_inline(turn.text.clone(), inline.clone())
                }
                (_, Role::User) => Content::user_text(turn.text.clone()),
                (_, Role::Model) => Content::model_text(turn.text.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushing_past_the_bound_evicts_oldest_first() {
        let mut window = ConversationWindow::new(4);
        // Consecutive user turns happen whenever the upstream call fails
        // and no model reply lands in between.
        for i in 0..5 {
            window.push(Turn::user(format!("u{i}")));
        }
        assert_eq!(window.len(), 4);
        let contents = window.to_contents();
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[0].parts[0].text.as_deref(), Some("u1"));
    }

    #[test]
    fn exactly_n_turns_after_n_plus_one_pushes() {
        let mut window = ConversationWindow::new(3);
        window.push(Turn::user("u0"));
        window.push(Turn::model("m0"));
        window.push(Turn::user("u1"));
        window.push(Turn::model("m1"));
        // Eviction of u0 exposes m0, which is dropped too.
        assert_eq!(window.len(), 2);
        let contents = window.to_contents();
        assert_eq!(contents[0].parts[0].text.as_deref(), Some("u1"));
        assert_eq!(contents[1].parts[0].text.as_deref(), Some("m1"));
    }

    #[test]
    fn window_never_starts_with_a_model_turn() {
        let mut window = ConversationWindow::new(2);
        window.push(Turn::user("u0"));
        window.push(Turn::model("m0"));
        window.push(Turn::user("u1"));
        assert!(matches!(
            window.to_contents().first().map(|c| c.role.as_str()),
            Some("user")
        ));
    }

    #[test]
    fn image_turns_render_caption_and_payload() {
        let mut window = ConversationWindow::new(4);
        window.push(Turn::user_with_image(
            "what is this?",
            InlineData {
                mime_type: "image/jpeg".into(),
                data: "aGVsbG8=".into(),
            },
        ));
        let contents = window.to_contents();
        assert_eq!(contents[0].parts.len(), 2);
        assert_eq!(contents[0].parts[0].text.as_deref(), Some("what is this?"));
        assert!(contents[0].parts[1].inline_data.is_some());
    }

    #[test]
    fn clear_resets_the_window() {
        let mut window = ConversationWindow::new(4);
        window.push(Turn::user("hello"));
        assert!(!window.is_empty());
        window.clear();
        assert!(window.is_empty());
    }
}
