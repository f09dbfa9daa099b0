// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini provider for the Herald bot.
//!
//! Implements the one retry/rotate wrapper all upstream calls go
//! through: [`GeminiClient`] over a [`CredentialPool`], with the
//! request/response types in [`types`].

pub mod client;
pub mod pool;
pub mod types;

pub use client::GeminiClient;
pub use pool::CredentialPool;
pub use types::{Content, GenerateRequest, GenerateResponse, InlineData, Part};
