// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingress for Herald.
//!
//! Moves inbound payloads from the request-serving threads into the
//! single engine thread: [`IngressBridge`] is the thread-safe handoff,
//! [`server`] the axum front door.

pub mod bridge;
pub mod server;

pub use bridge::{EngineState, IngressBridge, SubmitOutcome, UpdateReceiver};
pub use server::{IngressServerState, ServerConfig, router, serve};
