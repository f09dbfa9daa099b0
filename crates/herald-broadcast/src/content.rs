// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast draft content and trailing-line button extraction.

use herald_core::MediaKind;
use url::Url;

/// A fully staged broadcast payload: body text, optional media, and the
/// tappable link buttons extracted from the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastContent {
    /// Message body (or media caption) with button lines removed.
    pub body: String,
    /// Media attachment; its kind is fixed at draft time.
    pub media: Option<MediaAttachment>,
    /// One tappable link per extracted line, in original line order.
    pub buttons: Vec<LinkButton>,
}

impl BroadcastContent {
    /// Stages raw draft text (message text or media caption) into
    /// deliverable content, extracting any trailing button block.
    pub fn from_draft(text: &str, media: Option<MediaAttachment>) -> Self {
        let (body, buttons) = extract_buttons(text);
        Self {
            body,
            media,
            buttons,
        }
    }
}

/// A media payload referenced by its platform file id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub file_id: String,
}

/// One tappable link button. The URL has been validated at extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// Splits a draft into body text and trailing `label | url` buttons.
///
/// Scans lines bottom-up: every trailing line matching the pattern
/// becomes one button; the first non-matching line stops the scan and
/// stays in the body unmodified. Button order follows line order.
pub fn extract_buttons(text: &str) -> (String, Vec<LinkButton>) {
    let lines: Vec<&str> = text.lines().collect();

    let mut split = lines.len();
    while split > 0 && parse_button_line(lines[split - 1]).is_some() {
        split -= 1;
    }

    let buttons = lines[split..]
        .iter()
        .filter_map(|line| parse_button_line(line))
        .collect();

    let body = lines[..split].join("\n").trim_end().to_string();
    (body, buttons)
}

/// Parses one `label | url` line. The URL half must parse as an
/// absolute http(s) URL; anything else means the line is body text.
fn parse_button_line(line: &str) -> Option<LinkButton> {
    let (label, url) = line.split_once('|')?;
    let label = label.trim();
    let url = url.trim();
    if label.is_empty() {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    Some(LinkButton {
        label: label.to_string(),
        url: url.to_string(),
    })
}
