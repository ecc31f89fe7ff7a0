//! Celebration reaction matching
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.0.0: Phrase matching split from the message handler

use log::warn;
use serenity::model::channel::Message;
use serenity::prelude::Context;

pub const CELEBRATION_EMOJI: char = '🥳';

/// Matched case-insensitively against message content. Keep entries
/// lowercase.
const CELEBRATION_PHRASES: &[&str] = &[
    // birthday
    "happy birthday",
    "hbd",
    "🎂",
    "feliz cumpleaños",
    "joyeux anniversaire",
    "生日快乐",
    // anniversary
    "happy anniversary",
    "server anniversary",
    "join anniversary",
    "anniv",
    "congrats on your anniversary",
    "congratulations on your anniversary",
];

/// True when the content contains any celebration phrase.
pub fn is_celebration(content: &str) -> bool {
    let lowered = content.to_lowercase();
    CELEBRATION_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Reacts with 🥳 when a non-bot message celebrates something. A failed
/// reaction is logged and dropped; it never blocks message handling.
pub async fn react_if_celebration(ctx: &Context, message: &Message) {
    if message.author.bot {
        return;
    }
    if !is_celebration(&message.content) {
        return;
    }
    if let Err(err) = message.react(&ctx.http, CELEBRATION_EMOJI).await {
        warn!("failed to add celebration reaction: {err}");
    }
}
