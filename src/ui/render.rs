//! Plain-text rendering of turns, costs and errors.

use std::fmt::Display;

use crate::core::conversation::ConversationStore;
use crate::core::message::{Role, Turn, Usage};
use crate::core::pricing::CostMetrics;
use crate::utils::logging::USER_PREFIX;

pub fn format_turn(turn: &Turn) -> String {
    match turn.role {
        Role::User => format!("{USER_PREFIX}: {}", turn.content),
        Role::Assistant => turn.content.clone(),
        Role::System => format!("[system] {}", turn.content),
    }
}

pub fn format_usage(usage: &Usage) -> String {
    format!(
        "tokens: {} prompt + {} completion = {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}

/// Both cost figures on one line, four decimal places each.
pub fn format_cost_metrics(metrics: &CostMetrics) -> String {
    format!(
        "Conversation cost (USD): ${:.4} | Conversation cost ({}): {:.4}",
        metrics.usd, metrics.currency_code, metrics.converted
    )
}

/// Token totals across every reply in the conversation.
pub fn format_token_totals(conversation: &ConversationStore) -> String {
    let total = conversation
        .iter()
        .filter_map(|turn| turn.usage)
        .fold(Usage::default(), |acc, usage| Usage {
            prompt_tokens: acc.prompt_tokens.saturating_add(usage.prompt_tokens),
            completion_tokens: acc.completion_tokens.saturating_add(usage.completion_tokens),
            total_tokens: acc.total_tokens.saturating_add(usage.total_tokens),
        });
    format_usage(&total)
}

pub fn format_error(message: impl Display) -> String {
    format!("❌ Error: {message}")
}
