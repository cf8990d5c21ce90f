//! Builds the request for one user turn and turns the provider's answer
//! into an assistant [`Turn`]. The orchestrator never touches the store.

use tracing::debug;

use crate::api::{ChatMessage, ChatRequest};
use crate::core::message::{Role, Turn, Usage};
use crate::core::provider::{CompletionProvider, ProviderError};

/// How many trailing turns of history accompany a prompt.
pub const HISTORY_WINDOW: usize = 10;

/// `[system: personality] ++ history ++ [user: prompt]`
pub fn build_messages(personality: &str, history: &[Turn], prompt: &str) -> Vec<ChatMessage> {
    let history = trailing_window(history);
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new(Role::System.as_str(), personality));
    messages.extend(history.iter().map(Turn::to_api_message));
    messages.push(ChatMessage::new(Role::User.as_str(), prompt));
    messages
}

fn trailing_window(history: &[Turn]) -> &[Turn] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

pub async fn reply(
    provider: &dyn CompletionProvider,
    model: &str,
    prompt: &str,
    history: &[Turn],
    personality: &str,
) -> Result<Turn, ProviderError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages: build_messages(personality, history, prompt),
        stream: false,
    };
    debug!(
        history = request.messages.len() - 2,
        "dispatching reply request"
    );

    let completion = provider.complete(&request).await?;
    Ok(Turn::assistant(
        completion.content,
        completion.usage.unwrap_or_default(),
    ))
}
