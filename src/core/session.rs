use std::error::Error;
use std::fmt;
use tracing::{info, warn};

use crate::core::conversation::ConversationStore;
use crate::core::message::Turn;
use crate::core::orchestrator::{reply, HISTORY_WINDOW};
use crate::core::personality::Personality;
use crate::core::pricing::{cost, CostMetrics, DisplayCurrency, ModelPricing};
use crate::core::provider::ProviderError;
use crate::core::provider_slot::{ConnectOutcome, Credential, ProviderSlot, SlotError};
use crate::utils::logging::LoggingState;

pub struct SessionInit {
    pub model: String,
    pub personality: Personality,
    pub pricing: ModelPricing,
    pub currency: DisplayCurrency,
    pub logging: LoggingState,
}

#[derive(Debug)]
pub enum SubmitError {
    EmptyPrompt,
    /// No credential has produced a usable provider yet.
    NoProvider,
    Provider(ProviderError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::EmptyPrompt => write!(f, "Nothing to send"),
            SubmitError::NoProvider => write!(
                f,
                "No API key is active. Use /key to enter one before chatting."
            ),
            SubmitError::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SubmitError::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProviderError> for SubmitError {
    fn from(err: ProviderError) -> Self {
        SubmitError::Provider(err)
    }
}

/// Everything one interactive session owns.
pub struct Session {
    conversation: ConversationStore,
    personality: Personality,
    model: String,
    pricing: ModelPricing,
    currency: DisplayCurrency,
    provider_slot: ProviderSlot,
    pub logging: LoggingState,
}

impl Session {
    pub fn new(init: SessionInit, provider_slot: ProviderSlot) -> Self {
        Self {
            conversation: ConversationStore::new(),
            personality: init.personality,
            model: init.model,
            pricing: init.pricing,
            currency: init.currency,
            provider_slot,
            logging: init.logging,
        }
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn set_personality(&mut self, personality: Personality) {
        self.personality = personality;
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn currency(&self) -> &DisplayCurrency {
        &self.currency
    }

    pub fn connect(&mut self, credential: Credential) -> Result<ConnectOutcome, SlotError> {
        self.provider_slot.connect(credential)
    }

    pub fn is_connected(&self) -> bool {
        self.provider_slot.is_ready()
    }

    pub fn credential_hint(&self) -> Option<String> {
        self.provider_slot.credential_hint()
    }

    /// Sends one prompt and records the exchange.
    ///
    /// The user turn and the reply are appended together, and only when the
    /// provider succeeds; on any error the conversation is left as it was.
    pub async fn submit(&mut self, prompt: &str) -> Result<Turn, SubmitError> {
        if prompt.trim().is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }
        let provider = self
            .provider_slot
            .provider()
            .ok_or(SubmitError::NoProvider)?;

        let history = self.conversation.recent(HISTORY_WINDOW);
        let assistant = reply(
            provider.as_ref(),
            &self.model,
            prompt,
            history,
            self.personality.as_str(),
        )
        .await?;

        self.record(Turn::user(prompt));
        self.record(assistant.clone());
        info!(turns = self.conversation.len(), "conversation updated");
        Ok(assistant)
    }

    fn record(&mut self, turn: Turn) {
        if let Err(err) = self.logging.log_turn(&turn) {
            warn!(error = %err, "failed to write transcript");
        }
        self.conversation.push(turn);
    }

    /// Total USD cost, recomputed from the full history.
    pub fn total_cost(&self) -> f64 {
        cost(&self.conversation, &self.pricing)
    }

    pub fn cost_metrics(&self) -> CostMetrics {
        CostMetrics::new(self.total_cost(), &self.currency)
    }
}
