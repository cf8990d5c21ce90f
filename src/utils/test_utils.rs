use crate::api::ChatRequest;
use crate::core::message::Usage;
use crate::core::personality::Personality;
use crate::core::pricing::{DisplayCurrency, ModelPricing};
use crate::core::provider::{Completion, CompletionProvider, ProviderError};
use crate::core::provider_slot::{Credential, CredentialError, ProviderFactory, ProviderSlot};
use crate::core::session::{Session, SessionInit};
use crate::utils::logging::LoggingState;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub enum StubReply {
    Text(Completion),
    Failure { status: u16, message: String },
}

impl StubReply {
    pub fn text(content: &str, usage: Usage) -> Self {
        StubReply::Text(Completion {
            content: content.to_string(),
            usage: Some(usage),
        })
    }

    pub fn failure(status: u16, message: &str) -> Self {
        StubReply::Failure {
            status,
            message: message.to_string(),
        }
    }

    fn to_result(&self) -> Result<Completion, ProviderError> {
        match self {
            StubReply::Text(completion) => Ok(completion.clone()),
            StubReply::Failure { status, message } => Err(ProviderError::Status {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Provider double that records every request it is given.
///
/// A scripted stub answers from its queue; once the queue is empty, or for
/// a fixed stub, the fallback reply is used.
pub struct StubProvider {
    script: Mutex<VecDeque<StubReply>>,
    fallback: StubReply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl StubProvider {
    pub fn replying(content: &str, usage: Option<Usage>) -> Self {
        Self::with_fallback(StubReply::Text(Completion {
            content: content.to_string(),
            usage,
        }))
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self::with_fallback(StubReply::failure(status, message))
    }

    pub fn scripted(replies: Vec<StubReply>) -> Self {
        let provider = Self::with_fallback(StubReply::failure(500, "no scripted reply left"));
        *provider.script.lock().expect("script lock") = replies.into();
        provider
    }

    fn with_fallback(fallback: StubReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, ProviderError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let next = self.script.lock().expect("script lock").pop_front();
        next.unwrap_or_else(|| self.fallback.clone()).to_result()
    }
}

/// Factory double that counts construction attempts.
pub struct StubFactory {
    provider: Option<Arc<StubProvider>>,
    rejected_token: Option<String>,
    builds: Arc<AtomicUsize>,
}

impl StubFactory {
    pub fn accepting() -> Self {
        Self::serving(Arc::new(StubProvider::replying(
            "stub reply",
            Some(Usage::new(1, 1, None)),
        )))
    }

    pub fn serving(provider: Arc<StubProvider>) -> Self {
        Self {
            provider: Some(provider),
            rejected_token: None,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            provider: None,
            rejected_token: None,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Refuses this one token while accepting every other.
    pub fn rejecting_token(mut self, token: &str) -> Self {
        self.rejected_token = Some(token.to_string());
        self
    }

    pub fn build_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.builds)
    }
}

impl ProviderFactory for StubFactory {
    fn build(
        &self,
        credential: &Credential,
    ) -> Result<Arc<dyn CompletionProvider>, CredentialError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.rejected_token.as_deref() == Some(credential.expose()) {
            return Err(CredentialError::Malformed);
        }
        match &self.provider {
            Some(provider) => {
                let provider: Arc<dyn CompletionProvider> = provider.clone();
                Ok(provider)
            }
            None => Err(CredentialError::Missing),
        }
    }
}

pub fn test_session_init() -> SessionInit {
    SessionInit {
        model: "gpt-4o".to_string(),
        personality: Personality::default(),
        pricing: ModelPricing::per_million(5.0, 15.0),
        currency: DisplayCurrency::default(),
        logging: LoggingState::new(None).expect("logging without file"),
    }
}

pub fn create_disconnected_session() -> Session {
    Session::new(
        test_session_init(),
        ProviderSlot::new(Box::new(StubFactory::accepting())),
    )
}

/// A session already connected to `provider`.
pub fn create_test_session(provider: Arc<StubProvider>) -> Session {
    let mut session = Session::new(
        test_session_init(),
        ProviderSlot::new(Box::new(StubFactory::serving(provider))),
    );
    session
        .connect(Credential::new("sk-test"))
        .expect("stub factory accepts every credential");
    session
}
