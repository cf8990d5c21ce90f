use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::provider::{CompletionProvider, OpenAiProvider};

/// An API token. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Shows only the last four characters, and none of a token that short.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.trim().chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail_start = chars.len() - 4;
        let tail: String = chars[tail_start..].iter().collect();
        format!("{}{}", "*".repeat(tail_start.min(8)), tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

#[derive(Debug)]
pub enum CredentialError {
    /// No credential, or only whitespace.
    Missing,
    /// The token cannot be carried in an HTTP header.
    Malformed,
    /// The HTTP client itself could not be built.
    Client(reqwest::Error),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Missing => write!(
                f,
                "No API key provided. Set OPENAI_API_KEY, run 'pionier auth', or use /key."
            ),
            CredentialError::Malformed => {
                write!(f, "API key contains characters that cannot be sent")
            }
            CredentialError::Client(err) => write!(f, "Failed to create HTTP client: {err}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialError::Client(err) => Some(err),
            _ => None,
        }
    }
}

/// Turns a credential into a provider handle.
pub trait ProviderFactory: Send + Sync {
    fn build(&self, credential: &Credential)
        -> Result<Arc<dyn CompletionProvider>, CredentialError>;
}

pub struct OpenAiFactory {
    base_url: String,
}

impl OpenAiFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl ProviderFactory for OpenAiFactory {
    fn build(
        &self,
        credential: &Credential,
    ) -> Result<Arc<dyn CompletionProvider>, CredentialError> {
        let provider = OpenAiProvider::new(credential, &self.base_url)?;
        Ok(Arc::new(provider))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new handle was built for this credential.
    Connected,
    /// The handle for this credential already existed.
    Reused,
}

/// Holds at most one provider handle for the session.
///
/// Construction runs once per distinct credential: a credential that
/// already produced a handle reuses it, and one that already failed
/// reports the earlier failure without rebuilding. A rejected credential
/// never displaces a working handle.
pub struct ProviderSlot {
    factory: Box<dyn ProviderFactory>,
    current: Option<(Credential, Arc<dyn CompletionProvider>)>,
    last_failure: Option<(Credential, String)>,
}

impl ProviderSlot {
    pub fn new(factory: Box<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            current: None,
            last_failure: None,
        }
    }

    pub fn connect(&mut self, credential: Credential) -> Result<ConnectOutcome, SlotError> {
        if matches!(&self.current, Some((current, _)) if *current == credential) {
            return Ok(ConnectOutcome::Reused);
        }
        if let Some((failed, message)) = &self.last_failure {
            if *failed == credential {
                return Err(SlotError::PreviouslyFailed(message.clone()));
            }
        }

        match self.factory.build(&credential) {
            Ok(provider) => {
                info!(credential = %credential.masked(), "provider client ready");
                self.current = Some((credential, provider));
                Ok(ConnectOutcome::Connected)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    keeps_previous = self.current.is_some(),
                    "provider client construction failed"
                );
                self.last_failure = Some((credential, err.to_string()));
                Err(SlotError::Credential(err))
            }
        }
    }

    /// The current handle, if a credential has connected successfully.
    pub fn provider(&self) -> Option<Arc<dyn CompletionProvider>> {
        self.current
            .as_ref()
            .map(|(_, provider)| Arc::clone(provider))
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    pub fn credential_hint(&self) -> Option<String> {
        self.current
            .as_ref()
            .map(|(credential, _)| credential.masked())
    }
}

#[derive(Debug)]
pub enum SlotError {
    Credential(CredentialError),
    /// This credential already failed to build a client in this session.
    PreviouslyFailed(String),
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::Credential(err) => write!(f, "{err}"),
            SlotError::PreviouslyFailed(message) => {
                write!(f, "{message} (this key was already rejected)")
            }
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SlotError::Credential(err) => Some(err),
            SlotError::PreviouslyFailed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::StubFactory;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("sk-secret-value-9876");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("9876"));
        assert_eq!(Credential::new("abc").masked(), "***");
        assert_eq!(Credential::new("abcd").masked(), "****");
        assert_eq!(Credential::new("abcde").masked(), "*bcde");
        assert!(!format!("{:?}", Credential::new("key1")).contains("key1"));
    }

    #[test]
    fn same_credential_builds_once() {
        let factory = StubFactory::accepting();
        let builds = factory.build_count();
        let mut slot = ProviderSlot::new(Box::new(factory));

        assert!(!slot.is_ready());
        assert_eq!(
            slot.connect(Credential::new("sk-one")).expect("connect"),
            ConnectOutcome::Connected
        );
        assert_eq!(
            slot.connect(Credential::new("sk-one")).expect("reconnect"),
            ConnectOutcome::Reused
        );
        assert!(slot.is_ready());
        assert!(slot.provider().is_some());
        assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_credential_is_not_retried() {
        let factory = StubFactory::rejecting();
        let builds = factory.build_count();
        let mut slot = ProviderSlot::new(Box::new(factory));

        assert!(matches!(
            slot.connect(Credential::new("bad")),
            Err(SlotError::Credential(CredentialError::Missing))
        ));
        assert!(matches!(
            slot.connect(Credential::new("bad")),
            Err(SlotError::PreviouslyFailed(_))
        ));
        assert!(slot.provider().is_none());
        assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn new_credential_replaces_the_handle() {
        let factory = StubFactory::accepting();
        let builds = factory.build_count();
        let mut slot = ProviderSlot::new(Box::new(factory));

        slot.connect(Credential::new("sk-one")).expect("first");
        slot.connect(Credential::new("sk-two")).expect("second");

        assert_eq!(slot.credential_hint().as_deref(), Some("**-two"));
        assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn rejected_key_keeps_the_working_handle() {
        let factory = StubFactory::accepting().rejecting_token("sk-typo");
        let builds = factory.build_count();
        let mut slot = ProviderSlot::new(Box::new(factory));

        slot.connect(Credential::new("sk-good-1234")).expect("good key");
        assert!(slot.connect(Credential::new("sk-typo")).is_err());

        assert!(slot.is_ready());
        assert!(slot.provider().is_some());
        assert_eq!(slot.credential_hint().as_deref(), Some("********1234"));

        assert!(matches!(
            slot.connect(Credential::new("sk-typo")),
            Err(SlotError::PreviouslyFailed(_))
        ));
        assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn openai_factory_rejects_blank_key() {
        let factory = OpenAiFactory::new("https://api.openai.com/v1");
        assert!(matches!(
            factory.build(&Credential::new("")),
            Err(CredentialError::Missing)
        ));
    }
}
