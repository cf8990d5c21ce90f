//! Where the API key comes from.
//!
//! Sources are tried in order: the `OPENAI_API_KEY` environment variable,
//! then the system keyring. The interactive chat falls back to a masked
//! prompt when neither has a key.

use keyring::Entry;
use std::io::{self, IsTerminal};
use tracing::{debug, warn};

use crate::core::keyring::KeyringAccessError;
use crate::core::provider_slot::Credential;
use crate::utils::line_editor::prompt_secret;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
const KEYRING_SERVICE: &str = "pionier";
const KEYRING_USER: &str = "openai";
pub const MASKED_INPUT_PROMPT: &str = "Enter your OpenAI API key (F2 reveals last 4 chars): ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Keyring,
    Prompt,
}

impl CredentialSource {
    pub fn describe(self) -> &'static str {
        match self {
            CredentialSource::Environment => "environment",
            CredentialSource::Keyring => "keyring",
            CredentialSource::Prompt => "prompt",
        }
    }
}

/// Persistent home for the API key.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<Credential>, KeyringAccessError>;
    fn store(&self, credential: &Credential) -> Result<(), KeyringAccessError>;
    /// Returns whether a key was present.
    fn delete(&self) -> Result<bool, KeyringAccessError>;
}

pub struct KeyringStore;

impl KeyringStore {
    fn entry(&self) -> Result<Entry, KeyringAccessError> {
        Entry::new(KEYRING_SERVICE, KEYRING_USER).map_err(KeyringAccessError::from)
    }
}

impl CredentialStore for KeyringStore {
    fn load(&self) -> Result<Option<Credential>, KeyringAccessError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(Credential::new(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, credential: &Credential) -> Result<(), KeyringAccessError> {
        self.entry()?
            .set_password(credential.expose())
            .map_err(KeyringAccessError::from)
    }

    fn delete(&self) -> Result<bool, KeyringAccessError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Finds a stored key without prompting.
///
/// `env_value` is the content of [`API_KEY_ENV`]; blank values are ignored.
/// Keyring failures are logged and treated as "no key".
pub fn resolve_credential(
    env_value: Option<String>,
    store: &dyn CredentialStore,
) -> Option<(Credential, CredentialSource)> {
    if let Some(token) = env_value.filter(|token| !token.trim().is_empty()) {
        debug!("using API key from environment");
        return Some((Credential::new(token), CredentialSource::Environment));
    }

    match store.load() {
        Ok(Some(credential)) => {
            debug!("using API key from keyring");
            Some((credential, CredentialSource::Keyring))
        }
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "could not read API key from keyring");
            None
        }
    }
}

pub fn resolve_from_environment(store: &dyn CredentialStore) -> Option<(Credential, CredentialSource)> {
    resolve_credential(std::env::var(API_KEY_ENV).ok(), store)
}

pub fn interactive_auth(store: &dyn CredentialStore) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Pionier Authentication Setup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let token = if io::stdin().is_terminal() {
        prompt_secret(MASKED_INPUT_PROMPT)?
    } else {
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        line
    };
    let credential = Credential::new(token.trim());
    if credential.expose().is_empty() {
        return Err("No API key entered".into());
    }

    store.store(&credential)?;
    println!("✅ API key {} saved to the system keyring", credential.masked());
    Ok(())
}

pub fn interactive_deauth(store: &dyn CredentialStore) -> Result<(), Box<dyn std::error::Error>> {
    if store.delete()? {
        println!("✅ API key removed from the system keyring");
    } else {
        println!("ℹ️  No API key was stored in the system keyring");
    }
    Ok(())
}
