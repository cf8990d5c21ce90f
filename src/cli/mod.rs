//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments, builds the chat session from the
//! stored configuration, and dispatches to the selected subcommand.

pub mod pricing_list;
pub mod say;

use std::error::Error;
use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::auth::{
    interactive_auth, interactive_deauth, resolve_from_environment, CredentialSource,
    KeyringStore, MASKED_INPUT_PROMPT,
};
use crate::cli::pricing_list::list_pricing;
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::personality::Personality;
use crate::core::provider_slot::{Credential, OpenAiFactory, ProviderSlot};
use crate::core::session::{Session, SessionInit};
use crate::ui::chat_loop::run_chat;
use crate::utils::line_editor::prompt_secret;
use crate::utils::logging::LoggingState;

pub const LOG_ENV: &str = "PIONIER_LOG";

#[derive(Parser)]
#[command(name = "pionier")]
#[command(about = "A terminal chat client for the OpenAI chat completions API")]
#[command(
    long_about = "Pionier sends your prompts to an OpenAI-compatible chat completions endpoint, \
keeps the last ten turns as context, and shows what the conversation has cost so far \
in US dollars and a display currency.\n\n\
Authentication:\n\
  OPENAI_API_KEY    Used first when set\n\
  pionier auth      Stores a key in the system keyring\n\
  /key              Enters a key during a chat\n\n\
Environment Variables:\n\
  PIONIER_LOG       Diagnostic log filter (e.g. debug, pionier=info)\n\n\
Commands:\n\
  /help             List chat commands\n\
  /cost             Show token usage and cost\n\
  /log <filename>   Enable logging to specified file\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use instead of the configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,

    /// System instruction to use instead of the configured one
    #[arg(long, global = true, value_name = "TEXT")]
    pub personality: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and print the reply
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List known model prices
    Pricing,
    /// Store an API key in the system keyring
    Auth,
    /// Remove the stored API key from the system keyring
    Deauth,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
        /// Value to unset for the key (the model, for pricing)
        value: Option<String>,
    },
}

/// Overrides given on the command line for one run.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub model: Option<String>,
    pub log: Option<String>,
    pub personality: Option<String>,
}

impl From<&Args> for SessionOptions {
    fn from(args: &Args) -> Self {
        Self {
            model: args.model.clone(),
            log: args.log.clone(),
            personality: args.personality.clone(),
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let options = SessionOptions::from(&args);

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            let mut session = or_exit(build_session(&config, &options));
            connect_for_chat(&mut session);
            run_chat(&mut session).await?;
            Ok(())
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            let session = or_exit(build_session(&config, &options));
            if let Err(e) = run_say(session, prompt).await {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Pricing => {
            let config = Config::load()?;
            let model = options
                .model
                .as_deref()
                .unwrap_or_else(|| config.effective_model());
            print!("{}", list_pricing(&config, model));
            Ok(())
        }
        Commands::Auth => {
            if let Err(e) = interactive_auth(&KeyringStore) {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            if let Err(e) = interactive_deauth(&KeyringStore) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key.filter(|_| !value.is_empty()) else {
                config.print_all();
                return Ok(());
            };
            match config.set_value(&key, &value) {
                Ok(message) => {
                    config.save()?;
                    println!("✅ {message}");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Unset { key, value } => {
            let mut config = Config::load()?;
            match config.unset_value(&key, value.as_deref()) {
                Ok(message) => {
                    config.save()?;
                    println!("✅ {message}");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn or_exit<T>(result: Result<T, Box<dyn Error>>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("❌ {e}");
        std::process::exit(1)
    })
}

/// Resolves model, pricing, personality and transcript logging for a run.
///
/// Fails when the chosen model has no price, since cost could not be shown.
pub fn session_init(config: &Config, options: &SessionOptions) -> Result<SessionInit, Box<dyn Error>> {
    let model = options
        .model
        .clone()
        .unwrap_or_else(|| config.effective_model().to_string());

    let pricing = config.pricing_table().get(&model).ok_or_else(|| {
        format!(
            "No pricing known for model '{model}'. Add it with: \
             pionier set pricing {model} <INPUT_PER_MILLION> <OUTPUT_PER_MILLION>"
        )
    })?;

    let personality = match options.personality.as_deref() {
        Some(text) => Personality::new(text)?,
        None => config.effective_personality()?,
    };

    Ok(SessionInit {
        model,
        personality,
        pricing,
        currency: config.display_currency(),
        logging: LoggingState::new(options.log.clone())?,
    })
}

pub fn build_session(config: &Config, options: &SessionOptions) -> Result<Session, Box<dyn Error>> {
    let init = session_init(config, options)?;
    let slot = ProviderSlot::new(Box::new(OpenAiFactory::new(config.effective_base_url())));
    info!(model = %init.model, "session configured");
    Ok(Session::new(init, slot))
}

/// Connects with a stored key.
pub fn connect_stored(session: &mut Session) -> Option<CredentialSource> {
    let (credential, source) = resolve_from_environment(&KeyringStore)?;
    match session.connect(credential) {
        Ok(_) => Some(source),
        Err(e) => {
            eprintln!("❌ API key from {} was rejected: {e}", source.describe());
            None
        }
    }
}

/// Connects with a stored key, or asks for one when running on a terminal.
/// A declined prompt leaves the session disconnected; `/key` can fix it later.
fn connect_for_chat(session: &mut Session) {
    if connect_stored(session).is_some() || !io::stdin().is_terminal() {
        return;
    }

    match prompt_secret(MASKED_INPUT_PROMPT) {
        Ok(token) if !token.trim().is_empty() => {
            if let Err(e) = session.connect(Credential::new(token.trim())) {
                eprintln!("❌ {e}");
            } else {
                info!(source = CredentialSource::Prompt.describe(), "API key entered");
            }
        }
        Ok(_) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => warn!(error = %e, "could not read API key"),
    }
}
