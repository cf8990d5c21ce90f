//! One-shot prompt without the interactive loop

use std::error::Error;
use std::io::{self, Write};

use crate::auth::API_KEY_ENV;
use crate::cli::connect_stored;
use crate::core::session::Session;
use crate::ui::render::format_cost_metrics;

pub async fn run_say(mut session: Session, prompt: Vec<String>) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: pionier say <prompt>".into());
    }

    if connect_stored(&mut session).is_none() {
        return Err(format!(
            "No API key found. Set {API_KEY_ENV} or run `pionier auth` first."
        )
        .into());
    }

    say_once(&mut session, &prompt, &mut io::stdout(), &mut io::stderr()).await
}

/// Prints the reply to `out` and the cost line to `err`, so the reply can be
/// piped on its own.
pub async fn say_once<O: Write, E: Write>(
    session: &mut Session,
    prompt: &str,
    out: &mut O,
    err: &mut E,
) -> Result<(), Box<dyn Error>> {
    let reply = session.submit(prompt).await?;
    writeln!(out, "{}", reply.content)?;
    writeln!(err, "{}", format_cost_metrics(&session.cost_metrics()))?;
    Ok(())
}
