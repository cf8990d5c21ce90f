//! Line-oriented chat loop.

use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

use crate::commands::{process_input, CommandContext, CommandResult};
use crate::core::session::{Session, SubmitError};
use crate::ui::render::{format_cost_metrics, format_error, format_turn, format_usage};
use crate::utils::line_editor::{SecretPrompt, TerminalSecretPrompt};

pub const INPUT_PROMPT: &str = "> ";

/// Runs the chat against the process's terminal until `/quit` or EOF.
pub async fn run_chat(session: &mut Session) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_loop(session, stdin.lock(), &mut stdout, &mut TerminalSecretPrompt).await
}

/// Reads `input` line by line, running commands and submitting prompts.
///
/// Provider failures are printed and the loop carries on; only I/O errors
/// on `input` or `output` end it early.
pub async fn run_loop<R, W>(
    session: &mut Session,
    mut input: R,
    output: &mut W,
    secrets: &mut dyn SecretPrompt,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    write_banner(session, output)?;

    let mut line = String::new();
    loop {
        write!(output, "{INPUT_PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let text = line.trim_end_matches(['\n', '\r']);
        if text.trim().is_empty() {
            continue;
        }

        let result = {
            let mut ctx = CommandContext {
                session: &mut *session,
                output: &mut *output,
                secrets: &mut *secrets,
            };
            process_input(&mut ctx, text)?
        };

        match result {
            CommandResult::Continue => {}
            CommandResult::Quit => break,
            CommandResult::ProcessAsMessage(prompt) => {
                submit_and_render(session, &prompt, output).await?;
            }
        }
    }

    debug!(turns = session.conversation().len(), "chat loop finished");
    Ok(())
}

fn write_banner<W: Write>(session: &Session, output: &mut W) -> io::Result<()> {
    writeln!(
        output,
        "Pionier · model {} · /help lists commands",
        session.model()
    )?;
    if session.logging.is_active() {
        writeln!(output, "Transcript: {}", session.logging.get_status_string())?;
    }
    if !session.is_connected() {
        writeln!(output, "No API key is active yet. Use /key to enter one.")?;
    }
    Ok(())
}

/// Submits one prompt and prints the reply with its usage and the running
/// cost, or the error that stopped it.
pub async fn submit_and_render<W: Write>(
    session: &mut Session,
    prompt: &str,
    output: &mut W,
) -> io::Result<()> {
    match session.submit(prompt).await {
        Ok(turn) => {
            writeln!(output, "{}", format_turn(&turn))?;
            if let Some(usage) = turn.usage {
                writeln!(output, "({})", format_usage(&usage))?;
            }
            writeln!(output, "{}", format_cost_metrics(&session.cost_metrics()))?;
        }
        Err(SubmitError::EmptyPrompt) => {}
        Err(err) => {
            warn!(error = %err, "prompt failed");
            writeln!(output, "{}", format_error(err))?;
        }
    }
    Ok(())
}
