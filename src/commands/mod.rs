mod registry;

pub use registry::{all_commands, find_command, Command, CommandInvocation};

use chrono::Local;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

use crate::auth::MASKED_INPUT_PROMPT;
use crate::core::orchestrator::HISTORY_WINDOW;
use crate::core::personality::Personality;
use crate::core::provider_slot::{ConnectOutcome, Credential};
use crate::core::session::Session;
use crate::ui::render::{format_cost_metrics, format_error, format_token_totals};
use crate::utils::line_editor::SecretPrompt;
use crate::utils::logging::dump_conversation;

#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

/// What a command handler may touch.
pub struct CommandContext<'a> {
    pub session: &'a mut Session,
    pub output: &'a mut dyn Write,
    pub secrets: &'a mut dyn SecretPrompt,
}

/// Routes one line of input: `/name args` runs a command, anything else is
/// a prompt for the model.
pub fn process_input(ctx: &mut CommandContext<'_>, input: &str) -> io::Result<CommandResult> {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return Ok(CommandResult::ProcessAsMessage(input.to_string()));
    }

    let mut parts = trimmed[1..].splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(CommandResult::ProcessAsMessage(input.to_string())),
    };
    let args = parts.next().unwrap_or("").trim();

    match find_command(command_name) {
        Some(command) => {
            let invocation = CommandInvocation { args };
            (command.handler)(ctx, invocation)
        }
        None => {
            writeln!(
                ctx.output,
                "{}",
                format_error(format!("Unknown command: /{command_name} (try /help)"))
            )?;
            Ok(CommandResult::Continue)
        }
    }
}

pub(super) fn handle_help(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    writeln!(ctx.output, "Commands:")?;
    let width = all_commands()
        .iter()
        .map(|command| command.usage.len())
        .max()
        .unwrap_or(0);
    for command in all_commands() {
        writeln!(ctx.output, "  {:<width$}  {}", command.usage, command.help)?;
    }
    writeln!(ctx.output, "Anything else is sent to the model.")?;
    Ok(CommandResult::Continue)
}

pub(super) fn handle_cost(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    writeln!(
        ctx.output,
        "{}",
        format_token_totals(ctx.session.conversation())
    )?;
    writeln!(
        ctx.output,
        "{}",
        format_cost_metrics(&ctx.session.cost_metrics())
    )?;
    Ok(CommandResult::Continue)
}

pub(super) fn handle_personality(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    if invocation.args.is_empty() {
        writeln!(ctx.output, "Current personality:")?;
        writeln!(ctx.output, "{}", ctx.session.personality())?;
        return Ok(CommandResult::Continue);
    }

    match Personality::new(invocation.args) {
        Ok(personality) => {
            ctx.session.set_personality(personality);
            writeln!(ctx.output, "Personality updated for this session.")?;
        }
        Err(err) => writeln!(ctx.output, "{}", format_error(err))?,
    }
    Ok(CommandResult::Continue)
}

pub(super) fn handle_history(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    let stored = ctx.session.conversation().len();
    writeln!(
        ctx.output,
        "{stored} turns stored; the last {} are sent with each prompt.",
        stored.min(HISTORY_WINDOW)
    )?;
    Ok(CommandResult::Continue)
}

pub(super) fn handle_log(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    let parts: Vec<&str> = invocation.args.split_whitespace().collect();
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let logging = &mut ctx.session.logging;

    let line = match parts.as_slice() {
        [] => {
            let marker = if logging.is_active() {
                format!("Logging paused at {timestamp}")
            } else {
                format!("Logging resumed at {timestamp}")
            };
            match logging.toggle_logging(&marker) {
                Ok(message) => message,
                Err(err) => format_error(format!("Log error: {err}")),
            }
        }
        [filename] => match logging.set_log_file((*filename).to_string()) {
            Ok(message) => {
                if let Err(err) = logging.log_message(&format!("## Logging started at {timestamp}")) {
                    warn!(error = %err, "could not write log marker");
                }
                message
            }
            Err(err) => format_error(format!("Logfile error: {err}")),
        },
        _ => "Usage: /log [filename]".to_string(),
    };
    writeln!(ctx.output, "{line}")?;
    Ok(CommandResult::Continue)
}

pub(super) fn handle_dump(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    let parts: Vec<&str> = invocation.args.split_whitespace().collect();
    let filename = match parts.as_slice() {
        [] => default_dump_filename(),
        [filename] => (*filename).to_string(),
        _ => {
            writeln!(ctx.output, "Usage: /dump [filename]")?;
            return Ok(CommandResult::Continue);
        }
    };

    if ctx.session.conversation().is_empty() {
        writeln!(ctx.output, "Nothing to dump yet.")?;
        return Ok(CommandResult::Continue);
    }

    match dump_conversation(ctx.session.conversation(), Path::new(&filename)) {
        Ok(()) => writeln!(ctx.output, "Dumped: {filename}")?,
        Err(err) => writeln!(ctx.output, "{}", format_error(format!("Dump error: {err}")))?,
    }
    Ok(CommandResult::Continue)
}

pub fn default_dump_filename() -> String {
    format!("pionier-log-{}.txt", Local::now().format("%Y-%m-%d"))
}

pub(super) fn handle_key(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    let token = match ctx.secrets.read_secret(MASKED_INPUT_PROMPT) {
        Ok(token) => token,
        Err(err) if err.is_cancelled() => {
            writeln!(ctx.output, "Key entry cancelled.")?;
            return Ok(CommandResult::Continue);
        }
        Err(err) => {
            writeln!(ctx.output, "{}", format_error(err))?;
            return Ok(CommandResult::Continue);
        }
    };

    let credential = Credential::new(token.trim());
    if credential.expose().is_empty() {
        writeln!(ctx.output, "No API key entered.")?;
        return Ok(CommandResult::Continue);
    }

    let masked = credential.masked();
    match ctx.session.connect(credential) {
        Ok(ConnectOutcome::Connected) => writeln!(ctx.output, "✅ Using API key {masked}")?,
        Ok(ConnectOutcome::Reused) => writeln!(ctx.output, "ℹ️  API key {masked} is already active")?,
        Err(err) => writeln!(ctx.output, "{}", format_error(err))?,
    }
    Ok(CommandResult::Continue)
}

pub(super) fn handle_quit(
    _ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> io::Result<CommandResult> {
    Ok(CommandResult::Quit)
}
