use super::{CommandContext, CommandResult};
use std::io;

pub type CommandHandler = fn(&mut CommandContext<'_>, CommandInvocation<'_>) -> io::Result<CommandResult>;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "cost",
        usage: "/cost",
        help: "Show token usage and the conversation cost so far.",
        handler: super::handle_cost,
    },
    Command {
        name: "personality",
        usage: "/personality [text]",
        help: "Show the system instruction, or replace it for this session.",
        handler: super::handle_personality,
    },
    Command {
        name: "history",
        usage: "/history",
        help: "Show how many turns are stored and how many are sent as context.",
        handler: super::handle_history,
    },
    Command {
        name: "log",
        usage: "/log [filename]",
        help: "Toggle transcript logging or start logging to a file.",
        handler: super::handle_log,
    },
    Command {
        name: "dump",
        usage: "/dump [filename]",
        help: "Write the whole conversation to a file.",
        handler: super::handle_dump,
    },
    Command {
        name: "key",
        usage: "/key",
        help: "Enter a different API key.",
        handler: super::handle_key,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat (also /exit).",
        handler: super::handle_quit,
    },
    Command {
        name: "exit",
        usage: "/exit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
