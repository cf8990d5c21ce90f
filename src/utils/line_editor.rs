//! Masked single-line prompt used for entering API keys.

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

const REVEAL_TAIL_CHARS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretInputState {
    pub text: String,
    pub reveal_tail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretEditAction {
    Insert(char),
    Backspace,
    ClearAll,
    ToggleReveal,
    Paste(String),
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretEditOutcome {
    Continue { redraw: bool },
    Submit(String),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct LineEditorError {
    message: String,
}

impl LineEditorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(CANCELLED)
    }

    pub fn is_cancelled(&self) -> bool {
        self.message == CANCELLED
    }
}

const CANCELLED: &str = "Cancelled by user";

impl fmt::Display for LineEditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LineEditorError {}

/// Source of secrets for commands that ask for one mid-session.
pub trait SecretPrompt {
    fn read_secret(&mut self, prompt: &str) -> Result<String, LineEditorError>;
}

/// Reads secrets from the controlling terminal with [`prompt_secret`].
pub struct TerminalSecretPrompt;

impl SecretPrompt for TerminalSecretPrompt {
    fn read_secret(&mut self, prompt: &str) -> Result<String, LineEditorError> {
        prompt_secret(prompt)
    }
}

/// Reads a secret without echoing it. F2 toggles showing the last four
/// characters; Esc or Ctrl+C cancels.
pub fn prompt_secret(prompt: &str) -> Result<String, LineEditorError> {
    if !io::stdin().is_terminal() {
        return Err(LineEditorError::new(
            "stdin is not a terminal; set OPENAI_API_KEY instead",
        ));
    }

    enable_raw_mode().map_err(|err| LineEditorError::new(err.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, event::EnableBracketedPaste)
        .map_err(|err| LineEditorError::new(err.to_string()))?;

    let result = read_secret_loop(prompt);

    let disable_raw_result =
        disable_raw_mode().map_err(|err| LineEditorError::new(err.to_string()));
    let disable_paste_result = execute!(stdout, event::DisableBracketedPaste)
        .map_err(|err| LineEditorError::new(err.to_string()));
    println!();

    let value = result?;
    disable_raw_result?;
    disable_paste_result?;
    Ok(value)
}

fn read_secret_loop(prompt: &str) -> Result<String, LineEditorError> {
    let mut state = SecretInputState::default();
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            redraw(prompt, &state).map_err(|err| LineEditorError::new(err.to_string()))?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(100))
            .map_err(|err| LineEditorError::new(err.to_string()))?
        {
            continue;
        }

        let action = match event::read().map_err(|err| LineEditorError::new(err.to_string()))? {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key_event(&key),
            Event::Paste(text) => Some(SecretEditAction::Paste(text)),
            _ => None,
        };

        if let Some(action) = action {
            match apply_secret_action(&mut state, action) {
                SecretEditOutcome::Continue { redraw } => needs_redraw = redraw,
                SecretEditOutcome::Submit(value) => return Ok(value),
                SecretEditOutcome::Cancelled => return Err(LineEditorError::cancelled()),
            }
        }
    }
}

fn redraw(prompt: &str, state: &SecretInputState) -> io::Result<()> {
    let masked = masked_display(state);
    print!("\r\x1b[K{prompt}{masked}");
    let column = UnicodeWidthStr::width(prompt) + UnicodeWidthStr::width(masked.as_str());
    print!("\r\x1b[{column}C");
    io::stdout().flush()
}

pub fn masked_display(state: &SecretInputState) -> String {
    let len = state.text.chars().count();
    if state.reveal_tail && len >= REVEAL_TAIL_CHARS {
        let visible_start = len - REVEAL_TAIL_CHARS;
        let tail: String = state.text.chars().skip(visible_start).collect();
        format!("{}{}", "*".repeat(visible_start), tail)
    } else {
        "*".repeat(len)
    }
}

pub fn map_key_event(key: &KeyEvent) -> Option<SecretEditAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(SecretEditAction::Submit),
        KeyCode::Esc => Some(SecretEditAction::Cancel),
        KeyCode::Backspace => Some(SecretEditAction::Backspace),
        KeyCode::F(2) => Some(SecretEditAction::ToggleReveal),
        KeyCode::Char('c') if ctrl => Some(SecretEditAction::Cancel),
        KeyCode::Char('u') if ctrl => Some(SecretEditAction::ClearAll),
        KeyCode::Char(c) if !ctrl => Some(SecretEditAction::Insert(c)),
        _ => None,
    }
}

pub fn apply_secret_action(
    state: &mut SecretInputState,
    action: SecretEditAction,
) -> SecretEditOutcome {
    match action {
        SecretEditAction::Insert('\n' | '\r') | SecretEditAction::Submit => {
            SecretEditOutcome::Submit(state.text.clone())
        }
        SecretEditAction::Insert(c) if c.is_control() => {
            SecretEditOutcome::Continue { redraw: false }
        }
        SecretEditAction::Insert(c) => {
            state.text.push(c);
            state.reveal_tail = false;
            SecretEditOutcome::Continue { redraw: true }
        }
        SecretEditAction::Backspace => {
            let removed = state.text.pop().is_some();
            if removed {
                state.reveal_tail = false;
            }
            SecretEditOutcome::Continue { redraw: removed }
        }
        SecretEditAction::ClearAll => {
            let had_text = !state.text.is_empty();
            state.text.clear();
            state.reveal_tail = false;
            SecretEditOutcome::Continue { redraw: had_text }
        }
        SecretEditAction::ToggleReveal => {
            state.reveal_tail = !state.reveal_tail;
            SecretEditOutcome::Continue { redraw: true }
        }
        SecretEditAction::Paste(text) => {
            let first_line = text.split(['\n', '\r']).next().unwrap_or("");
            state
                .text
                .extend(first_line.chars().filter(|c| !c.is_control()));
            state.reveal_tail = false;
            if text.contains(['\n', '\r']) {
                SecretEditOutcome::Submit(state.text.clone())
            } else {
                SecretEditOutcome::Continue { redraw: true }
            }
        }
        SecretEditAction::Cancel => SecretEditOutcome::Cancelled,
    }
}
