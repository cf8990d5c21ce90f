use crate::core::message::{Role, Turn};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const USER_PREFIX: &str = "You";

/// Plain-text transcript of the conversation, appended turn by turn.
pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut logging = LoggingState {
            file_path: None,
            is_active: false,
        };

        if let Some(path) = log_file {
            logging.set_log_file(path)?;
        }

        Ok(logging)
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(
        &mut self,
        pause_message: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        match self.file_path.clone() {
            Some(path) => {
                if self.is_active {
                    // Marker goes in before the pause takes effect
                    self.log_message(&format!("## {pause_message}"))?;
                    self.is_active = false;
                    Ok(format!("Logging paused (file: {path})"))
                } else {
                    self.is_active = true;
                    self.log_message(&format!("## {pause_message}"))?;
                    Ok(format!("Logging resumed to: {path}"))
                }
            }
            None => {
                Err("No log file specified. Use /log <filename> to enable logging first.".into())
            }
        }
    }

    pub fn log_turn(&self, turn: &Turn) -> Result<(), Box<dyn std::error::Error>> {
        match turn.role {
            Role::User => self.log_message(&format!("{USER_PREFIX}: {}", turn.content)),
            Role::Assistant if !turn.content.is_empty() => self.log_message(&turn.content),
            _ => Ok(()),
        }
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_deref() else {
            return Ok(());
        };
        if !self.is_active {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);
        write_block(&mut writer, content)?;
        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!(
                "active ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
            (Some(path), false) => format!(
                "paused ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }
}

/// Each line of the block, then a blank separator line.
fn write_block<W: Write>(writer: &mut W, content: &str) -> std::io::Result<()> {
    for line in content.lines() {
        writeln!(writer, "{line}")?;
    }
    writeln!(writer)
}

/// Writes the whole conversation to `path`, replacing it atomically.
pub fn dump_conversation<'a, I>(turns: I, path: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    I: IntoIterator<Item = &'a Turn>,
{
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent)?;

    for turn in turns {
        match turn.role {
            Role::User => write_block(&mut temp_file, &format!("{USER_PREFIX}: {}", turn.content))?,
            Role::Assistant if !turn.content.is_empty() => {
                write_block(&mut temp_file, &turn.content)?
            }
            _ => {}
        }
    }

    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path)?;
    Ok(())
}

fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Usage;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn logging_starts_active_when_file_given() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("chat.log");
        let logging =
            LoggingState::new(Some(path.to_string_lossy().to_string())).expect("logging");

        assert!(logging.is_active());
        logging.log_turn(&Turn::user("Hello")).expect("log user");
        logging
            .log_turn(&Turn::assistant("Hi\nthere", Usage::default()))
            .expect("log assistant");

        let contents = fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "You: Hello\n\nHi\nthere\n\n");
    }

    #[test]
    fn paused_logging_writes_marker_then_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("chat.log");
        let mut logging =
            LoggingState::new(Some(path.to_string_lossy().to_string())).expect("logging");

        let status = logging.toggle_logging("Logging paused").expect("pause");
        assert!(status.starts_with("Logging paused"));
        assert!(!logging.is_active());
        logging.log_turn(&Turn::user("hidden")).expect("no-op");

        let contents = fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "## Logging paused\n\n");
        assert_eq!(logging.get_status_string(), "paused (chat.log)");
    }

    #[test]
    fn toggle_without_file_is_an_error() {
        let mut logging = LoggingState::new(None).expect("logging");
        assert!(logging.toggle_logging("paused").is_err());
        assert_eq!(logging.get_status_string(), "disabled");
    }

    #[test]
    fn dump_writes_every_turn() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("dump.txt");
        let turns = vec![
            Turn::user("A"),
            Turn::assistant("B", Usage::new(1, 1, None)),
            Turn::new(Role::System, "not part of the transcript"),
        ];

        dump_conversation(&turns, &path).expect("dump");
        let contents = fs::read_to_string(&path).expect("read dump");
        assert_eq!(contents, "You: A\n\nB\n\n");
    }
}
