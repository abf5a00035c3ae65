use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Append-only plaintext chat log kept alongside the settings file.
///
/// Entries mirror what the scrollback shows: `You: ...` / `Bot: ...`, each
/// followed by a blank line. A timestamped header separates sessions. Log
/// failures are reported to the caller but are never fatal to the chat.
pub struct TranscriptLog {
    path: PathBuf,
    wrote_session_header: bool,
}

impl TranscriptLog {
    pub fn new(path: PathBuf) -> Self {
        TranscriptLog {
            path,
            wrote_session_header: false,
        }
    }

    pub fn log_message(&mut self, label: &str, content: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if !self.wrote_session_header {
            writeln!(
                file,
                "--- session started {} ---\n",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            )?;
            self.wrote_session_header = true;
        }

        writeln!(file, "{}: {}\n", label, content)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn messages_append_with_labels_and_spacing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_log.txt");
        let mut log = TranscriptLog::new(path.clone());

        log.log_message("You", "Hi").unwrap();
        log.log_message("Bot", "Hello").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("--- session started "));
        assert!(contents.contains("You: Hi\n\n"));
        assert!(contents.contains("Bot: Hello\n\n"));
    }

    #[test]
    fn session_header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_log.txt");
        let mut log = TranscriptLog::new(path.clone());

        log.log_message("You", "one").unwrap();
        log.log_message("You", "two").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("--- session started").count(), 1);
    }

    #[test]
    fn log_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("chat_log.txt");
        let mut log = TranscriptLog::new(path.clone());
        log.log_message("You", "Hi").unwrap();
        assert!(path.exists());
    }
}
