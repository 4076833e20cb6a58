use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    domain::{Folder, FolderDirectory, MessageEvent},
    infrastructure::shutdown::ShutdownListener,
    tasks::queue::{Command, CommandQueue},
};

/// One line of the input stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputRecord {
    Folder(Folder),
    Message(MessageEvent),
    Save,
    Reset,
}

/// Feeds JSON-lines records into the folder directory and the command queue.
pub struct Intake {
    folders: Arc<FolderDirectory>,
    queue: Arc<CommandQueue<Command>>,
}

impl Intake {
    pub fn new(folders: Arc<FolderDirectory>, queue: Arc<CommandQueue<Command>>) -> Self {
        Self { folders, queue }
    }

    /// Reads until end of input or shutdown. Malformed lines are logged and skipped.
    pub async fn run<R>(&self, reader: R, shutdown: &mut ShutdownListener) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut accepted = 0;
        let mut line_no = 0usize;
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("failed to read input")?,
                _ = shutdown.notified() => break,
            };
            let Some(line) = line else { break };
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InputRecord>(&line) {
                Ok(record) => {
                    self.accept(record);
                    accepted += 1;
                }
                Err(err) => {
                    tracing::warn!(target: "intake", line = line_no, error = %err, "skipping malformed record");
                }
            }
        }
        tracing::info!(target: "intake", accepted, "input closed");
        Ok(accepted)
    }

    pub fn accept(&self, record: InputRecord) {
        match record {
            InputRecord::Folder(folder) => {
                tracing::debug!(
                    target: "intake",
                    account = folder.account,
                    folder = %folder.name,
                    folder_type = ?folder.folder_type,
                    "folder registered"
                );
                self.folders.register(folder);
            }
            InputRecord::Message(event) => self.queue.push(Command::Learn(event)),
            InputRecord::Save => self.queue.push(Command::Save),
            InputRecord::Reset => self.queue.push(Command::Reset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classifier::Direction, domain::FolderType, infrastructure::shutdown::Shutdown};

    const INPUT: &str = r#"{"type": "folder", "account": 1, "name": "Work", "folder_type": "user", "auto_classify": true}
{"type": "folder", "account": 1, "name": "INBOX", "folder_type": "inbox", "auto_classify": false}

not json
{"type": "message", "id": 3, "account": 1, "folder": "INBOX", "direction": "removed", "received": "2024-01-02T03:04:05Z", "from": [{"email": "a@b.example"}]}
{"type": "save"}
{"type": "reset"}
"#;

    #[test]
    fn folder_records_use_type_tag_and_folder_type() {
        let record: InputRecord = serde_json::from_str(
            r#"{"type": "folder", "account": 2, "name": "Spam", "folder_type": "junk", "auto_classify": true}"#,
        )
        .unwrap();
        match record {
            InputRecord::Folder(folder) => {
                assert_eq!(folder.folder_type, FolderType::Junk);
                assert!(folder.auto_classify);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_records_until_end_of_input() {
        let folders = Arc::new(FolderDirectory::new());
        let queue = Arc::new(CommandQueue::new());
        let intake = Intake::new(folders.clone(), queue.clone());
        let (_shutdown, mut listener) = Shutdown::new();

        let accepted = intake.run(INPUT.as_bytes(), &mut listener).await.unwrap();

        assert_eq!(accepted, 5);
        assert_eq!(folders.len(), 2);
        let commands = queue.drain();
        assert_eq!(commands.len(), 3);
        match &commands[0] {
            Command::Learn(event) => {
                assert_eq!(event.id, 3);
                assert_eq!(event.direction, Direction::Removed);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(matches!(commands[1], Command::Save));
        assert!(matches!(commands[2], Command::Reset));
    }
}
