use std::io::{self, Write};

use parking_lot::Mutex;

use crate::domain::MoveAction;

/// Receiver of move actions decided by the processor. Executing the move is up to it.
pub trait MoveSink: Send + Sync {
    fn queue_move(&self, action: MoveAction) -> io::Result<()>;
}

/// Writes each action as one JSON line on stdout.
#[derive(Debug, Default)]
pub struct StdoutMoveSink;

impl MoveSink for StdoutMoveSink {
    fn queue_move(&self, action: MoveAction) -> io::Result<()> {
        let line = serde_json::to_string(&action)?;
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

/// Keeps actions in memory.
#[derive(Debug, Default)]
pub struct RecordingMoveSink {
    actions: Mutex<Vec<MoveAction>>,
}

impl RecordingMoveSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<MoveAction> {
        std::mem::take(&mut *self.actions.lock())
    }
}

impl MoveSink for RecordingMoveSink {
    fn queue_move(&self, action: MoveAction) -> io::Result<()> {
        self.actions.lock().push(action);
        Ok(())
    }
}
