use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::sleep};

use crate::{
    classifier::Classifier,
    config::AppConfig,
    domain::{Folder, FolderDirectory, FolderType, MessageEvent, MoveAction},
    infrastructure::{move_sink::MoveSink, shutdown::ShutdownListener},
    tasks::queue::{Command, CommandQueue},
};

const IDLE_POLL: Duration = Duration::from_millis(200);

#[derive(Clone)]
pub struct MessageProcessor {
    queue: Arc<CommandQueue<Command>>,
    classifier: Arc<Classifier>,
    folders: Arc<FolderDirectory>,
    sink: Arc<dyn MoveSink>,
    config: Arc<AppConfig>,
}

impl MessageProcessor {
    pub fn new(
        queue: Arc<CommandQueue<Command>>,
        classifier: Arc<Classifier>,
        folders: Arc<FolderDirectory>,
        sink: Arc<dyn MoveSink>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            queue,
            classifier,
            folders,
            sink,
            config,
        }
    }

    /// Runs until shutdown, then drains what is still queued.
    pub fn spawn(self, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(&mut shutdown).await;
        })
    }

    async fn run_loop(&self, shutdown: &mut ShutdownListener) {
        loop {
            let batch = self.queue.drain();
            if batch.is_empty() {
                if shutdown.is_triggered() {
                    break;
                }
                tokio::select! {
                    _ = sleep(IDLE_POLL) => {}
                    _ = shutdown.notified() => {}
                }
                continue;
            }

            let processor = self.clone();
            if let Err(err) = tokio::task::spawn_blocking(move || processor.handle_batch(batch)).await {
                tracing::error!(target: "processor", error = %err, "batch task failed");
            }
        }
        tracing::info!(target: "processor", "message processor stopped");
    }

    pub fn handle_batch(&self, batch: Vec<Command>) {
        tracing::debug!(target: "processor", total = batch.len(), "processing batch");
        for command in batch {
            match command {
                Command::Learn(event) => {
                    self.process_event(&event);
                }
                Command::Save => self.save(),
                Command::Reset => self.classifier.clear(),
            }
        }
    }

    pub fn save(&self) {
        match self.classifier.save() {
            Ok(true) => {}
            Ok(false) => tracing::debug!(target: "processor", "classifier unchanged; save skipped"),
            Err(err) => {
                tracing::error!(target: "processor", error = %err, "failed to save classifier data")
            }
        }
    }

    /// Learns from the event and queues a move when the prediction calls for one.
    pub fn process_event(&self, event: &MessageEvent) -> Option<MoveAction> {
        if !self.classifier.is_enabled() {
            return None;
        }

        let Some(folder) = self.folders.get(event.account, &event.folder) else {
            tracing::debug!(
                target: "processor",
                account = event.account,
                folder = %event.folder,
                "unknown folder; message ignored"
            );
            return None;
        };
        if !folder.folder_type.can_classify() {
            return None;
        }

        let text = event.assemble_text();
        if text.is_empty() {
            return None;
        }

        let classified =
            self.classifier
                .classify(event.account, &folder.name, &text, event.direction);

        tracing::info!(
            target: "classifier",
            folder = %folder.name,
            message = event.id,
            received = %self.format_received(event.received),
            subject = event.subject.as_deref().unwrap_or_default(),
            class = ?classified,
            re = event.auto_classified,
            "message classified"
        );

        let target = classified?;
        if event.auto_classified {
            return None;
        }

        let action = self.move_action(event, &folder, &target)?;
        if let Err(err) = self.sink.queue_move(action.clone()) {
            tracing::error!(
                target: "processor",
                error = %err,
                message = event.id,
                to = %action.to_folder,
                "failed to queue move"
            );
            return None;
        }

        tracing::info!(
            target: "processor",
            account = action.account,
            message = action.message,
            from = %action.from_folder,
            to = %action.to_folder,
            "move queued"
        );
        Some(action)
    }

    fn move_action(&self, event: &MessageEvent, folder: &Folder, target: &str) -> Option<MoveAction> {
        let target = self.folders.get(event.account, target)?;
        let entitled =
            target.folder_type == FolderType::Junk || self.config.classifier.move_to_user_folders;
        let allowed = target.auto_classify
            && target.name != folder.name
            && folder.folder_type != FolderType::Junk
            && entitled;
        if !allowed {
            tracing::debug!(
                target: "processor",
                message = event.id,
                to = %target.name,
                auto_classify = target.auto_classify,
                entitled,
                "move not allowed"
            );
            return None;
        }

        Some(MoveAction {
            account: event.account,
            message: event.id,
            from_folder: folder.name.clone(),
            to_folder: target.name,
            hide: true,
        })
    }

    fn format_received(&self, received: DateTime<Utc>) -> String {
        received
            .with_timezone(&self.config.timezone)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// Waits until the processor has worked through its queue.
///
/// Resolving `force_stop` first aborts the processor and returns false. A batch
/// already running on the blocking pool is not interrupted.
pub async fn join_processor<F>(mut handle: JoinHandle<()>, force_stop: F) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        res = &mut handle => {
            if let Err(err) = res {
                if err.is_panic() {
                    tracing::error!(target: "processor", "message processor panicked");
                }
            }
            true
        }
        _ = force_stop => {
            tracing::warn!(target: "processor", "message processor stop forced; aborting");
            handle.abort();
            false
        }
    }
}
