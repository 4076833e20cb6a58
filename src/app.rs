use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{
    io::{stdin, BufReader},
    task::JoinHandle,
    time::timeout,
};
use tokio_cron_scheduler::JobScheduler;

use crate::{
    classifier::Classifier,
    config::AppConfig,
    domain::FolderDirectory,
    infrastructure::{
        directories::ResolvedPaths,
        move_sink::{MoveSink, StdoutMoveSink},
        shutdown::Shutdown,
    },
    intake::Intake,
    tasks::{
        processor::{join_processor, MessageProcessor},
        queue::{Command, CommandQueue},
        scheduler::{configure_save_jobs, SaveCallback},
    },
};

pub struct AutofileApp {
    paths: ResolvedPaths,
    scheduler: JobScheduler,
    processor_handle: JoinHandle<()>,
    queue: Arc<CommandQueue<Command>>,
    intake: Intake,
    classifier: Arc<Classifier>,
    shutdown: Shutdown,
}

impl AutofileApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let classifier = Arc::new(Classifier::new(&config.classifier, &paths.snapshot_path));

        if let Err(err) = classifier.load() {
            tracing::warn!(
                target: "snapshot",
                error = %err,
                path = %paths.snapshot_path.display(),
                "failed to load classifier data"
            );
            classifier.start_empty();
        }

        let folders = Arc::new(FolderDirectory::new());
        let queue = Arc::new(CommandQueue::<Command>::new());
        let sink: Arc<dyn MoveSink> = Arc::new(StdoutMoveSink);

        let processor = MessageProcessor::new(
            queue.clone(),
            classifier.clone(),
            folders.clone(),
            sink,
            config.clone(),
        );
        let processor_handle = processor.spawn(shutdown.subscribe());

        let save_callback: SaveCallback = {
            let queue = queue.clone();
            Arc::new(move || queue.push(Command::Save))
        };
        let scheduler = configure_save_jobs(&config.scheduler.save_crons, save_callback).await?;

        let intake = Intake::new(folders, queue.clone());

        Ok(Self {
            paths,
            scheduler,
            processor_handle,
            queue,
            intake,
            classifier,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let AutofileApp {
            paths,
            mut scheduler,
            processor_handle,
            queue,
            intake,
            classifier,
            shutdown,
        } = self;

        tracing::info!(
            target: "lifecycle",
            enabled = classifier.is_enabled(),
            snapshot = %paths.snapshot_path.display(),
            "mail autofile started"
        );

        let mut intake_listener = shutdown.subscribe();
        match intake.run(BufReader::new(stdin()), &mut intake_listener).await {
            Ok(_) => shutdown.trigger("end of input"),
            Err(err) => {
                tracing::error!(target: "intake", error = %err, "input failed");
                shutdown.trigger("input error");
            }
        }

        let shutdown_timeout = Duration::from_secs(5);

        match timeout(shutdown_timeout, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(target: "scheduler", ?err, "scheduler shutdown failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    shutdown_timeout
                );
            }
        }

        tracing::info!(
            target: "processor",
            queued = queue.len(),
            "draining queued messages; interrupt again to abort"
        );
        let force_stop = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        if !join_processor(processor_handle, force_stop).await {
            tracing::warn!(target: "processor", "queued messages discarded");
        }

        let saver = classifier.clone();
        match tokio::task::spawn_blocking(move || saver.save()).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                tracing::error!(target: "snapshot", error = %err, "final save failed");
            }
            Err(err) => {
                tracing::error!(target: "snapshot", error = %err, "final save task failed");
            }
        }

        tracing::info!(target: "lifecycle", "mail autofile stopped");
        Ok(())
    }
}
