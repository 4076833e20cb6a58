use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

pub type SaveCallback = Arc<dyn Fn() + Send + Sync>;

/// Registers one job per cron spec that requests a snapshot save.
pub async fn configure_save_jobs(
    cron_specs: &[String],
    callback: SaveCallback,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let label = spec.clone();
        let cb = callback.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let cb = cb.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::debug!(target: "scheduler", cron = %cron_label, "save job triggered");
                cb();
            })
        })
        .with_context(|| format!("invalid save cron {spec:?}"))?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "save job registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}
