use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use phone_tracker::config::load_app_config;
use phone_tracker::models::Source;
use phone_tracker::progress::{ChannelSink, LogSink};
use phone_tracker::tracker::PhoneTracker;
use phone_tracker::traits::ProgressSink;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting phone price tracker");

    let config = load_app_config()?;

    // Progress events are forwarded to the log
    let (sink, mut events) = ChannelSink::new();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            LogSink.publish(event);
        }
    });

    let tracker = PhoneTracker::new(&config, Arc::new(sink)).await?;
    let cancel = CancellationToken::new();

    // `phone-tracker <source>` updates one source and exits
    if let Some(name) = std::env::args().nth(1) {
        let source: Source = name.parse()?;
        let outcome = tracker.update_source(source, &cancel).await?;
        info!("{}", outcome.message);
        if outcome.is_error() {
            anyhow::bail!(outcome.message);
        }
        return Ok(());
    }

    // Run once immediately
    if let Err(e) = tracker.update_all(&cancel).await {
        error!("Error during initial update: {:#}", e);
    }

    let sched = JobScheduler::new().await?;

    let job_tracker = tracker.clone();
    let job_cancel = cancel.clone();
    sched
        .add(Job::new_async(config.update_schedule.as_str(), move |_uuid, _l| {
            let tracker = job_tracker.clone();
            let cancel = job_cancel.clone();
            Box::pin(async move {
                if let Err(e) = tracker.update_all(&cancel).await {
                    error!("Error updating prices: {:#}", e);
                }
            })
        })?)
        .await?;

    info!("Scheduler started - updating on \"{}\"", config.update_schedule);
    sched.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    cancel.cancel();

    Ok(())
}
