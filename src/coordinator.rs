//! Runs every registered source scraper and merges their results.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::acquisition::StrategyChain;
use crate::config::AppConfig;
use crate::error::TrackerError;
use crate::models::{BatchOutcome, BatchStatus, PhoneRecord, ProgressState, Source, TrackerEvent};
use crate::progress::ProgressReporter;
use crate::scrapers::{SourceScraper, source_config};
use crate::traits::{PhoneScraper, PhoneStore, ProgressSink};

/// What one source task hands back.
struct SourceRun {
    source: Source,
    records: Vec<PhoneRecord>,
    state: ProgressState,
    panicked: bool,
}

pub struct FetchCoordinator {
    scrapers: Vec<Arc<dyn PhoneScraper>>,
    sink: Arc<dyn ProgressSink>,
    store: Option<Arc<dyn PhoneStore>>,
    max_concurrent: usize,
}

impl FetchCoordinator {
    /// Runs every scraper concurrently unless limited with
    /// [`with_max_concurrent`](Self::with_max_concurrent).
    pub fn new(scrapers: Vec<Arc<dyn PhoneScraper>>, sink: Arc<dyn ProgressSink>) -> Self {
        let max_concurrent = scrapers.len().max(1);
        Self {
            scrapers,
            sink,
            store: None,
            max_concurrent,
        }
    }

    /// Merged records are handed to `store` after each run.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn PhoneStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// One [`SourceScraper`] per configured source, all sharing one
    /// acquisition chain.
    pub fn from_config(config: &AppConfig, sink: Arc<dyn ProgressSink>) -> Result<Self, TrackerError> {
        let chain = Arc::new(StrategyChain::from_config(config)?);

        let scrapers = config
            .sources
            .iter()
            .map(|source| {
                let config = source_config(*source, config.max_items_per_source);
                SourceScraper::new(config, chain.clone())
                    .map(|scraper| Arc::new(scraper) as Arc<dyn PhoneScraper>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(scrapers, sink).with_max_concurrent(config.max_concurrent_sources))
    }

    pub fn sources(&self) -> Vec<Source> {
        self.scrapers.iter().map(|scraper| scraper.source()).collect()
    }

    pub async fn run_batch_update(&self, cancel: &CancellationToken) -> BatchOutcome {
        info!("Starting batch update for {} sources", self.scrapers.len());
        self.run(self.scrapers.clone(), cancel).await
    }

    /// Same semantics as a batch update, scoped to `source`.
    pub async fn run_source_update(&self, source: Source, cancel: &CancellationToken) -> BatchOutcome {
        let Some(scraper) = self.scrapers.iter().find(|s| s.source() == source) else {
            let message = format!("{source} is not a configured source");
            error!("{}", message);
            self.sink.publish(TrackerEvent::Batch {
                status: BatchStatus::Error,
                message: message.clone(),
                total_count: 0,
            });
            return BatchOutcome {
                status: BatchStatus::Error,
                total_count: 0,
                stored_count: 0,
                message,
                warning: None,
                sources: BTreeMap::new(),
                records: Vec::new(),
            };
        };

        info!("Starting update for {}", source);
        self.run(vec![scraper.clone()], cancel).await
    }

    async fn run(&self, scrapers: Vec<Arc<dyn PhoneScraper>>, cancel: &CancellationToken) -> BatchOutcome {
        self.sink.publish(TrackerEvent::Batch {
            status: BatchStatus::Started,
            message: format!("Updating {} sources", scrapers.len()),
            total_count: 0,
        });

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for scraper in scrapers {
            let semaphore = semaphore.clone();
            let sink = self.sink.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let source = scraper.source();
                let mut progress = ProgressReporter::new(source, sink, cancel);

                let result = AssertUnwindSafe(scraper.scrape_all(&mut progress))
                    .catch_unwind()
                    .await;

                match result {
                    Ok(records) => SourceRun {
                        source,
                        records,
                        state: progress.into_state(),
                        panicked: false,
                    },
                    Err(panic) => {
                        let reason = panic_message(panic.as_ref());
                        error!("{} scraper panicked: {}", source, reason);
                        progress.fail(format!("{source} scraper crashed: {reason}"));
                        SourceRun {
                            source,
                            records: Vec::new(),
                            state: progress.into_state(),
                            panicked: true,
                        }
                    }
                }
            });
        }

        let mut runs = BTreeMap::new();
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(run) => {
                    if run.panicked {
                        failures.push(format!("{} scraper crashed", run.source));
                    }
                    runs.insert(run.source, run);
                }
                Err(e) => {
                    error!("Source task failed to complete: {}", e);
                    failures.push(format!("source task failed: {e}"));
                }
            }
        }

        // Partitioned per source, merged in source order
        let mut records = Vec::new();
        let mut sources = BTreeMap::new();
        for (source, run) in runs {
            info!("{}: {} phones", source, run.records.len());
            records.extend(run.records);
            sources.insert(source, run.state);
        }
        let total_count = records.len();

        let stored_count = match self.persist(&records).await {
            Ok(stored) => stored,
            Err(e) => {
                failures.push(format!("{e:#}"));
                0
            }
        };

        let warning = if cancel.is_cancelled() {
            Some("Update cancelled, partial results kept".to_string())
        } else if total_count == 0 {
            Some("No phone data could be collected from any source".to_string())
        } else {
            None
        };

        let (status, message) = if failures.is_empty() {
            (
                BatchStatus::Completed,
                format!("{total_count} phones collected from {} sources", sources.len()),
            )
        } else {
            (BatchStatus::Error, failures.join("; "))
        };

        match status {
            BatchStatus::Error => error!("Update failed: {}", message),
            _ => info!("Update finished: {}", message),
        }
        if let Some(warning) = &warning {
            warn!("{}", warning);
        }

        self.sink.publish(TrackerEvent::Batch {
            status,
            message: message.clone(),
            total_count,
        });

        BatchOutcome {
            status,
            total_count,
            stored_count,
            message,
            warning,
            sources,
            records,
        }
    }

    /// Stores every record; individual failures are logged and skipped.
    ///
    /// Fails only when records exist and none of them could be stored.
    pub async fn persist(&self, records: &[PhoneRecord]) -> anyhow::Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let mut stored = 0;
        let mut last_error = None;
        for record in records {
            match store.add_phone(record).await {
                Ok(id) => {
                    stored += 1;
                    debug!("Stored {} as {}", record.model(), id);
                }
                Err(e) => {
                    warn!("Failed to store {} from {}: {:#}", record.model(), record.source(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if stored == 0 => Err(e.context("persisting records failed")),
            _ => Ok(stored),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
