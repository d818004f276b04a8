use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::coordinator::FetchCoordinator;
use crate::database::Database;
use crate::discord::DiscordNotifier;
use crate::models::{BatchOutcome, PhoneRecord, Source};
use crate::traits::{PhoneStore, ProgressSink};

/// Wires the coordinator to storage and alerting.
#[derive(Clone)]
pub struct PhoneTracker {
    coordinator: Arc<FetchCoordinator>,
    database: Database,
    discord: DiscordNotifier,
}

impl PhoneTracker {
    pub async fn new(config: &AppConfig, sink: Arc<dyn ProgressSink>) -> Result<Self> {
        let database = Database::new(&config.database_url).await?;
        let coordinator = FetchCoordinator::from_config(config, sink)?
            .with_store(Arc::new(database.clone()));
        let discord = DiscordNotifier::new(config.discord_webhook_url.clone());

        Ok(Self::from_parts(coordinator, database, discord))
    }

    pub fn from_parts(coordinator: FetchCoordinator, database: Database, discord: DiscordNotifier) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            database,
            discord,
        }
    }

    pub async fn update_all(&self, cancel: &CancellationToken) -> Result<BatchOutcome> {
        let outcome = self.coordinator.run_batch_update(cancel).await;
        self.after_run(&outcome).await?;
        Ok(outcome)
    }

    pub async fn update_source(&self, source: Source, cancel: &CancellationToken) -> Result<BatchOutcome> {
        let outcome = self.coordinator.run_source_update(source, cancel).await;
        self.after_run(&outcome).await?;
        Ok(outcome)
    }

    async fn after_run(&self, outcome: &BatchOutcome) -> Result<()> {
        info!(
            "Update finished: {} phones found, {} stored",
            outcome.total_count, outcome.stored_count
        );

        // Drops are read from stored history
        if outcome.stored_count > 0 {
            let drops = self.alert_price_drops(&outcome.records).await?;
            if drops > 0 {
                info!("Found {} price drops", drops);
            }
        }

        if let Err(e) = self.discord.send_batch_summary(outcome).await {
            warn!("Could not send update summary: {:#}", e);
        }
        Ok(())
    }

    /// Sends an alert for every record whose price fell below the previous
    /// price recorded for the same model at the same source.
    pub async fn alert_price_drops(&self, records: &[PhoneRecord]) -> Result<usize> {
        let mut drops = 0;

        for record in records {
            let Some(previous) = self.previous_price(record).await? else {
                continue;
            };

            if record.price() < previous && !record.price().is_zero() {
                info!(
                    "Price drop for {} at {}: {} -> {}",
                    record.model(),
                    record.source(),
                    previous,
                    record.price()
                );
                if let Err(e) = self.discord.send_price_drop(record, previous).await {
                    warn!("Could not send price drop alert: {:#}", e);
                }
                drops += 1;
            }
        }

        Ok(drops)
    }

    /// The price recorded before the latest one, if any.
    async fn previous_price(&self, record: &PhoneRecord) -> Result<Option<Decimal>> {
        let history = self.database.get_price_history(record.model()).await?;
        let mut prices = history
            .iter()
            .rev()
            .filter(|point| point.source == record.source())
            .map(|point| point.price);

        // Newest entry is the one just stored
        prices.next();
        Ok(prices.next())
    }
}
