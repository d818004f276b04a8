//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;

use phone_tracker::acquisition::{DirectFetch, StrategyChain, build_http_client};
use phone_tracker::models::{PhoneRecord, PricePoint, ProgressEvent, Source, SpecSet, TrackerEvent};
use phone_tracker::progress::ProgressReporter;
use phone_tracker::traits::{AcquisitionStrategy, PhoneScraper, PhoneStore, ProgressSink};

/// Records every published event.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<TrackerEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_for(&self, source: Source) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TrackerEvent::Progress(progress) if progress.source == source => Some(progress),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for CollectingSink {
    fn publish(&self, event: TrackerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// In-memory store that can be told to reject every write.
#[derive(Default)]
pub struct MemoryStore {
    pub phones: Mutex<Vec<PhoneRecord>>,
    pub reject_writes: bool,
}

#[async_trait]
impl PhoneStore for MemoryStore {
    async fn add_phone(&self, record: &PhoneRecord) -> Result<String> {
        if self.reject_writes {
            bail!("disk full");
        }
        self.phones.lock().unwrap().push(record.clone());
        Ok(record.id())
    }

    async fn get_phones(&self, limit: usize) -> Result<Vec<PhoneRecord>> {
        Ok(self.phones.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn get_price_history(&self, model: &str) -> Result<Vec<PricePoint>> {
        Ok(self
            .phones
            .lock()
            .unwrap()
            .iter()
            .filter(|phone| phone.model() == model)
            .map(|phone| PricePoint {
                price: phone.price(),
                date: chrono::Utc::now(),
                source: phone.source(),
            })
            .collect())
    }
}

/// Scraper returning a fixed number of records.
pub struct FixedScraper {
    pub source: Source,
    pub count: usize,
}

#[async_trait]
impl PhoneScraper for FixedScraper {
    fn source(&self) -> Source {
        self.source
    }

    async fn scrape_all(&self, progress: &mut ProgressReporter) -> Vec<PhoneRecord> {
        progress.start();
        let records: Vec<PhoneRecord> = (0..self.count)
            .map(|i| phone(&format!("Samsung Galaxy A{}", 10 + i), 10_000 + i as i64, self.source))
            .collect();
        for i in 0..self.count {
            progress.report(i + 1, self.count, None, None);
        }
        progress.complete(records.len());
        records
    }
}

/// Tracks how many scrapers are inside `scrape_all` at once.
#[derive(Default)]
pub struct RunningGauge {
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl RunningGauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scraper that holds its slot for a while and reports into a shared gauge.
pub struct SlowScraper {
    pub source: Source,
    pub gauge: Arc<RunningGauge>,
}

#[async_trait]
impl PhoneScraper for SlowScraper {
    fn source(&self) -> Source {
        self.source
    }

    async fn scrape_all(&self, progress: &mut ProgressReporter) -> Vec<PhoneRecord> {
        self.gauge.enter();
        progress.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        progress.complete(1);
        self.gauge.leave();
        vec![phone("Apple iPhone 15", 44_999, self.source)]
    }
}

/// Scraper that panics mid-run.
pub struct PanickingScraper(pub Source);

#[async_trait]
impl PhoneScraper for PanickingScraper {
    fn source(&self) -> Source {
        self.0
    }

    async fn scrape_all(&self, progress: &mut ProgressReporter) -> Vec<PhoneRecord> {
        progress.start();
        progress.report(10, 100, None, None);
        panic!("listing parser exploded");
    }
}

pub fn phone(model: &str, price: i64, source: Source) -> PhoneRecord {
    PhoneRecord::new(model, Decimal::from(price), SpecSet::default(), source, None)
}

/// Chain with only a direct fetch, short timeout.
pub fn direct_chain() -> Arc<StrategyChain> {
    let client = build_http_client(5).unwrap();
    let strategies: Vec<Arc<dyn AcquisitionStrategy>> = vec![Arc::new(DirectFetch::new(client))];
    Arc::new(StrategyChain::new(strategies))
}
