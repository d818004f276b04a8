//! Phone price tracking across Turkish retailers.
//!
//! A [`coordinator::FetchCoordinator`] runs one [`scrapers::SourceScraper`] per
//! retailer. Each scraper acquires pages through an ordered
//! [`acquisition::StrategyChain`], extracts and normalizes phone records, and
//! reports progress to a [`traits::ProgressSink`].

pub mod acquisition;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod discord;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod scrapers;
pub mod specs;
pub mod tracker;
pub mod traits;
