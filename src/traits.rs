//! Traits and interfaces for site-agnostic scraping

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AcquisitionError;
use crate::models::{Payload, PhoneRecord, PricePoint, Source, TrackerEvent};
use crate::progress::ProgressReporter;
use crate::specs::{LabelTable, SpecLayout};

/// Configuration for one tracked retailer
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub source: Source,
    /// Base URL for the website, used to absolutize relative links
    pub base_url: String,
    /// Path of the phone category page below `base_url`
    pub listing_path: String,
    /// Which links on the listing page are product pages
    pub link_filter: LinkFilter,
    /// How a provisional model name is read out of a product URL
    pub slug_style: SlugStyle,
    pub selectors: SiteSelectors,
    /// Spec labels used by this website
    pub labels: LabelTable,
    /// Upper bound on product pages visited per run
    pub max_items: usize,
}

impl SourceConfig {
    pub fn listing_url(&self) -> String {
        self.absolute_url(&self.listing_path)
    }

    /// Resolves `href` against the base URL and drops query and fragment.
    pub fn absolute_url(&self, href: &str) -> String {
        let href = href.trim();
        let mut url = if href.starts_with("http") {
            href.to_string()
        } else if let Some(rest) = href.strip_prefix("//") {
            format!("https://{rest}")
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url.trim_end_matches('/'), href)
        } else {
            format!("{}/{}", self.base_url.trim_end_matches('/'), href)
        };

        if let Some(cut) = url.find(['?', '#']) {
            url.truncate(cut);
        }
        url
    }
}

/// CSS selectors for the listing and product pages
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Anchors on the listing page that may point at products
    pub product_link: String,
    /// Product name on the detail page
    pub name: String,
    /// Price on the detail page
    pub price: String,
    /// Installment offer text on the detail page (optional)
    pub installment: Option<String>,
    pub spec_layout: SpecLayout,
}

/// Predicate deciding whether a listing link is a product page.
///
/// All checks are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    /// Every fragment must appear
    pub required: Vec<String>,
    /// At least one fragment must appear (ignored when empty)
    pub any_of: Vec<String>,
    pub suffix: Option<String>,
}

impl LinkFilter {
    pub fn matches(&self, url: &str) -> bool {
        let url = url.to_lowercase();

        self.required.iter().all(|part| url.contains(&part.to_lowercase()))
            && (self.any_of.is_empty()
                || self.any_of.iter().any(|part| url.contains(&part.to_lowercase())))
            && self
                .suffix
                .as_ref()
                .is_none_or(|suffix| url.ends_with(&suffix.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugStyle {
    /// The whole last path segment names the product
    WholeSegment,
    /// Only the part after the last `_` of the last segment does
    AfterLastUnderscore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Listing,
    Detail,
}

/// A URL to acquire, and what kind of page it is.
#[derive(Debug, Clone)]
pub struct Target {
    pub url: String,
    pub kind: TargetKind,
}

impl Target {
    pub fn listing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: TargetKind::Listing,
        }
    }

    pub fn detail(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: TargetKind::Detail,
        }
    }
}

/// One way of obtaining page content.
///
/// A failed attempt must leave no state behind; the chain simply moves on.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn acquire(&self, target: &Target) -> Result<Payload, AcquisitionError>;
}

/// A per-site scraper run by the coordinator.
#[async_trait]
pub trait PhoneScraper: Send + Sync {
    fn source(&self) -> Source;

    /// Scrapes every candidate product of the source.
    ///
    /// Failures are reported through `progress`, never returned.
    async fn scrape_all(&self, progress: &mut ProgressReporter) -> Vec<PhoneRecord>;
}

/// Sink for extracted phones.
#[async_trait]
pub trait PhoneStore: Send + Sync {
    /// Stores a record and returns its id.
    async fn add_phone(&self, record: &PhoneRecord) -> Result<String>;

    /// Most recently updated phones first.
    async fn get_phones(&self, limit: usize) -> Result<Vec<PhoneRecord>>;

    /// Recorded prices for a model, oldest first.
    async fn get_price_history(&self, model: &str) -> Result<Vec<PricePoint>>;
}

/// Observer of progress and batch status. Delivery is fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, event: TrackerEvent);
}
