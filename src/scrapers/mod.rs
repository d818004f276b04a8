//! Generic per-source scraping pipeline.
//!
//! Every retailer runs through the same [`SourceScraper`]; what differs
//! between them lives in its [`SourceConfig`] (see [`sources`]).

mod sources;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::acquisition::StrategyChain;
use crate::error::{AcquisitionError, TrackerError};
use crate::models::{
    EmptyReason, Installment, Payload, PhoneRecord, RemotePage, Source, SpecSet,
};
use crate::normalize::{extract_installment, normalize_price, price_from_json};
use crate::progress::ProgressReporter;
use crate::specs::{
    SpecExtractor, element_text, json_text, parse_selector, specs_from_structured,
    synthesize_specs,
};
use crate::traits::{PhoneScraper, SlugStyle, SourceConfig, Target};

pub use sources::source_config;

/// Share of the progress bar used by listing discovery.
const LISTING_PHASE_END: usize = 10;
/// Share of the progress bar used by detail extraction, after listing.
const DETAIL_PHASE_SPAN: usize = 60;

/// A product link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// Provisional model name read from the URL slug
    pub name: String,
}

/// Listing-to-records pipeline for one source.
pub struct SourceScraper {
    config: SourceConfig,
    chain: Arc<StrategyChain>,
    product_link: Selector,
    name: Selector,
    price: Selector,
    installment: Option<Selector>,
    specs: SpecExtractor,
}

impl SourceScraper {
    pub fn new(config: SourceConfig, chain: Arc<StrategyChain>) -> Result<Self, TrackerError> {
        let selectors = &config.selectors;
        let product_link = parse_selector(&selectors.product_link)?;
        let name = parse_selector(&selectors.name)?;
        let price = parse_selector(&selectors.price)?;
        let installment = selectors
            .installment
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        let specs = SpecExtractor::new(&selectors.spec_layout, config.labels.clone())?;

        Ok(Self {
            config,
            chain,
            product_link,
            name,
            price,
            installment,
            specs,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Product candidates from the listing page.
    ///
    /// A strategy whose payload holds no matching product link counts as a
    /// failed attempt.
    pub async fn discover(&self) -> Result<Vec<Candidate>, AcquisitionError> {
        let target = Target::listing(self.config.listing_url());
        info!("Discovering {} products at {}", self.config.source, target.url);

        self.chain
            .acquire_usable(&target, |payload| {
                let candidates = self.candidates_from(&payload);
                if candidates.is_empty() {
                    Err(AcquisitionError::unusable(
                        &target.url,
                        "no product links matched",
                    ))
                } else {
                    Ok(candidates)
                }
            })
            .await
    }

    /// Builds a record for one candidate, trying strategies until one yields
    /// a usable detail page.
    pub async fn fetch_details(&self, candidate: &Candidate) -> Result<PhoneRecord, AcquisitionError> {
        let target = Target::detail(candidate.url.clone());
        self.chain
            .acquire_usable(&target, |payload| self.record_from(payload, candidate))
            .await
    }

    /// Absolute, filtered, de-duplicated and capped product links.
    pub fn candidates_from(&self, payload: &Payload) -> Vec<Candidate> {
        let hrefs = match payload {
            Payload::Document { html, .. } => self.links_in(html),
            Payload::Extracted(RemotePage { links, html, .. }) => {
                let mut hrefs = links.clone();
                if let Some(html) = html {
                    hrefs.extend(self.links_in(html));
                }
                hrefs
            }
        };

        let mut seen = HashSet::new();
        hrefs
            .iter()
            .map(|href| self.config.absolute_url(href))
            .filter(|url| self.config.link_filter.matches(url))
            .filter(|url| seen.insert(url.clone()))
            .take(self.config.max_items)
            .map(|url| Candidate {
                name: slug_name(&url, self.config.slug_style),
                url,
            })
            .collect()
    }

    fn links_in(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.product_link)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    /// Converts a detail payload into a record, or rejects it as unusable.
    pub fn record_from(&self, payload: Payload, candidate: &Candidate) -> Result<PhoneRecord, AcquisitionError> {
        match payload {
            Payload::Document { html, .. } => self.record_from_document(&html, candidate),
            Payload::Extracted(RemotePage {
                json: Some(json), ..
            }) => self.record_from_structured(&json, candidate),
            Payload::Extracted(RemotePage {
                html: Some(html), ..
            }) => self.record_from_document(&html, candidate),
            Payload::Extracted(_) => Err(AcquisitionError::unusable(
                &candidate.url,
                "extraction returned neither json nor html",
            )),
        }
    }

    pub fn record_from_document(&self, html: &str, candidate: &Candidate) -> Result<PhoneRecord, AcquisitionError> {
        let document = Html::parse_document(html);

        let name = document.select(&self.name).next().map(element_text);
        let price_text = document.select(&self.price).next().map(element_text);
        if name.is_none() && price_text.is_none() {
            return Err(AcquisitionError::unusable(
                &candidate.url,
                "no product name or price on page",
            ));
        }

        let installment = self
            .installment
            .as_ref()
            .and_then(|selector| document.select(selector).next())
            .map(|element| extract_installment(&element_text(element)))
            .unwrap_or_default();

        Ok(self.assemble(
            pick_model(name.as_deref().unwrap_or_default(), candidate),
            normalize_price(price_text.as_deref()),
            self.specs.extract(&document),
            installment,
            candidate,
        ))
    }

    pub fn record_from_structured(&self, json: &Value, candidate: &Candidate) -> Result<PhoneRecord, AcquisitionError> {
        let mut name = json_text(json, &["name", "title"]);
        let brand = json_text(json, &["brand", "Brand"]);
        if !brand.is_empty()
            && !name.is_empty()
            && !name.to_lowercase().starts_with(&brand.to_lowercase())
        {
            name = format!("{brand} {name}");
        }

        let price = json.get("price").map(price_from_json).unwrap_or_default();
        if name.is_empty() && price.is_zero() {
            return Err(AcquisitionError::unusable(
                &candidate.url,
                "structured data has no name or price",
            ));
        }

        let installment = extract_installment(&json_text(json, &["installment", "installments"]));
        Ok(self.assemble(
            pick_model(&name, candidate),
            price,
            specs_from_structured(json),
            installment,
            candidate,
        ))
    }

    /// Builds the record, synthesizing specs when nothing was extracted.
    fn assemble(
        &self,
        model: String,
        price: Decimal,
        specs: SpecSet,
        installment: Installment,
        candidate: &Candidate,
    ) -> PhoneRecord {
        let specs = if specs.is_empty() {
            debug!("No specs extracted for {}, synthesizing", model);
            synthesize_specs(&model)
        } else {
            specs
        };

        PhoneRecord::new(
            model,
            price,
            specs,
            self.config.source,
            Some(candidate.url.clone()),
        )
        .with_installment(installment)
    }
}

/// Page name first, slug name as fallback.
fn pick_model(page_name: &str, candidate: &Candidate) -> String {
    if page_name.trim().is_empty() {
        candidate.name.clone()
    } else {
        page_name.trim().to_string()
    }
}

/// Provisional model name from the last path segment of a product URL.
pub fn slug_name(url: &str, style: SlugStyle) -> String {
    let segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    let part = match style {
        SlugStyle::WholeSegment => decoded.as_str(),
        SlugStyle::AfterLastUnderscore => decoded.rsplit('_').next().unwrap_or_default(),
    };
    let stem = part.strip_suffix(".html").unwrap_or(part);

    stem.split('-')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl PhoneScraper for SourceScraper {
    fn source(&self) -> Source {
        self.config.source
    }

    async fn scrape_all(&self, progress: &mut ProgressReporter) -> Vec<PhoneRecord> {
        let source = self.config.source;
        progress.start();
        progress.report(0, 100, None, Some(format!("Fetching {source} listing")));

        let candidates = match self.discover().await {
            Ok(candidates) => candidates,
            Err(e) => {
                let (reason, error) = match e {
                    AcquisitionError::Exhausted {
                        reachable: true, ..
                    } => (
                        EmptyReason::NoCandidates,
                        format!("No phone listings found on {source}"),
                    ),
                    e => (
                        EmptyReason::Unreachable,
                        format!("{source} could not be reached: {e}"),
                    ),
                };
                warn!("{}", error);
                progress.mark_empty(reason, error);
                progress.complete(0);
                return Vec::new();
            }
        };

        let total = candidates.len();
        info!("Found {} {} candidates", total, source);
        progress.report(
            LISTING_PHASE_END,
            100,
            None,
            Some(format!("{total} products found")),
        );

        let mut records = Vec::with_capacity(total);
        for (i, candidate) in candidates.iter().enumerate() {
            let skipped = match self.fetch_details(candidate).await {
                Ok(record) => {
                    debug!("{}: {} at {}", source, record.model(), record.price());
                    records.push(record);
                    None
                }
                Err(e) => {
                    warn!("Skipping {}: {}", candidate.url, e);
                    Some(format!("Could not read {}: {e}", candidate.name))
                }
            };

            let percent = LISTING_PHASE_END + (i + 1) * DETAIL_PHASE_SPAN / total;
            progress.report(percent, 100, skipped, None);

            if progress.is_cancelled() {
                warn!("{} run cancelled after {} of {} products", source, i + 1, total);
                progress.fail(format!("Cancelled after {} of {total} products", i + 1));
                return records;
            }
        }

        info!("Collected {} phones from {}", records.len(), source);
        progress.complete(records.len());
        records
    }
}
