//! Data models for phone records, progress reporting and Discord webhook payloads

mod progress;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

pub use progress::{
    BatchOutcome, BatchStatus, EmptyReason, ProgressEvent, ProgressState, ProgressStatus,
    TrackerEvent,
};

/// A retailer catalog being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    MediaMarkt,
    Teknosa,
    Vatan,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::MediaMarkt, Source::Teknosa, Source::Vatan];

    /// Stable identifier used in URLs, config and storage.
    pub fn id(self) -> &'static str {
        match self {
            Source::MediaMarkt => "mediamarkt",
            Source::Teknosa => "teknosa",
            Source::Vatan => "vatan",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Source::MediaMarkt => "MediaMarkt",
            Source::Teknosa => "Teknosa",
            Source::Vatan => "Vatan Bilgisayar",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Source {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| {
                source.id() == wanted || source.display_name().to_lowercase() == wanted
            })
            .ok_or_else(|| TrackerError::UnknownSource(s.to_string()))
    }
}

/// One recognized key of a [`SpecSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecField {
    Processor,
    RamAndStorage,
    Screen,
    BatteryAndCharging,
    DisplayBodyRatio,
    FrontCamera,
    RearCameras,
    AdditionalFeatures,
    NetworkConnectivity,
}

impl SpecField {
    pub const ALL: [SpecField; 9] = [
        SpecField::Processor,
        SpecField::RamAndStorage,
        SpecField::Screen,
        SpecField::BatteryAndCharging,
        SpecField::DisplayBodyRatio,
        SpecField::FrontCamera,
        SpecField::RearCameras,
        SpecField::AdditionalFeatures,
        SpecField::NetworkConnectivity,
    ];
}

/// Canonical technical specification of a phone.
///
/// Every key is always present; a value that could not be extracted is the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecSet {
    pub processor: String,
    pub ram_and_storage: String,
    pub screen: String,
    pub battery_and_charging: String,
    pub display_body_ratio: String,
    pub front_camera: String,
    pub rear_cameras: String,
    pub additional_features: String,
    pub network_connectivity: String,
}

impl SpecSet {
    pub fn get(&self, field: SpecField) -> &str {
        match field {
            SpecField::Processor => &self.processor,
            SpecField::RamAndStorage => &self.ram_and_storage,
            SpecField::Screen => &self.screen,
            SpecField::BatteryAndCharging => &self.battery_and_charging,
            SpecField::DisplayBodyRatio => &self.display_body_ratio,
            SpecField::FrontCamera => &self.front_camera,
            SpecField::RearCameras => &self.rear_cameras,
            SpecField::AdditionalFeatures => &self.additional_features,
            SpecField::NetworkConnectivity => &self.network_connectivity,
        }
    }

    pub fn set(&mut self, field: SpecField, value: impl Into<String>) {
        let slot = match field {
            SpecField::Processor => &mut self.processor,
            SpecField::RamAndStorage => &mut self.ram_and_storage,
            SpecField::Screen => &mut self.screen,
            SpecField::BatteryAndCharging => &mut self.battery_and_charging,
            SpecField::DisplayBodyRatio => &mut self.display_body_ratio,
            SpecField::FrontCamera => &mut self.front_camera,
            SpecField::RearCameras => &mut self.rear_cameras,
            SpecField::AdditionalFeatures => &mut self.additional_features,
            SpecField::NetworkConnectivity => &mut self.network_connectivity,
        };
        *slot = value.into();
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        SpecField::ALL
            .iter()
            .all(|field| self.get(*field).trim().is_empty())
    }
}

/// Installment offer parsed from text such as `"12 x 208,25 TL"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub count: u32,
    pub amount: Decimal,
}

impl Installment {
    pub const NONE: Installment = Installment {
        count: 0,
        amount: Decimal::ZERO,
    };
}

impl Default for Installment {
    fn default() -> Self {
        Self::NONE
    }
}

/// A phone listing extracted from one source.
///
/// Built once per successful extraction and handed to the persistence layer
/// by value. The brand is always derived from the model and the price is
/// never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneRecord {
    model: String,
    brand: String,
    price: Decimal,
    specs: SpecSet,
    source: Source,
    source_url: Option<String>,
    installment: Installment,
}

impl PhoneRecord {
    pub fn new(
        model: impl Into<String>,
        price: Decimal,
        specs: SpecSet,
        source: Source,
        source_url: Option<String>,
    ) -> Self {
        let model = model.into().trim().to_string();
        let brand = derive_brand(&model);

        Self {
            model,
            brand,
            price: price.max(Decimal::ZERO),
            specs,
            source,
            source_url,
            installment: Installment::NONE,
        }
    }

    #[must_use]
    pub fn with_installment(mut self, installment: Installment) -> Self {
        self.installment = installment;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn specs(&self) -> &SpecSet {
        &self.specs
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn installment(&self) -> Installment {
        self.installment
    }

    /// Storage key: one row per model and source.
    pub fn id(&self) -> String {
        format!(
            "{:x}",
            md5::compute(format!("{}:{}", self.source.id(), self.model))
        )
    }
}

/// First whitespace-separated token of a multi-word model name, else empty.
pub fn derive_brand(model: &str) -> String {
    model
        .trim()
        .split_once(char::is_whitespace)
        .map(|(brand, _)| brand.to_string())
        .unwrap_or_default()
}

/// One entry of a phone's recorded price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub price: Decimal,
    pub date: DateTime<Utc>,
    pub source: Source,
}

/// Raw data produced by a successful acquisition attempt.
#[derive(Debug, Clone)]
pub enum Payload {
    /// An HTML document, fetched directly or rendered headlessly.
    Document { url: String, html: String },
    /// Output of the remote extraction service.
    Extracted(RemotePage),
}

/// Content returned by the remote extraction service for one URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemotePage {
    pub links: Vec<String>,
    pub markdown: Option<String>,
    pub html: Option<String>,
    pub json: Option<serde_json::Value>,
}

/// Discord embed structure for rich notifications
#[derive(Debug, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    pub timestamp: String,
    pub fields: Vec<DiscordField>,
}

/// Key-value field for Discord embeds
#[derive(Debug, Serialize)]
pub struct DiscordField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Discord webhook message payload
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    pub embeds: Vec<DiscordEmbed>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_is_first_token_of_multi_word_model() {
        assert_eq!(derive_brand("Samsung Galaxy A55"), "Samsung");
        assert_eq!(derive_brand("  Apple iPhone 15 "), "Apple");
    }

    #[test]
    fn brand_is_empty_for_single_token_or_blank_model() {
        assert_eq!(derive_brand("Pixel"), "");
        assert_eq!(derive_brand(""), "");
    }

    #[test]
    fn record_clamps_negative_price_to_zero() {
        let record = PhoneRecord::new(
            "Xiaomi Redmi Note 13",
            Decimal::new(-100, 0),
            SpecSet::default(),
            Source::Vatan,
            None,
        );
        assert_eq!(record.price(), Decimal::ZERO);
        assert_eq!(record.brand(), "Xiaomi");
    }

    #[test]
    fn record_id_is_stable_per_source_and_model() {
        let a = PhoneRecord::new("Apple iPhone 15", Decimal::ONE, SpecSet::default(), Source::Teknosa, None);
        let b = PhoneRecord::new("Apple iPhone 15", Decimal::TEN, SpecSet::default(), Source::Teknosa, None);
        let c = PhoneRecord::new("Apple iPhone 15", Decimal::ONE, SpecSet::default(), Source::Vatan, None);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn source_parses_from_id_or_display_name() {
        assert_eq!("vatan".parse::<Source>().unwrap(), Source::Vatan);
        assert_eq!("Vatan Bilgisayar".parse::<Source>().unwrap(), Source::Vatan);
        assert_eq!("MEDIAMARKT".parse::<Source>().unwrap(), Source::MediaMarkt);
        assert!("hepsiburada".parse::<Source>().is_err());
    }

    #[test]
    fn spec_set_empty_only_when_every_field_blank() {
        let mut specs = SpecSet::default();
        assert!(specs.is_empty());
        specs.set(SpecField::FrontCamera, "32MP");
        assert!(!specs.is_empty());
        assert_eq!(specs.get(SpecField::FrontCamera), "32MP");
    }
}
