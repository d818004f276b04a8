//! In-memory filtering and sorting of phone records.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{PhoneRecord, Source};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Model,
    Brand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Search criteria. Empty collections and strings match everything.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhoneQuery {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub brands: Vec<String>,
    pub sources: Vec<Source>,
    /// Minimum RAM, e.g. `"8GB"`
    pub ram: String,
    /// Minimum storage, e.g. `"256GB"`
    pub storage: String,
    pub keyword: String,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

impl Default for PhoneQuery {
    fn default() -> Self {
        Self {
            min_price: Decimal::ZERO,
            max_price: Decimal::from(100_000),
            brands: Vec::new(),
            sources: Vec::new(),
            ram: String::new(),
            storage: String::new(),
            keyword: String::new(),
            sort_by: SortKey::default(),
            order: SortOrder::default(),
        }
    }
}

impl PhoneQuery {
    pub fn matches(&self, phone: &PhoneRecord) -> bool {
        let price = phone.price();
        if price < self.min_price || price > self.max_price {
            return false;
        }

        if !self.brands.is_empty() {
            let first_word = phone.model().split(' ').next().unwrap_or_default().to_lowercase();
            if !self.brands.iter().any(|brand| brand.to_lowercase() == first_word) {
                return false;
            }
        }

        if !self.sources.is_empty() && !self.sources.contains(&phone.source()) {
            return false;
        }

        let ram_and_storage = &phone.specs().ram_and_storage;
        if !matches_ram_filter(ram_and_storage, &self.ram)
            || !matches_storage_filter(ram_and_storage, &self.storage)
        {
            return false;
        }

        self.keyword.trim().is_empty()
            || phone
                .model()
                .to_lowercase()
                .contains(&self.keyword.trim().to_lowercase())
    }

    fn compare(&self, a: &PhoneRecord, b: &PhoneRecord) -> Ordering {
        let ordering = match self.sort_by {
            SortKey::Price => a.price().cmp(&b.price()),
            SortKey::Model => a.model().to_lowercase().cmp(&b.model().to_lowercase()),
            SortKey::Brand => a.brand().to_lowercase().cmp(&b.brand().to_lowercase()),
        };

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Phones matching `query`, sorted as it asks. Ties keep input order.
pub fn search(phones: &[PhoneRecord], query: &PhoneQuery) -> Vec<PhoneRecord> {
    let mut found: Vec<PhoneRecord> = phones
        .iter()
        .filter(|phone| query.matches(phone))
        .cloned()
        .collect();
    found.sort_by(|a, b| query.compare(a, b));
    found
}

/// True when the RAM part of `"8GB + 128GB"` is at least `wanted`. A value
/// without `+` is compared as a whole.
pub fn matches_ram_filter(ram_and_storage: &str, wanted: &str) -> bool {
    matches_part(ram_and_storage, ram_and_storage.split('+').next(), wanted)
}

/// True when the storage part of `"8GB + 128GB"` is at least `wanted`. A
/// value without `+` is compared as a whole.
pub fn matches_storage_filter(ram_and_storage: &str, wanted: &str) -> bool {
    matches_part(ram_and_storage, ram_and_storage.split('+').nth(1), wanted)
}

fn matches_part(field: &str, part: Option<&str>, wanted: &str) -> bool {
    if wanted.trim().is_empty() || field.trim().is_empty() {
        return true;
    }
    let part = if field.contains('+') { part.unwrap_or_default() } else { field };

    // No digits counts as zero on either side
    let actual = leading_number(part).unwrap_or(0);
    actual >= leading_number(wanted).unwrap_or(0)
}

/// First run of digits in `text`.
fn leading_number(text: &str) -> Option<u64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
