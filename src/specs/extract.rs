use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::labels::LabelTable;
use crate::error::TrackerError;
use crate::models::SpecSet;

/// CSS selectors locating a site's spec table.
#[derive(Debug, Clone)]
pub struct SpecLayout {
    /// One row per spec entry
    pub row: String,
    /// Label cell within a row
    pub key: String,
    /// Value cell within a row. When equal to `key`, the second match is the value.
    pub value: String,
}

/// Reads a [`SpecSet`] out of a parsed product page.
#[derive(Debug, Clone)]
pub struct SpecExtractor {
    row: Selector,
    key: Selector,
    value: Selector,
    shared_cell: bool,
    labels: LabelTable,
}

impl SpecExtractor {
    pub fn new(layout: &SpecLayout, labels: LabelTable) -> Result<Self, TrackerError> {
        Ok(Self {
            row: parse_selector(&layout.row)?,
            key: parse_selector(&layout.key)?,
            value: parse_selector(&layout.value)?,
            shared_cell: layout.key == layout.value,
            labels,
        })
    }

    /// Raw label/value pairs found in the spec table.
    pub fn pairs(&self, document: &Html) -> HashMap<String, String> {
        let mut pairs = HashMap::new();

        for row in document.select(&self.row) {
            let key = row.select(&self.key).next();
            let value = if self.shared_cell {
                row.select(&self.value).nth(1)
            } else {
                row.select(&self.value).next()
            };

            if let (Some(key), Some(value)) = (key, value) {
                let key = element_text(key);
                let key = key.trim_end_matches(':').trim();
                if !key.is_empty() {
                    pairs.insert(key.to_string(), element_text(value));
                }
            }
        }

        pairs
    }

    /// Never fails: labels that are missing from the page yield empty fields.
    pub fn extract(&self, document: &Html) -> SpecSet {
        self.labels.apply(&self.pairs(document))
    }
}

/// Maps the remote extraction service's structured answer onto a spec set.
pub fn specs_from_structured(json: &Value) -> SpecSet {
    let ram = json_text(json, &["RAM", "ram"]);
    let storage = json_text(json, &["storage", "Storage"]);
    let ram_and_storage: Vec<String> = [ram, storage]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    SpecSet {
        processor: json_text(json, &["processor", "Processor"]),
        ram_and_storage: ram_and_storage.join(" + "),
        screen: json_text(json, &["screen_size", "screenSize", "screen"]),
        battery_and_charging: json_text(json, &["battery", "Battery"]),
        rear_cameras: json_text(json, &["camera_details", "cameraDetails", "camera"]),
        ..SpecSet::default()
    }
}

/// Text of the first present key, numbers rendered as-is.
pub(crate) fn json_text(json: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| json.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, TrackerError> {
    Selector::parse(selector).map_err(|e| TrackerError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Element text with runs of whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
