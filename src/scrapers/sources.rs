//! Site configurations for the tracked retailers.

use crate::models::{Source, SpecField};
use crate::specs::{LabelTable, SpecLayout};
use crate::traits::{LinkFilter, SiteSelectors, SlugStyle, SourceConfig};

/// Listing URL, link predicate, selectors and labels for `source`.
pub fn source_config(source: Source, max_items: usize) -> SourceConfig {
    match source {
        Source::MediaMarkt => SourceConfig {
            source,
            base_url: "https://www.mediamarkt.com.tr".to_string(),
            listing_path: "/tr/category/android-telefonlar-675172.html".to_string(),
            link_filter: LinkFilter {
                required: strings(&["product"]),
                any_of: strings(&["akilli-telefon", "cep-telefonu"]),
                suffix: Some(".html".to_string()),
            },
            slug_style: SlugStyle::AfterLastUnderscore,
            selectors: SiteSelectors {
                product_link: "a[href]".to_string(),
                name: "h1.product-name".to_string(),
                price: "div.price-container span.value".to_string(),
                installment: Some("div.campaign-detail".to_string()),
                spec_layout: SpecLayout {
                    row: "table.specs-table tr".to_string(),
                    key: "th".to_string(),
                    value: "td".to_string(),
                },
            },
            labels: LabelTable::turkish().with_labels(
                SpecField::AdditionalFeatures,
                &["NFC", "Su Geçirmezlik", "Hoparlör"],
            ),
            max_items,
        },
        Source::Teknosa => SourceConfig {
            source,
            base_url: "https://www.teknosa.com".to_string(),
            listing_path: "/telefon-c-100001002".to_string(),
            link_filter: LinkFilter {
                required: strings(&["/p/"]),
                any_of: strings(&["telefon", "cep-telefon"]),
                suffix: None,
            },
            slug_style: SlugStyle::WholeSegment,
            selectors: SiteSelectors {
                product_link: "a[href]".to_string(),
                name: ".pdp-title".to_string(),
                price: ".price-tag".to_string(),
                installment: None,
                spec_layout: SpecLayout {
                    row: ".product-feature-list li".to_string(),
                    key: ".feature-name".to_string(),
                    value: ".feature-value".to_string(),
                },
            },
            labels: LabelTable::turkish(),
            max_items,
        },
        Source::Vatan => SourceConfig {
            source,
            base_url: "https://www.vatanbilgisayar.com".to_string(),
            listing_path: "/cep-telefonu".to_string(),
            link_filter: LinkFilter {
                required: strings(&["cep-telefonu"]),
                any_of: Vec::new(),
                suffix: Some(".html".to_string()),
            },
            slug_style: SlugStyle::WholeSegment,
            selectors: SiteSelectors {
                product_link: "a[href]".to_string(),
                name: ".product-name h1".to_string(),
                price: ".product-price".to_string(),
                installment: None,
                // Label and value are both plain cells
                spec_layout: SpecLayout {
                    row: ".product-specs-list tr".to_string(),
                    key: "td".to_string(),
                    value: "td".to_string(),
                },
            },
            labels: LabelTable::turkish()
                .with_labels(
                    SpecField::BatteryAndCharging,
                    &["Batarya Kapasitesi", "Hızlı Şarj"],
                )
                .with_labels(
                    SpecField::AdditionalFeatures,
                    &["NFC", "Suya Dayanıklılık", "Ses Özellikleri"],
                ),
            max_items,
        },
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}
