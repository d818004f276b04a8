use std::collections::HashMap;

use crate::models::{SpecField, SpecSet};

/// Maps one [`SpecField`] to the site labels whose values feed it.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: SpecField,
    pub labels: Vec<String>,
    /// Joins the values of several present labels.
    pub separator: &'static str,
}

impl FieldRule {
    fn new(field: SpecField, labels: &[&str], separator: &'static str) -> Self {
        Self {
            field,
            labels: labels.iter().map(|label| (*label).to_string()).collect(),
            separator,
        }
    }
}

/// Table of locale-specific spec labels for one site.
#[derive(Debug, Clone)]
pub struct LabelTable {
    rules: Vec<FieldRule>,
}

impl LabelTable {
    /// Labels shared by Turkish retailers' spec tables.
    pub fn turkish() -> Self {
        Self {
            rules: vec![
                FieldRule::new(SpecField::Processor, &["İşlemci"], ""),
                FieldRule::new(SpecField::RamAndStorage, &["RAM", "Dahili Depolama"], " + "),
                FieldRule::new(SpecField::Screen, &["Ekran Boyutu"], ""),
                FieldRule::new(
                    SpecField::BatteryAndCharging,
                    &["Batarya Kapasitesi", "Şarj Gücü"],
                    " - ",
                ),
                FieldRule::new(SpecField::DisplayBodyRatio, &["Ekran/Gövde Oranı"], ""),
                FieldRule::new(SpecField::FrontCamera, &["Ön Kamera"], ""),
                FieldRule::new(SpecField::RearCameras, &["Arka Kamera"], ""),
                FieldRule::new(
                    SpecField::AdditionalFeatures,
                    &["NFC", "Su Geçirmezlik", "Ses Özellikleri"],
                    ", ",
                ),
                FieldRule::new(
                    SpecField::NetworkConnectivity,
                    &["Mobil Bağlantı", "Wi-Fi", "Bluetooth"],
                    ", ",
                ),
            ],
        }
    }

    /// Replaces the labels feeding `field`, keeping its separator.
    #[must_use]
    pub fn with_labels(mut self, field: SpecField, labels: &[&str]) -> Self {
        if let Some(rule) = self.rules.iter_mut().find(|rule| rule.field == field) {
            rule.labels = labels.iter().map(|label| (*label).to_string()).collect();
        }
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Builds a spec set from raw label/value pairs. Fields whose labels are
    /// all absent stay empty.
    pub fn apply(&self, pairs: &HashMap<String, String>) -> SpecSet {
        let mut specs = SpecSet::default();

        for rule in &self.rules {
            let values: Vec<&str> = rule
                .labels
                .iter()
                .filter_map(|label| pairs.get(label.as_str()))
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .collect();
            specs.set(rule.field, values.join(rule.separator));
        }

        specs
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::turkish()
    }
}
