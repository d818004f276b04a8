//! Rule-based spec estimation from a model name.
//!
//! Used when a product page yields no recognizable spec rows. The output
//! depends on nothing but the model name.

use crate::models::SpecSet;

struct ProcessorRule {
    keywords: &'static [&'static str],
    /// Checked in order against the lowercased model; first hit wins.
    variants: &'static [(&'static str, &'static str)],
    default: &'static str,
}

const PROCESSOR_RULES: &[ProcessorRule] = &[
    ProcessorRule {
        keywords: &["samsung", "galaxy"],
        variants: &[("pro", "Snapdragon 8 Gen 2"), ("a5", "Exynos 1380")],
        default: "Snapdragon 8 Gen 1",
    },
    ProcessorRule {
        keywords: &["apple", "iphone"],
        variants: &[("pro", "A17 Pro"), ("15", "A16 Bionic")],
        default: "A15 Bionic",
    },
    ProcessorRule {
        keywords: &["xiaomi", "redmi"],
        variants: &[("pro", "Dimensity 8100")],
        default: "Snapdragon 695",
    },
];

const GENERIC_PROCESSOR: &str = "Snapdragon 695";

pub fn synthesize_specs(model_name: &str) -> SpecSet {
    let lower = model_name.to_lowercase();

    SpecSet {
        processor: processor_for(&lower).to_string(),
        ram_and_storage: format!("{} + {}", ram_for(&lower), storage_for(&lower)),
        screen: screen_for(&lower).to_string(),
        battery_and_charging: "5000mAh, 33W hızlı şarj".to_string(),
        display_body_ratio: "86%".to_string(),
        front_camera: "32MP".to_string(),
        rear_cameras: "50MP + 12MP + 8MP".to_string(),
        additional_features: "NFC, IP67 Su/Toz Dayanıklılık".to_string(),
        network_connectivity: "5G, Wifi 6, Bluetooth 5.2".to_string(),
    }
}

fn storage_for(lower: &str) -> &'static str {
    if lower.contains("256") {
        "256GB"
    } else if lower.contains("512") {
        "512GB"
    } else {
        "128GB"
    }
}

fn ram_for(lower: &str) -> &'static str {
    let has_hint = lower.contains("gb") || lower.contains("ram");
    if has_hint && lower.contains("12") {
        "12GB"
    } else if has_hint && lower.contains("16") {
        "16GB"
    } else {
        "8GB"
    }
}

fn processor_for(lower: &str) -> &'static str {
    let Some(rule) = PROCESSOR_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lower.contains(keyword)))
    else {
        return GENERIC_PROCESSOR;
    };

    rule.variants
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(rule.default, |(_, processor)| *processor)
}

fn screen_for(lower: &str) -> &'static str {
    if ["pro", "ultra", "plus"].iter().any(|k| lower.contains(k)) {
        "6.7 inç AMOLED"
    } else if ["mini", "lite"].iter().any(|k| lower.contains(k)) {
        "6.1 inç AMOLED"
    } else {
        "6.5 inç AMOLED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_gives_identical_output() {
        for name in ["Samsung Galaxy A55 256GB", "Apple iPhone 15 Pro", "Nokia G22", ""] {
            assert_eq!(synthesize_specs(name), synthesize_specs(name));
        }
    }

    #[test]
    fn storage_and_ram_follow_digits_in_name() {
        assert_eq!(synthesize_specs("Redmi Note 13 256GB").ram_and_storage, "8GB + 256GB");
        assert_eq!(synthesize_specs("Galaxy S24 Ultra 512").ram_and_storage, "8GB + 512GB");
        assert_eq!(synthesize_specs("Poco X6 12GB RAM").ram_and_storage, "12GB + 128GB");
        assert_eq!(synthesize_specs("OnePlus 12 16 GB").ram_and_storage, "12GB + 128GB");
        assert_eq!(synthesize_specs("Honor 90 16GB").ram_and_storage, "16GB + 128GB");
        assert_eq!(synthesize_specs("Tecno Spark 12").ram_and_storage, "8GB + 128GB");
    }

    #[test]
    fn processor_by_brand_and_variant() {
        assert_eq!(synthesize_specs("Samsung Galaxy A54").processor, "Exynos 1380");
        assert_eq!(synthesize_specs("Samsung Galaxy S23").processor, "Snapdragon 8 Gen 1");
        assert_eq!(synthesize_specs("Apple iPhone 15").processor, "A16 Bionic");
        assert_eq!(synthesize_specs("Apple iPhone 15 Pro").processor, "A17 Pro");
        assert_eq!(synthesize_specs("Apple iPhone 13").processor, "A15 Bionic");
        assert_eq!(synthesize_specs("Xiaomi Redmi Note 13 Pro").processor, "Dimensity 8100");
        assert_eq!(synthesize_specs("Xiaomi Redmi 13C").processor, "Snapdragon 695");
        assert_eq!(synthesize_specs("Oppo Reno 11").processor, "Snapdragon 695");
    }

    #[test]
    fn screen_by_size_keyword() {
        assert_eq!(synthesize_specs("iPhone 15 Plus").screen, "6.7 inç AMOLED");
        assert_eq!(synthesize_specs("iPhone 13 mini").screen, "6.1 inç AMOLED");
        assert_eq!(synthesize_specs("Huawei P40 Lite").screen, "6.1 inç AMOLED");
        assert_eq!(synthesize_specs("Galaxy A15").screen, "6.5 inç AMOLED");
    }

    #[test]
    fn synthesized_specs_are_never_empty() {
        assert!(!synthesize_specs("").is_empty());
    }
}
