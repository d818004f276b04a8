use std::env::VarError;

use crate::error::ConfigError;
use crate::models::Source;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub firecrawl_api_key: Option<String>,
    pub firecrawl_api_url: String,
    pub render_service_url: Option<String>,
    pub render_service_token: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub http_timeout_secs: u64,
    pub max_items_per_source: usize,
    pub max_concurrent_sources: usize,
    /// Sources included in a batch update, in run order
    pub sources: Vec<Source>,
    /// Six-field cron expression for scheduled batch updates
    pub update_schedule: String,
}

/// Load configuration, reading a `.env` file first when one exists.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load configuration from the variables already in the process.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Core parsing logic, decoupled from the process environment so tests can
/// pass a plain map lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            }),
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let sources = match optional("TRACKER_SOURCES") {
        Some(raw) => parse_sources(&raw)?,
        None => Source::ALL.to_vec(),
    };

    Ok(AppConfig {
        database_url: or_default("DATABASE_URL", "sqlite:database/phones.db"),
        firecrawl_api_key: optional("FIRECRAWL_API_KEY"),
        firecrawl_api_url: or_default("FIRECRAWL_API_URL", "https://api.firecrawl.dev"),
        render_service_url: optional("RENDER_SERVICE_URL"),
        render_service_token: optional("RENDER_SERVICE_TOKEN"),
        discord_webhook_url: optional("DISCORD_WEBHOOK_URL"),
        http_timeout_secs: parse_positive("HTTP_TIMEOUT_SECS", "30")? as u64,
        max_items_per_source: parse_positive("MAX_ITEMS_PER_SOURCE", "10")?,
        max_concurrent_sources: parse_positive("MAX_CONCURRENT_SOURCES", "3")?,
        sources,
        update_schedule: or_default("UPDATE_SCHEDULE", "0 0 * * * *"),
    })
}

/// Comma-separated source ids; duplicates are dropped.
fn parse_sources(raw: &str) -> Result<Vec<Source>, ConfigError> {
    let mut sources = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let source = name
            .parse::<Source>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "TRACKER_SOURCES".to_string(),
                reason: e.to_string(),
            })?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    if sources.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRACKER_SOURCES".to_string(),
            reason: "no sources listed".to_string(),
        });
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_apply_with_empty_environment() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).unwrap();

        assert_eq!(config.database_url, "sqlite:database/phones.db");
        assert_eq!(config.firecrawl_api_url, "https://api.firecrawl.dev");
        assert_eq!(config.firecrawl_api_key, None);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.max_items_per_source, 10);
        assert_eq!(config.max_concurrent_sources, 3);
        assert_eq!(config.sources, Source::ALL.to_vec());
        assert_eq!(config.update_schedule, "0 0 * * * *");
    }

    #[test]
    fn blank_optional_values_count_as_unset() {
        let map = HashMap::from([("FIRECRAWL_API_KEY", "  "), ("RENDER_SERVICE_URL", "")]);
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.firecrawl_api_key, None);
        assert_eq!(config.render_service_url, None);
    }

    #[test]
    fn tracker_sources_are_parsed_in_order_without_duplicates() {
        let map = HashMap::from([("TRACKER_SOURCES", "vatan, Teknosa,vatan")]);
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config.sources, vec![Source::Vatan, Source::Teknosa]);
    }

    #[test]
    fn unknown_tracker_source_is_rejected() {
        let map = HashMap::from([("TRACKER_SOURCES", "vatan,hepsiburada")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TRACKER_SOURCES"),
            "got: {result:?}"
        );
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let map = HashMap::from([("HTTP_TIMEOUT_SECS", "soon")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HTTP_TIMEOUT_SECS")
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let map = HashMap::from([("MAX_CONCURRENT_SOURCES", "0")]);
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }
}
