//! # Discord Webhook Integration
//!
//! This module provides Discord webhook functionality for reporting on phone
//! price updates. It posts two kinds of embedded messages: a summary after
//! every update run, and an alert whenever a tracked phone gets cheaper at a
//! retailer.
//!
//! ## Features
//!
//! - **Run Summaries**: One embed per update with per-source phone counts
//! - **Price Drop Alerts**: Old and new price, the saving and a product link
//! - **Error Visibility**: Failed runs are shown in red with their error text
//! - **Optional Integration**: Gracefully disables if webhook URL is not configured
//!
//! ## Discord Embed Structure
//!
//! A run summary includes:
//! - **Title**: "📱 Phone price update" (or "⚠️ Phone price update failed")
//! - **Description**: The run's outcome message and warning, if any
//! - **Color**: Discord blue (`0x0058_65F2`) on success, red on failure
//! - **Fields**: One inline field per source with its phone count or error
//!
//! A price drop alert includes:
//! - **Title**: "📉 Price drop: {model}"
//! - **URL**: The product page at the retailer
//! - **Color**: Green (`0x0057_F287`)
//! - **Fields**: Retailer, old price, new price and saving
//!
//! ## Rate Limits
//!
//! Discord webhooks have the following limits:
//! - **Requests**: 30 per minute
//! - **Message Size**: 6000 characters total
//! - **Embeds**: 10 per message (we use 1)
//! - **Fields**: 25 per embed (we use at most 4)
//!
//! ## Environment Configuration
//!
//! Set the `DISCORD_WEBHOOK_URL` environment variable with your webhook URL.
//! If not set, notifications will be disabled but logged.

use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::models::{
    BatchOutcome, BatchStatus, DiscordEmbed, DiscordField, DiscordMessage, PhoneRecord,
    ProgressStatus,
};

const COLOR_INFO: u32 = 0x0058_65F2;
const COLOR_DROP: u32 = 0x0057_F287;
const COLOR_ERROR: u32 = 0x00ED_4245;

/// Discord webhook notification client for price updates.
///
/// Holds the HTTP client and the optional webhook URL. Every send method is a
/// no-op when no webhook is configured, so callers never need to check.
///
/// ## Thread Safety
///
/// This struct is `Clone` and can be safely shared across async tasks and threads.
/// The underlying `reqwest::Client` is designed for concurrent use.
pub struct DiscordNotifier {
    /// Reusable HTTP client for making webhook requests to Discord's API.
    client: Client,

    /// Webhook URL from configuration. If `None`, notifications are skipped.
    webhook_url: Option<String>,
}

impl DiscordNotifier {
    /// Creates a notifier for `webhook_url`.
    ///
    /// ## Parameters
    ///
    /// - `webhook_url`: Full webhook URL from Discord channel settings
    ///   (`https://discord.com/api/webhooks/{id}/{token}`), or `None` to
    ///   disable notifications with a warning log
    ///
    /// ## Example
    ///
    /// ```rust
    /// use phone_tracker::discord::DiscordNotifier;
    ///
    /// // Works with or without a webhook
    /// let notifier = DiscordNotifier::new(None);
    /// assert!(!notifier.is_enabled());
    /// ```
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_none() {
            warn!("DISCORD_WEBHOOK_URL not set - Discord notifications will be disabled");
        }

        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Posts a summary of a finished update run.
    ///
    /// ## Error Handling
    ///
    /// - **Missing webhook URL**: Silent skip
    /// - **Network failures**: Propagated as `anyhow::Error`
    /// - **HTTP errors**: Logged with status code, method returns `Ok`
    pub async fn send_batch_summary(&self, outcome: &BatchOutcome) -> Result<()> {
        self.send(batch_embed(outcome), "update summary").await
    }

    /// Posts a price drop alert for `phone`, which used to cost `previous`.
    ///
    /// Same error handling as [`send_batch_summary`](Self::send_batch_summary).
    ///
    /// ## Example
    ///
    /// ```rust,no_run
    /// use phone_tracker::discord::DiscordNotifier;
    /// use phone_tracker::models::{PhoneRecord, Source, SpecSet};
    /// use rust_decimal::Decimal;
    ///
    /// # async fn run() -> anyhow::Result<()> {
    /// let notifier = DiscordNotifier::new(Some("https://discord.com/api/webhooks/1/x".to_string()));
    /// let phone = PhoneRecord::new(
    ///     "Apple iPhone 15",
    ///     Decimal::from(42_499),
    ///     SpecSet::default(),
    ///     Source::Teknosa,
    ///     None,
    /// );
    /// notifier.send_price_drop(&phone, Decimal::from(44_999)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_price_drop(&self, phone: &PhoneRecord, previous: Decimal) -> Result<()> {
        self.send(price_drop_embed(phone, previous), phone.model())
            .await
    }

    async fn send(&self, embed: DiscordEmbed, what: &str) -> Result<()> {
        let Some(webhook_url) = &self.webhook_url else {
            return Ok(());
        };

        let message = DiscordMessage {
            embeds: vec![embed],
        };

        let response = self.client.post(webhook_url).json(&message).send().await?;

        if response.status().is_success() {
            info!("Discord notification sent for {}", what);
        } else {
            error!("Failed to send Discord notification: {}", response.status());
        }

        Ok(())
    }
}

fn batch_embed(outcome: &BatchOutcome) -> DiscordEmbed {
    let failed = outcome.status == BatchStatus::Error;

    let mut description = outcome.message.clone();
    if let Some(warning) = &outcome.warning {
        description.push_str(&format!("\n⚠️ {warning}"));
    }

    let fields = outcome
        .sources
        .iter()
        .map(|(source, state)| DiscordField {
            name: source.display_name().to_string(),
            value: match (&state.status, &state.error) {
                (ProgressStatus::Failed, Some(error)) => format!("❌ {error}"),
                (_, Some(error)) if state.item_count == 0 => format!("0 phones ({error})"),
                _ => format!("{} phones", state.item_count),
            },
            inline: true,
        })
        .collect();

    DiscordEmbed {
        title: if failed {
            "⚠️ Phone price update failed".to_string()
        } else {
            "📱 Phone price update".to_string()
        },
        description,
        url: None,
        color: if failed { COLOR_ERROR } else { COLOR_INFO },
        timestamp: Utc::now().to_rfc3339(),
        fields,
    }
}

fn price_drop_embed(phone: &PhoneRecord, previous: Decimal) -> DiscordEmbed {
    let saving = previous - phone.price();

    DiscordEmbed {
        title: format!("📉 Price drop: {}", phone.model()),
        description: format!("{} is now cheaper at {}", phone.model(), phone.source()),
        url: phone.source_url().map(str::to_string),
        color: COLOR_DROP,
        timestamp: Utc::now().to_rfc3339(),
        fields: vec![
            DiscordField {
                name: "Retailer".to_string(),
                value: phone.source().display_name().to_string(),
                inline: true,
            },
            DiscordField {
                name: "Old price".to_string(),
                value: format!("{previous} TL"),
                inline: true,
            },
            DiscordField {
                name: "New price".to_string(),
                value: format!("{} TL", phone.price()),
                inline: true,
            },
            DiscordField {
                name: "Saving".to_string(),
                value: format!("{saving} TL"),
                inline: true,
            },
        ],
    }
}

/// Manual implementation of `Clone` for `DiscordNotifier`.
///
/// Cloning is lightweight: the `reqwest::Client` shares its connection pool
/// through an internal `Arc`.
impl Clone for DiscordNotifier {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            webhook_url: self.webhook_url.clone(),
        }
    }
}
