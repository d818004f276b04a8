//! Webhook delivery of price alerts.

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use phone_tracker::discord::DiscordNotifier;
use phone_tracker::models::{PhoneRecord, Source, SpecSet};

#[tokio::test]
async fn price_drop_is_posted_to_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_partial_json(json!({
            "embeds": [{ "title": "📉 Price drop: Apple iPhone 15" }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(Some(format!("{}/webhook", server.uri())));
    let phone = PhoneRecord::new(
        "Apple iPhone 15",
        Decimal::from(42_499),
        SpecSet::default(),
        Source::Teknosa,
        None,
    );

    notifier
        .send_price_drop(&phone, Decimal::from(44_999))
        .await
        .unwrap();
}

#[tokio::test]
async fn webhook_error_status_is_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(Some(server.uri()));
    let phone = PhoneRecord::new("Xiaomi 14", Decimal::ONE, SpecSet::default(), Source::Vatan, None);
    assert!(notifier.send_price_drop(&phone, Decimal::TEN).await.is_ok());
}

#[tokio::test]
async fn disabled_notifier_sends_nothing() {
    let notifier = DiscordNotifier::new(None);
    let phone = PhoneRecord::new("Xiaomi 14", Decimal::ONE, SpecSet::default(), Source::Vatan, None);
    assert!(notifier.send_price_drop(&phone, Decimal::TEN).await.is_ok());
}
