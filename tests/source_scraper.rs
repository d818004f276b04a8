//! End-to-end runs of the source pipeline against mock retailer pages.

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{CollectingSink, direct_chain};
use phone_tracker::acquisition::{RemoteExtraction, StrategyChain, build_http_client};
use phone_tracker::models::{EmptyReason, ProgressStatus, Source};
use phone_tracker::progress::ProgressReporter;
use phone_tracker::scrapers::{SourceScraper, source_config};
use phone_tracker::specs::synthesize_specs;
use phone_tracker::traits::{AcquisitionStrategy, PhoneScraper};

const LISTING: &str = r#"
<html><body>
  <a href="/kampanyalar">Kampanyalar</a>
  <a href="/apple-iphone-15-128-gb-cep-telefonu.html?srsltid=1">iPhone 15</a>
  <a href="/samsung-galaxy-a55-cep-telefonu.html">Galaxy A55</a>
  <a href="/apple-iphone-15-128-gb-cep-telefonu.html">iPhone 15 again</a>
  <a href="/xiaomi-redmi-13-cep-telefonu.html">Redmi 13</a>
</body></html>
"#;

const IPHONE_PAGE: &str = r#"
<html><body>
  <div class="product-name"><h1>Apple iPhone 15 128 GB</h1></div>
  <span class="product-price">44.999,00 TL</span>
  <table class="product-specs-list">
    <tr><td>İşlemci</td><td>A16 Bionic</td></tr>
    <tr><td>RAM</td><td>6 GB</td></tr>
    <tr><td>Dahili Depolama</td><td>128 GB</td></tr>
    <tr><td>Batarya Kapasitesi</td><td>3349 mAh</td></tr>
    <tr><td>Hızlı Şarj</td><td>20W</td></tr>
  </table>
</body></html>
"#;

const GALAXY_PAGE: &str = r#"
<html><body>
  <div class="product-name"><h1>Samsung Galaxy A55 256 GB</h1></div>
  <span class="product-price">18.999 TL</span>
</body></html>
"#;

fn vatan_scraper(server: &MockServer, chain: Arc<StrategyChain>) -> SourceScraper {
    let mut config = source_config(Source::Vatan, 10);
    config.base_url = server.uri();
    SourceScraper::new(config, chain).unwrap()
}

fn reporter(sink: &Arc<CollectingSink>, source: Source) -> ProgressReporter {
    ProgressReporter::new(source, sink.clone(), CancellationToken::new())
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn pipeline_builds_records_and_skips_broken_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/cep-telefonu", LISTING).await;
    mount_page(&server, "/apple-iphone-15-128-gb-cep-telefonu.html", IPHONE_PAGE).await;
    mount_page(&server, "/samsung-galaxy-a55-cep-telefonu.html", GALAXY_PAGE).await;
    // Redmi page is not mounted: 404

    let sink = Arc::new(CollectingSink::default());
    let mut progress = reporter(&sink, Source::Vatan);
    let records = vatan_scraper(&server, direct_chain())
        .scrape_all(&mut progress)
        .await;

    assert_eq!(records.len(), 2);

    let iphone = &records[0];
    assert_eq!(iphone.model(), "Apple iPhone 15 128 GB");
    assert_eq!(iphone.brand(), "Apple");
    assert_eq!(iphone.price().to_string(), "44999.00");
    assert_eq!(iphone.specs().processor, "A16 Bionic");
    assert_eq!(iphone.specs().ram_and_storage, "6 GB + 128 GB");
    assert_eq!(iphone.specs().battery_and_charging, "3349 mAh - 20W");
    assert_eq!(iphone.source(), Source::Vatan);
    assert_eq!(
        iphone.source_url(),
        Some(format!("{}/apple-iphone-15-128-gb-cep-telefonu.html", server.uri()).as_str())
    );

    let galaxy = &records[1];
    assert_eq!(galaxy.price().to_string(), "18999");
    assert_eq!(galaxy.specs(), &synthesize_specs("Samsung Galaxy A55 256 GB"));
    assert_eq!(galaxy.specs().ram_and_storage, "8GB + 256GB");

    let state = progress.state();
    assert_eq!(state.status, ProgressStatus::Completed);
    assert_eq!(state.item_count, 2);
    assert_eq!(state.percent_complete, 100);

    let events = sink.progress_for(Source::Vatan);
    assert!(
        events.iter().any(|e| e.error.as_deref().is_some_and(|err| err.contains("Redmi"))),
        "skipped page should be reported"
    );
    assert!(events.last().unwrap().error.is_none());
}

#[tokio::test]
async fn progress_never_decreases_within_a_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/cep-telefonu", LISTING).await;
    mount_page(&server, "/apple-iphone-15-128-gb-cep-telefonu.html", IPHONE_PAGE).await;

    let sink = Arc::new(CollectingSink::default());
    let mut progress = reporter(&sink, Source::Vatan);
    vatan_scraper(&server, direct_chain())
        .scrape_all(&mut progress)
        .await;

    let percents: Vec<u8> = sink
        .progress_for(Source::Vatan)
        .iter()
        .map(|e| e.progress)
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(percents.first(), Some(&0));
    assert!(percents.contains(&10));
    assert!(percents.contains(&70));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn zero_candidates_is_empty_with_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/cep-telefonu", "<a href='/kulaklik.html'>headphones</a>").await;

    let sink = Arc::new(CollectingSink::default());
    let mut progress = reporter(&sink, Source::Vatan);
    let records = vatan_scraper(&server, direct_chain())
        .scrape_all(&mut progress)
        .await;

    assert!(records.is_empty());
    assert_eq!(progress.state().status, ProgressStatus::Completed);
    assert_eq!(progress.state().empty_reason, Some(EmptyReason::NoCandidates));
    let last = sink.progress_for(Source::Vatan).pop().unwrap();
    assert!(last.error.is_some());
}

#[tokio::test]
async fn unreachable_listing_is_distinguished_from_no_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = Arc::new(CollectingSink::default());
    let mut progress = reporter(&sink, Source::Vatan);
    let records = vatan_scraper(&server, direct_chain())
        .scrape_all(&mut progress)
        .await;

    assert!(records.is_empty());
    assert_eq!(progress.state().empty_reason, Some(EmptyReason::Unreachable));
    assert!(sink.progress_for(Source::Vatan).last().unwrap().error.is_some());
}

#[tokio::test]
async fn cancellation_stops_after_current_item_and_keeps_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/cep-telefonu", LISTING).await;
    mount_page(&server, "/apple-iphone-15-128-gb-cep-telefonu.html", IPHONE_PAGE).await;
    mount_page(&server, "/samsung-galaxy-a55-cep-telefonu.html", GALAXY_PAGE).await;

    let sink = Arc::new(CollectingSink::default());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut progress = ProgressReporter::new(Source::Vatan, sink.clone(), cancel);

    let records = vatan_scraper(&server, direct_chain())
        .scrape_all(&mut progress)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(progress.state().status, ProgressStatus::Failed);
    assert!(progress.state().error.as_deref().unwrap().contains("Cancelled"));
}

#[tokio::test]
async fn remote_extraction_feeds_links_and_structured_details() {
    let server = MockServer::start().await;
    let detail_url = "https://www.teknosa.com/p/xiaomi-redmi-note-13-pro-cep-telefonu";

    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(body_partial_json(json!({ "url": "https://www.teknosa.com/telefon-c-100001002" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "links": [detail_url, "https://www.teknosa.com/kampanya"] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(body_partial_json(json!({ "url": detail_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "json": {
                "name": "Redmi Note 13 Pro 256 GB",
                "brand": "Xiaomi",
                "price": "14.999,00 TL",
                "processor": "Helio G99 Ultra",
                "RAM": "8GB",
                "storage": "256GB",
                "installment": "12 x 1.249,92 TL"
            } }
        })))
        .mount(&server)
        .await;

    let client = build_http_client(5).unwrap();
    let strategies: Vec<Arc<dyn AcquisitionStrategy>> =
        vec![Arc::new(RemoteExtraction::new(client, &server.uri(), "key"))];
    let scraper = SourceScraper::new(
        source_config(Source::Teknosa, 10),
        Arc::new(StrategyChain::new(strategies)),
    )
    .unwrap();

    let sink = Arc::new(CollectingSink::default());
    let mut progress = reporter(&sink, Source::Teknosa);
    let records = scraper.scrape_all(&mut progress).await;

    assert_eq!(records.len(), 1);
    let redmi = &records[0];
    assert_eq!(redmi.model(), "Xiaomi Redmi Note 13 Pro 256 GB");
    assert_eq!(redmi.brand(), "Xiaomi");
    assert_eq!(redmi.price().to_string(), "14999.00");
    assert_eq!(redmi.specs().processor, "Helio G99 Ultra");
    assert_eq!(redmi.specs().ram_and_storage, "8GB + 256GB");
    assert_eq!(redmi.installment().count, 12);
    assert_eq!(redmi.installment().amount.to_string(), "1249.92");
}
