//! Mouser adapter wire behavior: API key in the query string and tolerant
//! price-string parsing of the search payload.

#![cfg(feature = "supplier-mouser")]

mod common;

use common::http_stub::{StubResponse, StubServer};
use serde_json::json;
use uni_supply::api::SupplierConfig;
use uni_supply::supplier::MouserAdapter;
use uni_supply::traits::SupplierAdapter;

fn config_for(server: &StubServer) -> SupplierConfig {
    SupplierConfig {
        base_url: Some(server.base_url()),
        api_key: Some("test-key".to_string()),
        ..Default::default()
    }
}

fn part_payload() -> serde_json::Value {
    json!({
        "Errors": [],
        "SearchResults": {
            "NumberOfResult": 1,
            "Parts": [{
                "Description": "CAP CER 0.1UF 50V X7R 0603",
                "Manufacturer": "Murata",
                "ManufacturerPartNumber": "GRM188R71H104KA93D",
                "DataSheetUrl": "https://www.mouser.com/ds/grm188.pdf",
                "AvailabilityInStock": "15000",
                "LeadTime": "11 Weeks",
                "PriceBreaks": [
                    {"Quantity": 1, "Price": "$1,234.56", "Currency": "USD"},
                    {"Quantity": 10, "Price": "Call", "Currency": "USD"},
                    {"Quantity": 100, "Price": "$0.08", "Currency": "USD"}
                ]
            }]
        }
    })
}

#[tokio::test]
async fn api_key_travels_as_query_parameter() {
    let server = StubServer::start(vec![StubResponse::json(200, &part_payload())]).await;
    let adapter = MouserAdapter::new(config_for(&server)).expect("adapter");

    let details = adapter.enrich_details("GRM188R71H104KA93D").await;
    assert!(details.success);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /search/partnumber"));
    assert!(
        requests[0].contains("apiKey=test-key"),
        "missing key in {:?}",
        requests
    );
}

#[tokio::test]
async fn pricing_parses_display_strings_and_skips_malformed() {
    let server = StubServer::start(vec![StubResponse::json(200, &part_payload())]).await;
    let adapter = MouserAdapter::new(config_for(&server)).expect("adapter");

    let pricing = adapter.enrich_pricing("GRM188R71H104KA93D").await;
    assert!(pricing.success);
    assert_eq!(pricing.unit_price, Some(1234.56));
    assert_eq!(pricing.currency.as_deref(), Some("USD"));
    // The "Call" entry is dropped, not fatal.
    assert_eq!(pricing.price_breaks.len(), 2);
    assert_eq!(pricing.price_breaks[1].unit_price, 0.08);
    assert_eq!(pricing.stock_quantity, Some(15000));
}

#[tokio::test]
async fn stock_derived_with_lead_time() {
    let server = StubServer::start(vec![StubResponse::json(200, &part_payload())]).await;
    let adapter = MouserAdapter::new(config_for(&server)).expect("adapter");

    let stock = adapter.enrich_stock("GRM188R71H104KA93D").await;
    assert!(stock.success);
    assert_eq!(stock.stock_quantity, Some(15000));
    assert_eq!(stock.lead_time_days, Some(77));
}

#[tokio::test]
async fn api_level_errors_become_failed_responses() {
    let payload = json!({
        "Errors": [{"Message": "Invalid API key"}],
        "SearchResults": null
    });
    let server = StubServer::start(vec![StubResponse::json(200, &payload)]).await;
    let adapter = MouserAdapter::new(config_for(&server)).expect("adapter");

    let details = adapter.enrich_details("GRM188R71H104KA93D").await;
    assert!(!details.success);
    assert!(
        details
            .error_message
            .as_deref()
            .unwrap()
            .contains("Invalid API key")
    );
}

#[tokio::test]
async fn empty_search_results_fail_without_panic() {
    let payload = json!({
        "Errors": [],
        "SearchResults": {"NumberOfResult": 0, "Parts": []}
    });
    let server = StubServer::start(vec![StubResponse::json(200, &payload)]).await;
    let adapter = MouserAdapter::new(config_for(&server)).expect("adapter");

    assert!(!adapter.validate_part_number("UNKNOWN-1").await);
}
