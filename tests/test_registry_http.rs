//! HTTP contract tests for the registry client: RPC entry points, trust
//! ranking among candidate facts, and offline degradation.

mod common;

use canonid::domain::ports::registry_client::RegistryClient;
use canonid::domain::values::alias_type::AliasType;
use canonid::domain::values::trust::TrustWeights;
use canonid::infrastructure::registry::http_client::HttpRegistryClient;
use common::isin;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpRegistryClient {
    HttpRegistryClient::new(&server.uri(), "test-key", TrustWeights::default())
}

#[tokio::test]
async fn test_resolve_ticker_parses_fact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/resolve_ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "US0378331005",
            "display_name": "Apple Inc",
            "asset_class": "equity",
            "contributor_count": 12,
            "agreement_rate": 0.98
        }])))
        .mount(&server)
        .await;

    let fact = client(&server)
        .resolve_ticker("AAPL", None)
        .await
        .unwrap()
        .expect("fact expected");
    assert_eq!(fact.id, isin("US0378331005"));
    assert_eq!(fact.display_name, "Apple Inc");
    assert_eq!(fact.contributor_count, 12);
}

#[tokio::test]
async fn test_resolve_ticker_prefers_higher_trust_candidate() {
    let server = MockServer::start().await;
    let recent = chrono::Utc::now().to_rfc3339();
    Mock::given(method("POST"))
        .and(path("/rpc/resolve_ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "US5949181045",
                "display_name": "Lone submission",
                "contributor_count": 1,
                "agreement_rate": 0.5
            },
            {
                "id": "US0378331005",
                "display_name": "Well confirmed",
                "contributor_count": 15,
                "last_confirmed_at": recent,
                "agreement_rate": 1.0
            }
        ])))
        .mount(&server)
        .await;

    let fact = client(&server)
        .resolve_ticker("AAPL", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fact.id, isin("US0378331005"));
}

#[tokio::test]
async fn test_invalid_ids_in_response_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/resolve_ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "NOT_AN_ID", "display_name": "Broken" },
            { "id": "US0378331005", "display_name": "Valid" }
        ])))
        .mount(&server)
        .await;

    let fact = client(&server)
        .resolve_ticker("AAPL", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fact.id, isin("US0378331005"));
}

#[tokio::test]
async fn test_server_error_degrades_to_registry_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/resolve_ticker"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client(&server).resolve_ticker("AAPL", None).await;
    assert!(matches!(
        result,
        Err(canonid::domain::error::EngineError::Registry(_))
    ));
}

#[tokio::test]
async fn test_unreachable_registry_degrades_not_panics() {
    let client = HttpRegistryClient::new("http://127.0.0.1:1", "k", TrustWeights::default());
    let result = client.resolve_ticker("AAPL", None).await;
    assert!(matches!(
        result,
        Err(canonid::domain::error::EngineError::Registry(_))
    ));
}

#[tokio::test]
async fn test_contributions_post_to_entry_points() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/contribute_listing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/contribute_alias"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .contribute_listing(&isin("US0378331005"), "AAPL", "XNAS", "USD")
        .await
        .unwrap();
    client
        .contribute_alias("APPLE", &isin("US0378331005"), AliasType::Name)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_batch_resolve_pairs_tickers_with_facts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/batch_resolve_tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ticker": "AAPL", "id": "US0378331005", "display_name": "Apple Inc" },
            { "ticker": "SAP", "id": "DE0007164600", "display_name": "SAP SE" }
        ])))
        .mount(&server)
        .await;

    let pairs = client(&server)
        .batch_resolve_tickers(&["AAPL".to_string(), "SAP".to_string()])
        .await
        .unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, "AAPL");
    assert_eq!(pairs[0].1.id, isin("US0378331005"));
    assert_eq!(pairs[1].1.id, isin("DE0007164600"));
}

#[tokio::test]
async fn test_sync_parses_snapshot_and_skips_bad_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/sync_identity_domain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "assets": [
                { "id": "US0378331005", "display_name": "Apple Inc", "asset_class": "equity" },
                { "id": "BROKEN", "display_name": "Dropped" }
            ],
            "listings": [
                { "ticker": "AAPL", "exchange": "XNAS", "asset_id": "US0378331005" }
            ],
            "aliases": [
                { "alias_text": "APPLE", "asset_id": "US0378331005", "contributor_count": 4 }
            ]
        })))
        .mount(&server)
        .await;

    let snapshot = client(&server).sync_identity_domain().await.unwrap();
    assert_eq!(snapshot.assets.len(), 1);
    assert_eq!(snapshot.listings.len(), 1);
    assert_eq!(snapshot.aliases.len(), 1);
    assert_eq!(snapshot.aliases[0].contributor_count, 4);
}
