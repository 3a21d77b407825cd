//! HTTP contract tests for the external provider tiers, including the
//! rate-limit classification that drives the short negative TTL.

mod common;

use canonid::domain::ports::lookup_provider::{LookupOutcome, LookupProvider};
use canonid::infrastructure::providers::finnhub::FinnhubProvider;
use canonid::infrastructure::providers::suggest::SuggestProvider;
use canonid::infrastructure::providers::wikidata::WikidataProvider;
use common::isin;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_finnhub_profile_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/profile2"))
        .and(query_param("symbol", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Apple Inc",
            "isin": "US0378331005"
        })))
        .mount(&server)
        .await;

    let provider = FinnhubProvider::with_base_url(&server.uri(), "key");
    let report = provider
        .lookup(&tickers(&["AAPL", "AAPL.US"]), &[])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        LookupOutcome::Found(ref id) if *id == isin("US0378331005")
    ));
    assert_eq!(report.attempts.len(), 1, "primary ticker only");
    assert_eq!(report.attempts[0].variant, "AAPL");
    assert!(report.attempts[0].succeeded);
}

#[tokio::test]
async fn test_finnhub_classifies_rate_limiting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/profile2"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = FinnhubProvider::with_base_url(&server.uri(), "key");
    let report = provider.lookup(&tickers(&["AAPL"]), &[]).await.unwrap();

    assert!(matches!(report.outcome, LookupOutcome::RateLimited));
}

#[tokio::test]
async fn test_finnhub_profile_without_id_is_a_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/profile2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "No id here" })))
        .mount(&server)
        .await;

    let provider = FinnhubProvider::with_base_url(&server.uri(), "key");
    let report = provider.lookup(&tickers(&["AAPL"]), &[]).await.unwrap();

    assert!(matches!(report.outcome, LookupOutcome::Miss));
    assert!(!report.attempts[0].succeeded);
}

#[tokio::test]
async fn test_suggest_scans_payload_for_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/SearchController_Suggest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"Name":"Apple Inc.","Isin":"US0378331005","Symbol":"AAPL"}]"#,
        ))
        .mount(&server)
        .await;

    let provider = SuggestProvider::with_base_url(&server.uri(), 2);
    let report = provider
        .lookup(&tickers(&["AAPL", "AAPL.US", "AAPL US"]), &[])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        LookupOutcome::Found(ref id) if *id == isin("US0378331005")
    ));
    assert_eq!(report.attempts.len(), 1, "stops at the first hit");
}

#[tokio::test]
async fn test_suggest_respects_variant_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ajax/SearchController_Suggest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("no identifiers here"))
        .expect(2)
        .mount(&server)
        .await;

    let provider = SuggestProvider::with_base_url(&server.uri(), 2);
    let report = provider
        .lookup(&tickers(&["BRK/B", "BRKB", "BRK-B", "BRK.B"]), &[])
        .await
        .unwrap();

    assert!(matches!(report.outcome, LookupOutcome::Miss));
    assert_eq!(report.attempts.len(), 2);
}

#[tokio::test]
async fn test_wikidata_sparql_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "bindings": [
                    { "isin": { "type": "literal", "value": "US0378331005" } }
                ]
            }
        })))
        .mount(&server)
        .await;

    let sparql = format!("{}/sparql", server.uri());
    let api = format!("{}/api", server.uri());
    let provider = WikidataProvider::with_endpoints(&sparql, &api, 5);
    let report = provider
        .lookup(&[], &["APPLE INC".to_string(), "APPLE".to_string()])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        LookupOutcome::Found(ref id) if *id == isin("US0378331005")
    ));
    // One batched call covers all offered name variants.
    assert_eq!(report.attempts.len(), 2);
    assert!(report.attempts.iter().all(|a| a.succeeded));
}

#[tokio::test]
async fn test_wikidata_falls_back_to_entity_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": { "bindings": [] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("action", "wbsearchentities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search": [ { "id": "Q312" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("action", "wbgetentities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": {
                "Q312": {
                    "claims": {
                        "P946": [
                            { "mainsnak": { "datavalue": { "value": "US0378331005" } } }
                        ]
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let sparql = format!("{}/sparql", server.uri());
    let api = format!("{}/api", server.uri());
    let provider = WikidataProvider::with_endpoints(&sparql, &api, 5);
    let report = provider
        .lookup(&[], &["APPLE INC".to_string()])
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        LookupOutcome::Found(ref id) if *id == isin("US0378331005")
    ));
}

#[tokio::test]
async fn test_wikidata_caps_name_fanout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "bindings": [
                    { "isin": { "type": "literal", "value": "US0378331005" } }
                ]
            }
        })))
        .mount(&server)
        .await;

    let sparql = format!("{}/sparql", server.uri());
    let api = format!("{}/api", server.uri());
    let provider = WikidataProvider::with_endpoints(&sparql, &api, 5);
    let names: Vec<String> = (0..9).map(|i| format!("VARIANT {i}")).collect();
    let report = provider.lookup(&[], &names).await.unwrap();

    assert_eq!(report.attempts.len(), 5, "at most 5 variants per batch");
}
