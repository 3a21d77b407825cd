//! Free bulk lookup tier: one batched SPARQL query over the name
//! variants, with an entity-search fallback when SPARQL yields nothing.
//! No API key and no hard rate limit, which is why this tier runs first.

use crate::domain::error::EngineError;
use crate::domain::ports::lookup_provider::{
    LookupOutcome, LookupProvider, LookupReport, ProbeAttempt,
};
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct WikidataProvider {
    client: reqwest::Client,
    sparql_url: String,
    entity_api_url: String,
    name_limit: usize,
}

impl WikidataProvider {
    pub fn new(name_limit: usize) -> Self {
        Self::with_endpoints(
            "https://query.wikidata.org/sparql",
            "https://www.wikidata.org/w/api.php",
            name_limit,
        )
    }

    pub fn with_endpoints(sparql_url: &str, entity_api_url: &str, name_limit: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("canonid/0.1 (identity resolution)")
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            sparql_url: sparql_url.to_string(),
            entity_api_url: entity_api_url.to_string(),
            name_limit,
        }
    }

    fn escape_sparql(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    async fn sparql_lookup(&self, names: &[&str]) -> Result<Option<CanonicalId>, EngineError> {
        let values_clause = names
            .iter()
            .map(|n| format!("\"{}\"", Self::escape_sparql(&n.to_uppercase())))
            .collect::<Vec<_>>()
            .join(" ");
        let query = format!(
            "SELECT ?item ?isin WHERE {{\n\
               VALUES ?searchName {{ {values_clause} }}\n\
               ?item rdfs:label ?label .\n\
               FILTER(UCASE(?label) = ?searchName)\n\
               ?item wdt:P946 ?isin .\n\
             }}\n\
             LIMIT 1"
        );

        let resp = self
            .client
            .get(&self.sparql_url)
            .query(&[("query", query.as_str()), ("format", "json")])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| EngineError::Provider(format!("wikidata sparql: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::Provider(format!(
                "wikidata sparql returned {}",
                resp.status()
            )));
        }

        let data: SparqlResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Provider(format!("wikidata sparql: {e}")))?;

        Ok(data
            .results
            .bindings
            .into_iter()
            .filter_map(|b| b.isin)
            .find_map(|v| CanonicalId::parse(&v.value).ok()))
    }

    /// Fallback path: search entities by label, then read the identifier
    /// claim (P946) off the top matches.
    async fn entity_search(&self, name: &str) -> Option<CanonicalId> {
        let resp = self
            .client
            .get(&self.entity_api_url)
            .query(&[
                ("action", "wbsearchentities"),
                ("search", name),
                ("language", "en"),
                ("format", "json"),
                ("limit", "3"),
            ])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let search: serde_json::Value = resp.json().await.ok()?;
        let hits = search["search"].as_array()?.clone();

        for hit in hits {
            let entity_id = match hit["id"].as_str() {
                Some(id) => id.to_string(),
                None => continue,
            };
            let resp = match self
                .client
                .get(&self.entity_api_url)
                .query(&[
                    ("action", "wbgetentities"),
                    ("ids", entity_id.as_str()),
                    ("props", "claims"),
                    ("format", "json"),
                ])
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => resp,
                _ => continue,
            };
            let detail: serde_json::Value = match resp.json().await {
                Ok(detail) => detail,
                Err(_) => continue,
            };
            let claim =
                &detail["entities"][&entity_id]["claims"]["P946"][0]["mainsnak"]["datavalue"]["value"];
            if let Some(raw) = claim.as_str() {
                if let Ok(id) = CanonicalId::parse(raw) {
                    return Some(id);
                }
            }
        }
        None
    }
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    isin: Option<SparqlValue>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

#[async_trait]
impl LookupProvider for WikidataProvider {
    fn name(&self) -> &str {
        "wikidata"
    }

    fn source(&self) -> Source {
        Source::Wikidata
    }

    fn confidence(&self) -> Confidence {
        Confidence::clamped(0.80)
    }

    async fn lookup(
        &self,
        _ticker_variants: &[String],
        name_variants: &[String],
    ) -> Result<LookupReport, EngineError> {
        let names: Vec<&str> = name_variants
            .iter()
            .map(String::as_str)
            .take(self.name_limit)
            .collect();
        if names.is_empty() {
            return Ok(LookupReport::miss(Vec::new()));
        }

        let found = match self.sparql_lookup(&names).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => self.entity_search(names[0]).await,
            Err(e) => {
                debug!("SPARQL path failed, trying entity search: {e}");
                self.entity_search(names[0]).await
            }
        };

        let succeeded = found.is_some();
        let attempts = names
            .iter()
            .map(|n| ProbeAttempt {
                variant: n.to_string(),
                succeeded,
            })
            .collect();

        Ok(LookupReport {
            outcome: match found {
                Some(id) => LookupOutcome::Found(id),
                None => LookupOutcome::Miss,
            },
            attempts,
        })
    }
}
