//! Unreliable fallback tier: scrapes canonical identifiers out of a public
//! symbol-suggest endpoint. Results are the least trusted in the cascade,
//! so this tier runs last and only over the first few ticker variants.

use crate::domain::error::EngineError;
use crate::domain::ports::lookup_provider::{
    LookupOutcome, LookupProvider, LookupReport, ProbeAttempt,
};
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub struct SuggestProvider {
    client: reqwest::Client,
    base_url: String,
    variant_limit: usize,
}

impl SuggestProvider {
    pub fn new(variant_limit: usize) -> Self {
        Self::with_base_url("https://markets.businessinsider.com", variant_limit)
    }

    pub fn with_base_url(base_url: &str, variant_limit: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("canonid/0.1")
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            variant_limit,
        }
    }

    async fn probe(&self, variant: &str) -> Option<CanonicalId> {
        let resp = self
            .client
            .get(format!("{}/ajax/SearchController_Suggest", self.base_url))
            .query(&[("max_results", "25"), ("query", variant)])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body = resp.text().await.ok()?;
        first_identifier(&body)
    }
}

/// Scan a suggest payload for the first token that validates as a
/// canonical identifier.
fn first_identifier(body: &str) -> Option<CanonicalId> {
    body.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() == 12)
        .find_map(|token| CanonicalId::parse(token).ok())
}

#[async_trait]
impl LookupProvider for SuggestProvider {
    fn name(&self) -> &str {
        "suggest"
    }

    fn source(&self) -> Source {
        Source::Suggest
    }

    fn confidence(&self) -> Confidence {
        Confidence::clamped(0.70)
    }

    async fn lookup(
        &self,
        ticker_variants: &[String],
        _name_variants: &[String],
    ) -> Result<LookupReport, EngineError> {
        let mut attempts = Vec::new();

        for variant in ticker_variants.iter().take(self.variant_limit) {
            match self.probe(variant).await {
                Some(id) => {
                    attempts.push(ProbeAttempt {
                        variant: variant.clone(),
                        succeeded: true,
                    });
                    return Ok(LookupReport {
                        outcome: LookupOutcome::Found(id),
                        attempts,
                    });
                }
                None => {
                    debug!("Suggest miss for {variant}");
                    attempts.push(ProbeAttempt {
                        variant: variant.clone(),
                        succeeded: false,
                    });
                }
            }
        }

        Ok(LookupReport::miss(attempts))
    }
}
