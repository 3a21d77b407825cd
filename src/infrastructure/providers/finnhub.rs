//! Rate-limited profile lookup tier. Budgeted at 60 calls/minute upstream,
//! so this tier makes exactly one call with the primary ticker and
//! classifies the response as hit, genuine miss, or rate-limited. The
//! distinction drives the negative-cache TTL.

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

pub struct FinnhubProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url("https://finnhub.io/api/v1", api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("canonid/0.1")
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    isin: Option<String>,
}

#[async_trait]
impl LookupProvider for FinnhubProvider {
    fn name(&self) -> &str {
        "finnhub"
    }

    fn source(&self) -> Source {
        Source::Finnhub
    }

    fn confidence(&self) -> Confidence {
        Confidence::clamped(0.75)
    }

    async fn lookup(
        &self,
        ticker_variants: &[String],
        _name_variants: &[String],
    ) -> Result<LookupReport, EngineError> {
        let Some(primary) = ticker_variants.first().filter(|t| !t.is_empty()) else {
            return Ok(LookupReport::miss(Vec::new()));
        };

        let resp = self
            .client
            .get(format!("{}/stock/profile2", self.base_url))
            .query(&[("symbol", primary.as_str())])
            .header("X-Finnhub-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| EngineError::Provider(format!("finnhub: {e}")))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            debug!("Rate limit hit for {primary}");
            return Ok(LookupReport {
                outcome: LookupOutcome::RateLimited,
                attempts: vec![ProbeAttempt {
                    variant: primary.clone(),
                    succeeded: false,
                }],
            });
        }

        if !resp.status().is_success() {
            debug!("Profile lookup returned {} for {primary}", resp.status());
            return Ok(LookupReport::miss(vec![ProbeAttempt {
                variant: primary.clone(),
                succeeded: false,
            }]));
        }

        let profile: ProfileResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Provider(format!("finnhub: bad payload: {e}")))?;

        let found = profile
            .isin
            .as_deref()
            .and_then(|raw| CanonicalId::parse(raw).ok());
        let succeeded = found.is_some();

        Ok(LookupReport {
            outcome: match found {
                Some(id) => LookupOutcome::Found(id),
                None => LookupOutcome::Miss,
            },
            attempts: vec![ProbeAttempt {
                variant: primary.clone(),
                succeeded,
            }],
        })
    }
}
