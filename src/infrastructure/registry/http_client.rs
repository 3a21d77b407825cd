//! HTTP client for the community identity registry.
//!
//! The registry blocks direct table access; reads and writes go through a
//! fixed set of server-validated RPC entry points (`/rpc/<fn>`). Each entry
//! point validates and deduplicates input server-side, so contributions are
//! idempotent under retry: re-submitting a known fact increments its
//! contributor count instead of duplicating it.
//!
//! Every operation degrades to `EngineError::Registry` when the registry is
//! unreachable; the cascade treats that as a miss and keeps working offline.

use crate::domain::entities::asset::{Alias, CanonicalAsset, Listing};
use crate::domain::error::EngineError;
use crate::domain::ports::registry_client::{IdentitySnapshot, RegistryClient, RegistryFact};
use crate::domain::values::alias_type::AliasType;
use crate::domain::values::asset_class::AssetClass;
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::trust::{trust_score, TrustWeights};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub struct HttpRegistryClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    trust: TrustWeights,
}

impl HttpRegistryClient {
    pub fn new(base_url: &str, api_key: &str, trust: TrustWeights) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .user_agent("canonid/0.1")
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            trust,
        }
    }

    async fn rpc<B: Serialize, T: DeserializeOwned>(
        &self,
        entry_point: &str,
        body: &B,
    ) -> Result<T, EngineError> {
        let url = format!("{}/rpc/{}", self.base_url, entry_point);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| EngineError::Registry(format!("{entry_point}: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::Registry(format!(
                "{entry_point} returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| EngineError::Registry(format!("{entry_point}: bad payload: {e}")))
    }

    /// Highest-trust fact among the candidates an entry point returned.
    fn pick_best(&self, rows: Vec<FactRow>) -> Option<RegistryFact> {
        let now = Utc::now();
        rows.into_iter()
            .filter_map(|row| row.into_fact())
            .max_by(|a, b| {
                let ta = trust_score(
                    a.contributor_count,
                    a.last_confirmed_at,
                    a.agreement_rate,
                    &self.trust,
                    now,
                );
                let tb = trust_score(
                    b.contributor_count,
                    b.last_confirmed_at,
                    b.agreement_rate,
                    &self.trust,
                    now,
                );
                ta.total_cmp(&tb)
            })
    }
}

#[derive(Debug, Deserialize)]
struct FactRow {
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    asset_class: Option<String>,
    #[serde(default = "one")]
    contributor_count: u32,
    #[serde(default)]
    last_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default = "full_agreement")]
    agreement_rate: f64,
}

fn one() -> u32 {
    1
}

fn full_agreement() -> f64 {
    1.0
}

impl FactRow {
    fn into_fact(self) -> Option<RegistryFact> {
        match CanonicalId::parse(&self.id) {
            Ok(id) => Some(RegistryFact {
                id,
                display_name: self.display_name,
                asset_class: self
                    .asset_class
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(AssetClass::Other),
                contributor_count: self.contributor_count,
                last_confirmed_at: self.last_confirmed_at,
                agreement_rate: self.agreement_rate,
            }),
            Err(e) => {
                warn!("Registry returned invalid id: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerFactRow {
    ticker: String,
    #[serde(flatten)]
    fact: FactRow,
}

#[derive(Debug, Deserialize)]
struct SnapshotPayload {
    #[serde(default)]
    assets: Vec<AssetRow>,
    #[serde(default)]
    listings: Vec<ListingRow>,
    #[serde(default)]
    aliases: Vec<AliasRow>,
}

#[derive(Debug, Deserialize)]
struct AssetRow {
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    asset_class: Option<String>,
    #[serde(default)]
    base_currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    ticker: String,
    #[serde(default)]
    exchange: Option<String>,
    asset_id: String,
    #[serde(default)]
    trading_currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AliasRow {
    alias_text: String,
    #[serde(default)]
    alias_type: Option<String>,
    asset_id: String,
    #[serde(default = "one")]
    contributor_count: u32,
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn resolve_ticker(
        &self,
        ticker: &str,
        exchange: Option<&str>,
    ) -> Result<Option<RegistryFact>, EngineError> {
        let rows: Vec<FactRow> = self
            .rpc(
                "resolve_ticker",
                &serde_json::json!({ "ticker": ticker, "exchange": exchange }),
            )
            .await?;
        Ok(self.pick_best(rows))
    }

    async fn batch_resolve_tickers(
        &self,
        tickers: &[String],
    ) -> Result<Vec<(String, RegistryFact)>, EngineError> {
        let rows: Vec<TickerFactRow> = self
            .rpc(
                "batch_resolve_tickers",
                &serde_json::json!({ "tickers": tickers }),
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.fact.into_fact().map(|f| (row.ticker, f)))
            .collect())
    }

    async fn resolve_alias(&self, text: &str) -> Result<Option<RegistryFact>, EngineError> {
        let rows: Vec<FactRow> = self
            .rpc("resolve_alias", &serde_json::json!({ "text": text }))
            .await?;
        Ok(self.pick_best(rows))
    }

    async fn contribute_listing(
        &self,
        id: &CanonicalId,
        ticker: &str,
        exchange: &str,
        currency: &str,
    ) -> Result<(), EngineError> {
        let _: serde_json::Value = self
            .rpc(
                "contribute_listing",
                &serde_json::json!({
                    "id": id.as_str(),
                    "ticker": ticker,
                    "exchange": exchange,
                    "currency": currency,
                }),
            )
            .await?;
        Ok(())
    }

    async fn contribute_alias(
        &self,
        text: &str,
        id: &CanonicalId,
        alias_type: AliasType,
    ) -> Result<(), EngineError> {
        let _: serde_json::Value = self
            .rpc(
                "contribute_alias",
                &serde_json::json!({
                    "text": text,
                    "id": id.as_str(),
                    "type": alias_type.to_string(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn sync_identity_domain(&self) -> Result<IdentitySnapshot, EngineError> {
        let payload: SnapshotPayload = self
            .rpc("sync_identity_domain", &serde_json::json!({}))
            .await?;

        let mut snapshot = IdentitySnapshot::default();
        for row in payload.assets {
            match CanonicalId::parse(&row.id) {
                Ok(id) => snapshot.assets.push(CanonicalAsset::new(
                    id,
                    row.display_name,
                    row.asset_class
                        .as_deref()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(AssetClass::Other),
                    row.base_currency.unwrap_or_else(|| "USD".to_string()),
                )),
                Err(e) => warn!("Skipping synced asset: {e}"),
            }
        }
        for row in payload.listings {
            match CanonicalId::parse(&row.asset_id) {
                Ok(id) => snapshot.listings.push(Listing::new(
                    &row.ticker,
                    row.exchange.as_deref().unwrap_or("UNKNOWN"),
                    id,
                    row.trading_currency.as_deref().unwrap_or("USD"),
                )),
                Err(e) => warn!("Skipping synced listing {}: {e}", row.ticker),
            }
        }
        for row in payload.aliases {
            match CanonicalId::parse(&row.asset_id) {
                Ok(id) => {
                    let alias_type = row
                        .alias_type
                        .as_deref()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(AliasType::Name);
                    let mut alias = Alias::new(&row.alias_text, alias_type, id);
                    alias.contributor_count = row.contributor_count;
                    snapshot.aliases.push(alias);
                }
                Err(e) => warn!("Skipping synced alias {}: {e}", row.alias_text),
            }
        }
        Ok(snapshot)
    }
}
