use crate::application::resolve::ResolveUseCase;
use crate::domain::entities::resolution::{ResolutionRequest, ResolutionResult, ResolutionStatus};
use crate::domain::error::EngineError;
use crate::domain::normalize::parse_ticker;
use crate::domain::values::source::Source;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// One input row augmented with the resolution columns. Unresolved rows
/// pass through with a null identifier rather than being dropped.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub ticker: String,
    pub name: String,
    pub weight: f64,
    pub resolved_id: Option<String>,
    pub status: ResolutionStatus,
    pub source: Option<Source>,
    pub confidence: f64,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub skipped: usize,
    pub by_source: BTreeMap<String, usize>,
    pub rows: Vec<BatchRow>,
}

/// Concurrent batch resolution over a bounded worker pool.
///
/// Rows sharing a primary ticker are chained behind a single cascade, so
/// at most one of them reaches the external providers per run; the rest
/// are served by whatever that first attempt cached. Distinct tickers run
/// concurrently; external fan-out stays bounded by the rate governor
/// underneath.
pub struct BatchResolveUseCase {
    resolve: Arc<ResolveUseCase>,
    parallelism: usize,
}

impl BatchResolveUseCase {
    pub fn new(resolve: Arc<ResolveUseCase>, parallelism: usize) -> Self {
        Self {
            resolve,
            parallelism: parallelism.max(1),
        }
    }

    pub async fn execute(&self, requests: Vec<ResolutionRequest>) -> BatchReport {
        let context_id = uuid::Uuid::new_v4().to_string();

        // Group row indices by ticker root; duplicates resolve
        // sequentially so later ones hit the cache, not the providers.
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, req) in requests.iter().enumerate() {
            let (root, _) = parse_ticker(&req.raw_ticker);
            let key = if root.is_empty() {
                format!("#{i}")
            } else {
                root
            };
            groups.entry(key).or_default().push(i);
        }

        let resolve = &self.resolve;
        let requests_ref = &requests;
        let context_ref = &context_id;

        let grouped: Vec<Vec<(usize, ResolutionResult)>> = stream::iter(groups.into_values())
            .map(|indices| async move {
                let mut out = Vec::with_capacity(indices.len());
                for i in indices {
                    let req = requests_ref[i]
                        .clone()
                        .with_context_id(context_ref.clone());
                    let result = match resolve.execute(&req).await {
                        Ok(result) => result,
                        Err(EngineError::InvalidInput(e)) => {
                            warn!("Row {i} rejected: {e}");
                            ResolutionResult::unresolved("invalid_request")
                        }
                        Err(e) => {
                            warn!("Row {i} failed: {e}");
                            ResolutionResult::unresolved("engine_error")
                        }
                    };
                    out.push((i, result));
                }
                out
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut results: Vec<Option<ResolutionResult>> =
            (0..requests.len()).map(|_| None).collect();
        for (i, result) in grouped.into_iter().flatten() {
            results[i] = Some(result);
        }

        let mut report = BatchReport {
            total: requests.len(),
            resolved: 0,
            unresolved: 0,
            skipped: 0,
            by_source: BTreeMap::new(),
            rows: Vec::with_capacity(requests.len()),
        };

        for (req, result) in requests.into_iter().zip(results) {
            let result = result.unwrap_or_else(|| ResolutionResult::unresolved("engine_error"));
            match result.status {
                ResolutionStatus::Resolved => report.resolved += 1,
                ResolutionStatus::Unresolved => report.unresolved += 1,
                ResolutionStatus::Skipped => report.skipped += 1,
            }
            let source_key = result
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| result.detail.clone());
            *report.by_source.entry(source_key).or_insert(0) += 1;

            report.rows.push(BatchRow {
                ticker: req.raw_ticker,
                name: req.raw_name,
                weight: req.weight,
                resolved_id: result.resolved_id.map(|id| id.as_str().to_string()),
                status: result.status,
                source: result.source,
                confidence: result.confidence.value(),
                detail: result.detail,
            });
        }

        report
    }
}
