use crate::domain::error::EngineError;
use crate::domain::values::canonical_id::CanonicalId;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::source::Source;
use async_trait::async_trait;

/// What one external lookup tier concluded.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(CanonicalId),
    Miss,
    /// The service refused the call with a rate-limit signal. Shortens the
    /// negative-cache TTL so the identifier is retried sooner.
    RateLimited,
}

/// One variant the provider actually sent upstream, for the format log.
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    pub variant: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
pub struct LookupReport {
    pub outcome: LookupOutcome,
    pub attempts: Vec<ProbeAttempt>,
}

impl LookupReport {
    pub fn miss(attempts: Vec<ProbeAttempt>) -> Self {
        Self {
            outcome: LookupOutcome::Miss,
            attempts,
        }
    }
}

/// One tier of the external provider cascade. Each implementation applies
/// its own fan-out policy over the variants it is given (batched names,
/// primary ticker only, first N tickers) and reports every variant it
/// tried so the orchestrator can log them.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Stable name, used for rate-governor budgets and the format log.
    fn name(&self) -> &str;

    fn source(&self) -> Source;

    /// Confidence assigned to a hit from this tier.
    fn confidence(&self) -> Confidence;

    async fn lookup(
        &self,
        ticker_variants: &[String],
        name_variants: &[String],
    ) -> Result<LookupReport, EngineError>;
}
