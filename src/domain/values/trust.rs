use chrono::{DateTime, Utc};

/// Weights for the registry trust score. The exact numbers are deliberately
/// configuration, not constants: only the monotonicity guarantees below are
/// contractual.
///
/// - more independent contributors never lowers trust;
/// - an older identical fact never scores higher freshness than a newer one;
/// - disagreement among submissions never raises trust.
#[derive(Debug, Clone)]
pub struct TrustWeights {
    /// Weight of the contributor-count term.
    pub contributors: f64,
    /// Weight of the freshness-decay term.
    pub freshness: f64,
    /// Weight of the agreement-rate term.
    pub agreement: f64,
    /// Contributor count at which the logarithmic term saturates to 1.0.
    pub contributor_saturation: u32,
    /// Half-life in days of the freshness decay.
    pub freshness_half_life_days: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            contributors: 0.5,
            freshness: 0.3,
            agreement: 0.2,
            contributor_saturation: 20,
            freshness_half_life_days: 30.0,
        }
    }
}

/// Consensus trust of a registry fact, in `[0.0, 1.0]`.
///
/// Contributor scaling is logarithmic with diminishing returns; freshness is
/// exponential decay since the last confirmation (a fact never confirmed
/// decays from the epoch, i.e. scores ~0); agreement is the rate of
/// independent submissions that agree with this fact.
pub fn trust_score(
    contributor_count: u32,
    last_confirmed_at: Option<DateTime<Utc>>,
    agreement_rate: f64,
    weights: &TrustWeights,
    now: DateTime<Utc>,
) -> f64 {
    let total = weights.contributors + weights.freshness + weights.agreement;
    if total <= 0.0 {
        return 0.0;
    }

    let saturation = weights.contributor_saturation.max(1) as f64;
    let contributors =
        (((contributor_count as f64) + 1.0).ln() / (saturation + 1.0).ln()).min(1.0);

    let freshness = match last_confirmed_at {
        Some(at) => {
            let age_days = (now - at).num_minutes() as f64 / (60.0 * 24.0);
            if age_days <= 0.0 {
                1.0
            } else {
                0.5_f64.powf(age_days / weights.freshness_half_life_days.max(f64::EPSILON))
            }
        }
        None => 0.0,
    };

    let agreement = agreement_rate.clamp(0.0, 1.0);

    (weights.contributors * contributors
        + weights.freshness * freshness
        + weights.agreement * agreement)
        / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn score(contributors: u32, age_days: i64, agreement: f64) -> f64 {
        let now = Utc::now();
        trust_score(
            contributors,
            Some(now - Duration::days(age_days)),
            agreement,
            &TrustWeights::default(),
            now,
        )
    }

    #[test]
    fn test_more_contributors_never_lowers_trust() {
        let mut prev = score(0, 1, 0.9);
        for n in 1..200 {
            let next = score(n, 1, 0.9);
            assert!(next >= prev, "trust dropped from {prev} to {next} at n={n}");
            prev = next;
        }
    }

    #[test]
    fn test_contributor_scaling_has_diminishing_returns() {
        let step_low = score(2, 1, 0.9) - score(1, 1, 0.9);
        let step_high = score(11, 1, 0.9) - score(10, 1, 0.9);
        assert!(step_high < step_low);
    }

    #[test]
    fn test_older_fact_never_scores_higher() {
        let mut prev = score(5, 0, 0.9);
        for days in [1, 7, 30, 90, 365, 3650] {
            let next = score(5, days, 0.9);
            assert!(next <= prev, "freshness rose at {days} days");
            prev = next;
        }
    }

    #[test]
    fn test_disagreement_never_raises_trust() {
        let agreed = score(5, 1, 1.0);
        let contested = score(5, 1, 0.4);
        assert!(contested <= agreed);
    }

    #[test]
    fn test_never_confirmed_scores_zero_freshness() {
        let now = Utc::now();
        let weights = TrustWeights {
            contributors: 0.0,
            freshness: 1.0,
            agreement: 0.0,
            ..TrustWeights::default()
        };
        assert_eq!(trust_score(5, None, 1.0, &weights, now), 0.0);
    }

    #[test]
    fn test_zero_weights_guard() {
        let weights = TrustWeights {
            contributors: 0.0,
            freshness: 0.0,
            agreement: 0.0,
            ..TrustWeights::default()
        };
        assert_eq!(trust_score(5, Some(Utc::now()), 1.0, &weights, Utc::now()), 0.0);
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        for n in [0, 1, 50, 10_000] {
            for days in [0, 10, 10_000] {
                let s = score(n, days, 1.0);
                assert!((0.0..=1.0).contains(&s), "score {s} out of range");
            }
        }
    }
}
