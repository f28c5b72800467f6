//! Boundary to the scoring function.
//!
//! The scheduler only needs `(accepted, confidence, direction)` back for an
//! `(instrument, window)` pair. How that score is produced is not its concern.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::domain::WindowDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
}

/// What a scorer says about one `(instrument, window)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// The scorer found a setup worth reporting at all
    pub accepted: bool,
    /// 0..=100
    pub confidence: u8,
    pub direction: Direction,
    pub strategy: Option<String>,
    pub reasoning: Option<String>,
}

impl ScoreOutcome {
    pub fn new(accepted: bool, confidence: u8, direction: Direction) -> Self {
        Self {
            accepted,
            confidence: confidence.min(100),
            direction,
            strategy: None,
            reasoning: None,
        }
    }
}

/// Synchronous scorer, called inside one trigger-gate turn.
pub trait ScoringAdapter {
    fn score(&self, instrument: &str, window: &WindowDescriptor) -> Result<ScoreOutcome>;
}

/// Scorer that may suspend (e.g. fetches live data). Used by the runtime driver.
#[async_trait]
pub trait AsyncScoringAdapter: Send + Sync {
    async fn score(&self, instrument: String, window: WindowDescriptor) -> Result<ScoreOutcome>;
}

#[async_trait]
impl<S> AsyncScoringAdapter for S
where
    S: ScoringAdapter + Send + Sync,
{
    async fn score(&self, instrument: String, window: WindowDescriptor) -> Result<ScoreOutcome> {
        ScoringAdapter::score(self, &instrument, &window)
    }
}

/// Strategy identifiers the demo scorer picks from.
pub const STRATEGY_IDS: &[&str] = &[
    "trend-following-ema",
    "fibonacci-confluence",
    "price-action-pure",
    "candle-flow-analysis",
    "supply-demand-zones",
    "ltb-lta-strategy",
    "zone-x-injection",
    "future-prediction",
    "new-high-low",
    "reversal-zones-advanced",
    "momentum-breakout",
    "pullback-entry",
    "divergence-reversal",
    "session-first-move",
    "ema-cross-momentum",
    "support-resistance-bounce",
    "squeeze-expansion",
    "trend-channel",
    "volume-spike",
    "multi-timeframe",
];

const BASE_CONFIDENCE: u8 = 70;
const CONFIDENCE_CAP: u8 = 95;

/// (label, probability the confluence is present, bonus points)
const CONFLUENCES: &[(&str, f64, u8)] = &[
    ("EMAs aligned", 0.5, 5),
    ("ADX strong", 0.6, 4),
    ("MACD confirmed", 0.5, 3),
    ("volume above average", 0.4, 3),
    ("Fibonacci level respected", 0.7, 5),
];

/// Demo scorer: random confluence bonuses on top of a base confidence.
/// Produces numbers of the right shape and nothing more.
pub struct ConfluenceScorer {
    rng: Mutex<StdRng>,
    enabled: HashSet<String>,
}

impl ConfluenceScorer {
    /// All strategies enabled. `seed` makes the output reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_strategies(seed, STRATEGY_IDS.iter().map(|s| s.to_string()))
    }

    pub fn with_strategies(seed: Option<u64>, enabled: impl IntoIterator<Item = String>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            enabled: enabled.into_iter().collect(),
        }
    }
}

impl ScoringAdapter for ConfluenceScorer {
    fn score(&self, _instrument: &str, _window: &WindowDescriptor) -> Result<ScoreOutcome> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("scorer rng lock poisoned"))?;

        let strategy = STRATEGY_IDS
            .choose(&mut *rng)
            .copied()
            .unwrap_or(STRATEGY_IDS[0]);

        let mut confidence = BASE_CONFIDENCE;
        let mut hits = Vec::new();
        for (label, probability, bonus) in CONFLUENCES {
            if rng.gen_bool(*probability) {
                confidence += bonus;
                hits.push(*label);
            }
        }
        let confidence = confidence.min(CONFIDENCE_CAP);

        let direction = if rng.gen_bool(0.5) {
            Direction::Call
        } else {
            Direction::Put
        };

        Ok(ScoreOutcome {
            accepted: self.enabled.contains(strategy),
            confidence,
            direction,
            strategy: Some(strategy.to_string()),
            reasoning: Some(if hits.is_empty() {
                "no confluence".to_string()
            } else {
                hits.join(", ")
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClosePolicy, WindowWidth};

    fn window() -> WindowDescriptor {
        WindowDescriptor::at(1_704_110_457_000, WindowWidth::OneMinute, ClosePolicy::near_close(5))
    }

    #[test]
    fn confidence_stays_in_observed_band() {
        let scorer = ConfluenceScorer::new(Some(7));
        for _ in 0..200 {
            let outcome = ScoringAdapter::score(&scorer, "EUR/USD OTC", &window()).unwrap();
            assert!((BASE_CONFIDENCE..=CONFIDENCE_CAP).contains(&outcome.confidence));
            assert!(outcome.accepted);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = ConfluenceScorer::new(Some(42));
        let b = ConfluenceScorer::new(Some(42));
        for _ in 0..20 {
            assert_eq!(
                ScoringAdapter::score(&a, "A", &window()).unwrap(),
                ScoringAdapter::score(&b, "A", &window()).unwrap()
            );
        }
    }

    #[test]
    fn disabled_strategies_are_not_accepted() {
        let scorer = ConfluenceScorer::with_strategies(Some(1), Vec::new());
        let outcome = ScoringAdapter::score(&scorer, "A", &window()).unwrap();
        assert!(!outcome.accepted);
    }

    #[test]
    fn direction_renders_upper_case() {
        assert_eq!(Direction::Call.to_string(), "CALL");
        assert_eq!(serde_json::to_string(&Direction::Put).unwrap(), "\"PUT\"");
    }

    #[tokio::test]
    async fn sync_scorers_work_through_async_boundary() {
        let scorer = ConfluenceScorer::new(Some(3));
        let outcome = AsyncScoringAdapter::score(&scorer, "A".to_string(), window())
            .await
            .unwrap();
        assert!(outcome.confidence >= BASE_CONFIDENCE);
    }
}
