// Online weight adaptation
// Bounded reinforcement of analysts whose votes matched settled outcomes

use crate::models::{TradeOutcome, WeightTable, DEFAULT_WEIGHT};
use serde::{Deserialize, Serialize};

/// Learning-rate and bounds for the weight update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LearnerConfig {
    pub learning_rate: f64,
    /// Fixed step toward 1.0 applied to every weight per update
    pub mean_reversion: f64,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,  // full reward / penalty
            mean_reversion: 0.001,
            min_weight: 0.3,      // never fully silenced
            max_weight: 2.5,      // never dominant
        }
    }
}

/// Applies one settled trade to a weight table
#[derive(Debug, Clone, Default)]
pub struct Learner {
    config: LearnerConfig,
}

impl Learner {
    pub fn new(config: LearnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Compute the post-settlement weight table
    ///
    /// Every delta is computed from `table` as it was before this call, so the
    /// result does not depend on the order analysts are visited in. Analysts
    /// that abstained are only affected by mean reversion.
    pub fn update(&self, table: &WeightTable, outcome: &TradeOutcome) -> WeightTable {
        if !outcome.signal.is_trade() {
            tracing::warn!("Ignoring settlement for a {} decision", outcome.signal);
            return table.clone();
        }

        let mut next = table.clone();

        for (name, vote) in outcome.votes.iter() {
            if vote == 0 {
                continue;
            }

            let delta = self.delta(outcome.signal.agrees_with(vote), outcome.won);
            if delta != 0.0 {
                next.set(name, table.get(name) + delta);
            }
        }

        for (_, weight) in next.iter_mut() {
            *weight = self.bound(self.revert(*weight));
        }

        next
    }

    /// Reward or penalty for one analyst
    fn delta(&self, correct: bool, won: bool) -> f64 {
        let lr = self.config.learning_rate;
        match (won, correct) {
            (true, true) => lr,
            (false, true) => -lr,
            (true, false) => -lr / 2.0,
            (false, false) => 0.0,
        }
    }

    /// Step toward neutral without crossing it
    pub fn revert(&self, weight: f64) -> f64 {
        let step = self.config.mean_reversion;
        if weight > DEFAULT_WEIGHT {
            (weight - step).max(DEFAULT_WEIGHT)
        } else if weight < DEFAULT_WEIGHT {
            (weight + step).min(DEFAULT_WEIGHT)
        } else {
            weight
        }
    }

    /// Clamp into the configured band, mapping non-finite values to neutral
    pub fn bound(&self, weight: f64) -> f64 {
        if !weight.is_finite() {
            return DEFAULT_WEIGHT;
        }
        weight.clamp(self.config.min_weight, self.config.max_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Signal, VoteSnapshot};

    fn outcome(signal: Signal, won: bool, votes: &[(&str, i32)]) -> TradeOutcome {
        TradeOutcome {
            decision_id: None,
            signal,
            won,
            votes: votes
                .iter()
                .map(|(name, vote)| (name.to_string(), *vote))
                .collect::<VoteSnapshot>(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_win_with_correct_vote() {
        let learner = Learner::default();
        let table = WeightTable::with_defaults(["x"]);

        let next = learner.update(&table, &outcome(Signal::Call, true, &[("x", 3)]));

        // 1.0 + 0.05 - 0.001
        assert_close(next.get("x"), 1.049);
    }

    #[test]
    fn test_loss_with_dissent_only_reverts() {
        let learner = Learner::default();
        let mut table = WeightTable::new();
        table.set("y", 1.2);

        let next = learner.update(&table, &outcome(Signal::Call, false, &[("y", -2)]));

        assert_close(next.get("y"), 1.199);
    }

    #[test]
    fn test_loss_with_agreement_penalized() {
        let learner = Learner::default();
        let table = WeightTable::with_defaults(["x"]);

        let next = learner.update(&table, &outcome(Signal::Put, false, &[("x", -2)]));

        // 1.0 - 0.05 + 0.001
        assert_close(next.get("x"), 0.951);
    }

    #[test]
    fn test_win_with_dissent_half_penalty() {
        let learner = Learner::default();
        let table = WeightTable::with_defaults(["x"]);

        let next = learner.update(&table, &outcome(Signal::Put, true, &[("x", 1)]));

        assert_close(next.get("x"), 0.976);
    }

    #[test]
    fn test_abstainers_only_revert() {
        let learner = Learner::default();
        let mut table = WeightTable::new();
        table.set("quiet", 0.8);

        let next = learner.update(&table, &outcome(Signal::Call, true, &[("quiet", 0)]));

        assert_close(next.get("quiet"), 0.801);
    }

    #[test]
    fn test_reversion_does_not_cross_neutral() {
        let learner = Learner::default();
        assert_eq!(learner.revert(1.0005), 1.0);
        assert_eq!(learner.revert(0.9995), 1.0);
        assert_eq!(learner.revert(1.0), 1.0);
    }

    #[test]
    fn test_clamped_at_bounds() {
        let learner = Learner::default();
        let mut table = WeightTable::new();
        table.set("hot", 2.5);
        table.set("cold", 0.3);

        let next = learner.update(
            &table,
            &outcome(Signal::Call, true, &[("hot", 5), ("cold", -3)]),
        );

        assert_close(next.get("hot"), 2.5);
        assert_close(next.get("cold"), 0.3);
    }

    #[test]
    fn test_wait_outcome_is_noop() {
        let learner = Learner::default();
        let mut table = WeightTable::new();
        table.set("x", 1.3);

        let next = learner.update(&table, &outcome(Signal::Wait, true, &[("x", 3)]));

        assert_eq!(next, table);
    }

    #[test]
    fn test_update_reads_only_pre_update_weights() {
        let learner = Learner::default();
        let mut table = WeightTable::new();
        table.set("alpha", 1.4);
        table.set("beta", 0.7);
        table.set("gamma", 2.1);

        let votes = [("gamma", -1), ("alpha", 3), ("beta", 2)];
        let mut forward = VoteSnapshot::new();
        for (name, vote) in votes {
            forward.insert(name, vote);
        }
        let mut backward = VoteSnapshot::new();
        for (name, vote) in votes.iter().rev() {
            backward.insert(*name, *vote);
        }

        let settle = |snapshot: VoteSnapshot| {
            learner.update(
                &table,
                &TradeOutcome {
                    decision_id: None,
                    signal: Signal::Call,
                    won: true,
                    votes: snapshot,
                },
            )
        };
        let together = settle(forward);
        assert_eq!(together, settle(backward));

        // Each analyst moves exactly as if it had voted alone
        for (name, vote) in votes {
            let alone = learner.update(&table, &outcome(Signal::Call, true, &[(name, vote)]));
            assert_close(together.get(name), alone.get(name));
        }
        assert_close(together.get("alpha"), 1.449);
        assert_close(together.get("beta"), 0.751);
        assert_close(together.get("gamma"), 2.074);
    }

    #[test]
    fn test_unknown_voter_starts_neutral() {
        let learner = Learner::default();
        let next = learner.update(
            &WeightTable::new(),
            &outcome(Signal::Call, true, &[("newcomer", 2)]),
        );

        assert_close(next.get("newcomer"), 1.049);
    }
}
