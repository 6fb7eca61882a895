use crate::analysts::PanelVotes;
use crate::models::{DecisionReason, RiskLevel, Signal, TradeDecision, WeightTable};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decision rule parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Weighted score needed for CALL (or its negation for PUT)
    pub threshold: f64,
    /// Duration when no analyst voted
    pub default_duration: u32,
    pub min_duration: u32,
    pub max_duration: u32,
    /// ADX above which a decision is classed as high risk
    pub high_risk_adx: f64,
    /// Force WAIT on high-risk decisions
    pub veto_high_risk: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            threshold: 12.0,
            default_duration: 3,
            min_duration: 1,
            max_duration: 5,
            high_risk_adx: 40.0,
            veto_high_risk: false,
        }
    }
}

/// Weighted-vote decision rule with squeeze and high-risk vetoes
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Σ vote × weight over every report
    pub fn score(&self, votes: &PanelVotes, weights: &WeightTable) -> f64 {
        votes
            .iter()
            .map(|(name, report)| f64::from(report.value) * weights.get(name))
            .sum()
    }

    /// Conviction-weighted mean of suggested durations.
    ///
    /// Each non-zero vote contributes its duration |vote| times.
    pub fn duration(&self, votes: &PanelVotes) -> u32 {
        let (total, count) = votes
            .iter()
            .filter(|(_, report)| report.value != 0)
            .fold((0u64, 0u64), |(total, count), (_, report)| {
                let n = u64::from(report.value.unsigned_abs());
                (total + u64::from(report.duration) * n, count + n)
            });

        if count == 0 {
            return self.config.default_duration;
        }

        let mean = (total as f64 / count as f64).round() as u32;
        mean.clamp(self.config.min_duration, self.config.max_duration)
    }

    pub fn risk(&self, adx: Option<f64>) -> RiskLevel {
        match adx {
            Some(adx) if adx > self.config.high_risk_adx => RiskLevel::High,
            _ => RiskLevel::Low,
        }
    }

    /// `name: vote` for every strong vote, strongest first
    pub fn insights(&self, votes: &PanelVotes) -> Vec<String> {
        let mut strong: Vec<(&str, i32)> = votes
            .iter()
            .filter(|(_, report)| report.value.abs() >= 2)
            .map(|(name, report)| (name, report.value))
            .collect();

        strong.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()).then_with(|| a.0.cmp(b.0)));

        strong
            .into_iter()
            .map(|(name, vote)| format!("{}: {:+}", name, vote))
            .collect()
    }

    /// Combine one cycle's votes into a decision
    ///
    /// # Arguments
    /// * `votes` - Every analyst's report for this cycle
    /// * `weights` - Current weight table (missing names count as 1.0)
    /// * `adx` - Latest ADX reading, if available, for the risk level
    pub fn decide(
        &self,
        votes: &PanelVotes,
        weights: &WeightTable,
        adx: Option<f64>,
    ) -> TradeDecision {
        let score = self.score(votes, weights);
        let risk = self.risk(adx);
        let threshold = self.config.threshold;

        let consensus = if score >= threshold {
            Signal::Call
        } else if score <= -threshold {
            Signal::Put
        } else {
            Signal::Wait
        };

        let (signal, reason) = if votes.is_squeezing() {
            (Signal::Wait, DecisionReason::SqueezeVeto)
        } else if self.config.veto_high_risk && risk == RiskLevel::High {
            (Signal::Wait, DecisionReason::HighRiskVeto)
        } else if consensus == Signal::Wait {
            (Signal::Wait, DecisionReason::BelowThreshold)
        } else {
            (consensus, DecisionReason::Consensus)
        };

        TradeDecision {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            signal,
            score,
            duration: self.duration(votes),
            reason,
            risk,
            insights: self.insights(votes),
            votes: votes.snapshot(),
        }
    }
}
