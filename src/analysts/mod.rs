// Analyst panel module
pub mod momentum;
pub mod pattern;
pub mod trend;
pub mod volatility;

use crate::indicators::IndicatorSnapshot;
use crate::models::{CandleSeries, VoteReport, VoteSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

/// Name of the trend-strength analyst evaluated before the rest of the panel
pub const TREND_ANALYST: &str = "adx_trend";

/// Everything an analyst may look at during one cycle
pub struct AnalystInput<'a> {
    pub candles: &'a CandleSeries,
    pub indicators: &'a IndicatorSnapshot,
    pub thresholds: &'a PanelThresholds,
    /// Trend-strength report, present only in the second evaluation phase
    pub trend: Option<&'a VoteReport>,
}

impl AnalystInput<'_> {
    /// Whether the trend-strength analyst flagged a strong trend this cycle
    pub fn strong_trend(&self) -> bool {
        self.trend.is_some_and(VoteReport::strong_trend)
    }

    pub fn last_close(&self) -> anyhow::Result<f64> {
        self.candles
            .last_close()
            .ok_or_else(|| anyhow::anyhow!("candle series is empty"))
    }
}

type VoteFn = dyn Fn(&AnalystInput<'_>) -> anyhow::Result<VoteReport> + Send + Sync;

/// A named vote function
pub struct Analyst {
    name: String,
    fallback_duration: u32,
    evaluate: Box<VoteFn>,
}

impl Analyst {
    /// Register a vote function under `name`
    ///
    /// `fallback_duration` is reported alongside the abstention when the
    /// function fails.
    pub fn new<F>(name: impl Into<String>, fallback_duration: u32, evaluate: F) -> Self
    where
        F: Fn(&AnalystInput<'_>) -> anyhow::Result<VoteReport> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            fallback_duration: fallback_duration.max(1),
            evaluate: Box::new(evaluate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate, degrading any failure (including a panic) to an abstention
    pub fn vote(&self, input: &AnalystInput<'_>) -> VoteReport {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.evaluate)(input)))
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload)))
            });

        match outcome {
            Ok(report) => report,
            Err(e) => {
                tracing::debug!("Analyst {} abstained after failure: {}", self.name, e);
                VoteReport::abstain(self.fallback_duration)
            }
        }
    }
}

impl std::fmt::Debug for Analyst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyst")
            .field("name", &self.name)
            .field("fallback_duration", &self.fallback_duration)
            .finish()
    }
}

/// Thresholds used by the standard analysts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stochastic_low: f64,
    pub stochastic_high: f64,
    pub williams_low: f64,
    pub williams_high: f64,
    /// Absolute ROC percentage treated as overextended
    pub roc_limit: f64,
    pub cci_limit: f64,
    /// ADX level above which the trend analyst flags a strong trend
    pub adx_strong_trend: f64,
    /// Current ATR relative to its trailing mean that counts as expansion
    pub atr_spike_ratio: f64,
    pub atr_lookback: usize,
    /// Current volume relative to its trailing mean that counts as a spike
    pub volume_spike_ratio: f64,
    pub volume_lookback: usize,
    pub streak_window: usize,
    pub streak_min: usize,
    /// Wick length relative to body for hammer / shooting star bars
    pub wick_body_ratio: f64,
    pub obv_lookback: usize,
}

impl Default for PanelThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 20.0,
            rsi_overbought: 80.0,
            stochastic_low: 20.0,
            stochastic_high: 80.0,
            williams_low: -90.0,
            williams_high: -10.0,
            roc_limit: 1.0,
            cci_limit: 150.0,
            adx_strong_trend: 35.0,
            atr_spike_ratio: 1.3,
            atr_lookback: 10,
            volume_spike_ratio: 2.0,
            volume_lookback: 20,
            streak_window: 5,
            streak_min: 4,
            wick_body_ratio: 2.0,
            obv_lookback: 10,
        }
    }
}

/// Every analyst's report for one cycle
#[derive(Debug, Clone, Default)]
pub struct PanelVotes {
    reports: BTreeMap<String, VoteReport>,
}

impl PanelVotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, report: VoteReport) {
        self.reports.insert(name.into(), report);
    }

    pub fn get(&self, name: &str) -> Option<&VoteReport> {
        self.reports.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VoteReport)> {
        self.reports.iter().map(|(name, report)| (name.as_str(), report))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Whether any analyst reported a volatility squeeze
    pub fn is_squeezing(&self) -> bool {
        self.reports.values().any(VoteReport::is_squeezing)
    }

    /// Raw vote values, the record later replayed into the learner
    pub fn snapshot(&self) -> VoteSnapshot {
        self.reports
            .iter()
            .map(|(name, report)| (name.clone(), report.value))
            .collect()
    }
}

/// Registry of analysts, evaluated in two phases.
///
/// Phase one runs the trend-strength analyst alone. Phase two runs every other
/// analyst with that report passed in, so dependents read it as an argument
/// instead of looking it up.
#[derive(Debug)]
pub struct AnalystPanel {
    trend: Option<Analyst>,
    analysts: Vec<Analyst>,
    thresholds: PanelThresholds,
}

impl AnalystPanel {
    /// An empty panel
    pub fn new(thresholds: PanelThresholds) -> Self {
        Self {
            trend: None,
            analysts: Vec::new(),
            thresholds,
        }
    }

    /// The standard seventeen-analyst panel
    pub fn standard(thresholds: PanelThresholds) -> Self {
        let mut panel = Self::new(thresholds);

        panel.set_trend_analyst(Analyst::new(TREND_ANALYST, 5, trend::adx_trend));

        panel.register(Analyst::new("rsi_extremes", 2, momentum::rsi_extremes));
        panel.register(Analyst::new("stochastic_cross", 1, momentum::stochastic_cross));
        panel.register(Analyst::new("williams_r", 1, momentum::williams_r));
        panel.register(Analyst::new("macd_histogram", 3, momentum::macd_histogram));
        panel.register(Analyst::new("rate_of_change", 2, momentum::rate_of_change));
        panel.register(Analyst::new("cci_extremes", 2, momentum::cci_extremes));

        panel.register(Analyst::new("bollinger_reversion", 2, volatility::bollinger_reversion));
        panel.register(Analyst::new("keltner_bias", 2, volatility::keltner_bias));
        panel.register(Analyst::new("atr_expansion", 1, volatility::atr_expansion));
        panel.register(Analyst::new("squeeze", 3, volatility::squeeze));

        panel.register(Analyst::new("ema200_regime", 5, trend::ema200_regime));
        panel.register(Analyst::new("parabolic_sar", 4, trend::parabolic_sar));
        panel.register(Analyst::new("obv_trend", 4, trend::obv_trend));

        panel.register(Analyst::new("candle_streak", 3, pattern::candle_streak));
        panel.register(Analyst::new("hammer_wick", 1, pattern::hammer_wick));
        panel.register(Analyst::new("volume_spike", 1, pattern::volume_spike));

        panel
    }

    /// Install the analyst whose report is handed to the rest of the panel
    pub fn set_trend_analyst(&mut self, analyst: Analyst) {
        self.analysts.retain(|a| a.name() != analyst.name());
        self.trend = Some(analyst);
    }

    /// Add an analyst, replacing any existing one with the same name
    pub fn register(&mut self, analyst: Analyst) {
        if self.trend.as_ref().is_some_and(|t| t.name() == analyst.name()) {
            self.trend = None;
        }
        self.analysts.retain(|a| a.name() != analyst.name());
        self.analysts.push(analyst);
    }

    pub fn thresholds(&self) -> &PanelThresholds {
        &self.thresholds
    }

    /// Names of every registered analyst, trend analyst first
    pub fn names(&self) -> Vec<String> {
        self.trend
            .iter()
            .chain(self.analysts.iter())
            .map(|a| a.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.analysts.len() + usize::from(self.trend.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the whole panel against one cycle's data
    pub fn evaluate(&self, candles: &CandleSeries, indicators: &IndicatorSnapshot) -> PanelVotes {
        let mut votes = PanelVotes::new();

        // Phase 1: trend strength
        let trend_report = self.trend.as_ref().map(|analyst| {
            let input = AnalystInput {
                candles,
                indicators,
                thresholds: &self.thresholds,
                trend: None,
            };
            (analyst.name(), analyst.vote(&input))
        });

        // Phase 2: everyone else, with the trend report as input
        let input = AnalystInput {
            candles,
            indicators,
            thresholds: &self.thresholds,
            trend: trend_report.as_ref().map(|(_, report)| report),
        };

        for analyst in &self.analysts {
            votes.insert(analyst.name(), analyst.vote(&input));
        }

        if let Some((name, report)) = trend_report {
            votes.insert(name, report);
        }

        votes
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Signed vote from a direction and a magnitude
pub(crate) fn directional(delta: f64, magnitude: i32) -> i32 {
    if delta > 0.0 {
        magnitude
    } else if delta < 0.0 {
        -magnitude
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Indicator;
    use crate::models::META_STRONG_TREND;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn flat_series(len: usize) -> CandleSeries {
        CandleSeries::new(
            vec![100.0; len],
            vec![101.0; len],
            vec![99.0; len],
            vec![100.0; len],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_standard_panel_has_seventeen_analysts() {
        let panel = AnalystPanel::standard(PanelThresholds::default());
        let names = panel.names();

        assert_eq!(panel.len(), 17);
        assert_eq!(names[0], TREND_ANALYST);
        assert!(names.contains(&"squeeze".to_string()));
    }

    #[test]
    fn test_failing_analyst_abstains() {
        let mut panel = AnalystPanel::new(PanelThresholds::default());
        panel.register(Analyst::new("broken", 4, |_| anyhow::bail!("boom")));
        panel.register(Analyst::new("steady", 2, |_| Ok(VoteReport::new(2, 2))));

        let votes = panel.evaluate(&flat_series(10), &IndicatorSnapshot::new());

        assert_eq!(votes.get("broken"), Some(&VoteReport::abstain(4)));
        assert_eq!(votes.get("steady").map(|r| r.value), Some(2));
    }

    #[test]
    fn test_panicking_analyst_abstains() {
        let mut panel = AnalystPanel::new(PanelThresholds::default());
        panel.register(Analyst::new("overrun", 3, |input| {
            let close = input.candles.close();
            Ok(VoteReport::new(close[close.len() + 5] as i32, 1))
        }));
        panel.register(Analyst::new("steady", 2, |_| Ok(VoteReport::new(2, 2))));

        let votes = panel.evaluate(&flat_series(10), &IndicatorSnapshot::new());

        assert_eq!(votes.get("overrun"), Some(&VoteReport::abstain(3)));
        assert_eq!(votes.get("steady").map(|r| r.value), Some(2));
    }

    #[test]
    fn test_panicking_trend_analyst_still_runs_panel() {
        let mut panel = AnalystPanel::new(PanelThresholds::default());
        panel.set_trend_analyst(Analyst::new(TREND_ANALYST, 5, |_| panic!("no adx")));
        panel.register(Analyst::new("steady", 2, |input| {
            Ok(VoteReport::new(if input.strong_trend() { 0 } else { 2 }, 2))
        }));

        let votes = panel.evaluate(&flat_series(10), &IndicatorSnapshot::new());

        assert_eq!(votes.get(TREND_ANALYST), Some(&VoteReport::abstain(5)));
        assert_eq!(votes.get("steady").map(|r| r.value), Some(2));
    }

    #[test]
    fn test_trend_analysts_outvote_single_bar_patterns() {
        // Twenty green bars closing on a hammer with a volume spike
        let mut open: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let mut close: Vec<f64> = open.iter().map(|o| o + 0.5).collect();
        let mut high: Vec<f64> = close.iter().map(|c| c + 0.2).collect();
        let mut low: Vec<f64> = open.iter().map(|o| o - 0.2).collect();
        open.push(120.0);
        close.push(120.2);
        high.push(120.25);
        low.push(118.0);
        let mut volume = vec![1000.0; 20];
        volume.push(5000.0);
        let candles = CandleSeries::new(open, high, low, close, Some(volume)).unwrap();

        let mut snapshot = IndicatorSnapshot::new();
        snapshot.insert(Indicator::Adx, vec![42.0]);
        snapshot.insert(Indicator::PlusDi, vec![30.0]);
        snapshot.insert(Indicator::MinusDi, vec![10.0]);
        snapshot.insert(Indicator::EmaLong, vec![100.0]);
        snapshot.insert(Indicator::Psar, vec![110.0]);
        snapshot.insert(Indicator::Obv, (0..21).map(|i| i as f64 * 100.0).collect());

        let panel = AnalystPanel::standard(PanelThresholds::default());
        let votes = panel.evaluate(&candles, &snapshot);
        let magnitude = |name: &str| votes.get(name).map_or(0, |r| r.value.abs());

        let single_bar = ["hammer_wick", "volume_spike"];
        assert!(single_bar.iter().all(|name| magnitude(name) == 1));

        for name in [TREND_ANALYST, "ema200_regime", "parabolic_sar", "obv_trend"] {
            for pattern in single_bar {
                assert!(
                    magnitude(name) > magnitude(pattern),
                    "{} ({}) should outvote {} ({})",
                    name,
                    magnitude(name),
                    pattern,
                    magnitude(pattern)
                );
            }
        }
    }

    #[test]
    fn test_empty_snapshot_degrades_whole_panel_to_abstain() {
        let panel = AnalystPanel::standard(PanelThresholds::default());
        let votes = panel.evaluate(&flat_series(10), &IndicatorSnapshot::new());

        assert_eq!(votes.len(), 17);
        assert!(votes.snapshot().iter().all(|(_, v)| v == 0));
    }

    #[test]
    fn test_trend_report_reaches_dependents() {
        let mut panel = AnalystPanel::new(PanelThresholds::default());
        panel.set_trend_analyst(Analyst::new(TREND_ANALYST, 5, |_| {
            Ok(VoteReport::new(5, 5).with_meta(META_STRONG_TREND, "true"))
        }));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        panel.register(Analyst::new("dependent", 2, move |input| {
            if input.strong_trend() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(VoteReport::abstain(2))
        }));

        let votes = panel.evaluate(&flat_series(10), &IndicatorSnapshot::new());

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(votes.get(TREND_ANALYST).map(|r| r.value), Some(5));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut panel = AnalystPanel::new(PanelThresholds::default());
        panel.register(Analyst::new("twin", 1, |_| Ok(VoteReport::new(1, 1))));
        panel.register(Analyst::new("twin", 1, |_| Ok(VoteReport::new(-1, 1))));

        let votes = panel.evaluate(&flat_series(5), &IndicatorSnapshot::new());
        assert_eq!(panel.len(), 1);
        assert_eq!(votes.get("twin").map(|r| r.value), Some(-1));
    }

    #[test]
    fn test_snapshot_carries_raw_values() {
        let mut snapshot = IndicatorSnapshot::new();
        snapshot.insert(Indicator::Rsi, vec![10.0]);

        let mut panel = AnalystPanel::new(PanelThresholds::default());
        panel.register(Analyst::new("rsi_extremes", 2, momentum::rsi_extremes));

        let votes = panel.evaluate(&flat_series(5), &snapshot);
        assert_eq!(votes.snapshot().get("rsi_extremes"), 3);
    }

    #[test]
    fn test_directional() {
        assert_eq!(directional(0.5, 2), 2);
        assert_eq!(directional(-0.5, 2), -2);
        assert_eq!(directional(0.0, 2), 0);
    }
}
