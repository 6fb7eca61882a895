use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::SeriesError;

/// Metadata key set by the trend-strength analyst when ADX is above its threshold
pub const META_STRONG_TREND: &str = "strongTrend";
/// Metadata key carrying an analyst status flag
pub const META_STATUS: &str = "status";
/// Status value reported by the squeeze analyst during volatility compression
pub const STATUS_SQUEEZING: &str = "SQUEEZING";

/// OHLCV candlestick data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    #[serde(default)]
    volume: Option<Vec<f64>>,
}

/// Parallel OHLC(V) sequences, oldest first, newest last.
///
/// This is the shape the market-data feed delivers. Construction validates
/// that every column has the same length and only finite values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawSeries")]
pub struct CandleSeries {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<Vec<f64>>,
}

impl CandleSeries {
    pub fn new(
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Option<Vec<f64>>,
    ) -> Result<Self, SeriesError> {
        let expected = close.len();
        let mut columns = vec![("open", &open), ("high", &high), ("low", &low), ("close", &close)];
        if let Some(volume) = volume.as_ref() {
            columns.push(("volume", volume));
        }

        for &(column, values) in &columns {
            if values.len() != expected {
                return Err(SeriesError::LengthMismatch {
                    column,
                    expected,
                    actual: values.len(),
                });
            }
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(SeriesError::NonFinite { column, index });
            }
        }

        Ok(Self {
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Build a series from timestamped candles (volume always present)
    pub fn from_candles(candles: &[Candle]) -> Result<Self, SeriesError> {
        Self::new(
            candles.iter().map(|c| c.open).collect(),
            candles.iter().map(|c| c.high).collect(),
            candles.iter().map(|c| c.low).collect(),
            candles.iter().map(|c| c.close).collect(),
            Some(candles.iter().map(|c| c.volume).collect()),
        )
    }

    pub fn empty() -> Self {
        Self {
            open: Vec::new(),
            high: Vec::new(),
            low: Vec::new(),
            close: Vec::new(),
            volume: None,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> Option<&[f64]> {
        self.volume.as_deref()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close.last().copied()
    }
}

impl TryFrom<RawSeries> for CandleSeries {
    type Error = SeriesError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Self::new(raw.open, raw.high, raw.low, raw.close, raw.volume)
    }
}

/// Trade direction issued by the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Call,
    Put,
    Wait,
}

impl Signal {
    /// Whether a vote of this sign agrees with the signal
    pub fn agrees_with(&self, vote: i32) -> bool {
        match self {
            Signal::Call => vote > 0,
            Signal::Put => vote < 0,
            Signal::Wait => false,
        }
    }

    pub fn is_trade(&self) -> bool {
        !matches!(self, Signal::Wait)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Call => write!(f, "CALL"),
            Signal::Put => write!(f, "PUT"),
            Signal::Wait => write!(f, "WAIT"),
        }
    }
}

/// One analyst's output for one cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteReport {
    /// Signed conviction; 0 means abstain
    pub value: i32,
    /// Suggested holding duration in candles
    pub duration: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl VoteReport {
    pub fn new(value: i32, duration: u32) -> Self {
        Self {
            value,
            duration: duration.max(1),
            meta: BTreeMap::new(),
        }
    }

    pub fn abstain(duration: u32) -> Self {
        Self::new(0, duration)
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_abstain(&self) -> bool {
        self.value == 0
    }

    pub fn strong_trend(&self) -> bool {
        self.meta.get(META_STRONG_TREND).map(String::as_str) == Some("true")
    }

    pub fn is_squeezing(&self) -> bool {
        self.meta.get(META_STATUS).map(String::as_str) == Some(STATUS_SQUEEZING)
    }
}

/// Raw (unweighted) votes of every analyst for one cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct VoteSnapshot(BTreeMap<String, i32>);

impl VoteSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, vote: i32) {
        self.0.insert(name.into(), vote);
    }

    pub fn get(&self, name: &str) -> i32 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(name, vote)| (name.as_str(), *vote))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, i32)> for VoteSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, i32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Neutral weight for an analyst with no history
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Per-analyst trust multipliers applied to raw votes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<String, f64>);

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with every named analyst at the neutral weight
    pub fn with_defaults<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .map(|name| (name.into(), DEFAULT_WEIGHT))
                .collect(),
        )
    }

    /// Weight for an analyst, neutral if unknown
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn set(&mut self, name: impl Into<String>, weight: f64) {
        self.0.insert(name.into(), weight);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, weight)| (name.as_str(), *weight))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut f64)> {
        self.0.iter_mut().map(|(name, weight)| (name.as_str(), weight))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    Consensus,
    BelowThreshold,
    SqueezeVeto,
    HighRiskVeto,
    InsufficientData { have: usize, need: usize },
    IndicatorFailure { message: String },
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::Consensus => write!(f, "consensus reached"),
            DecisionReason::BelowThreshold => write!(f, "score below threshold"),
            DecisionReason::SqueezeVeto => write!(f, "volatility squeeze veto"),
            DecisionReason::HighRiskVeto => write!(f, "high-risk trend veto"),
            DecisionReason::InsufficientData { have, need } => {
                write!(f, "insufficient data: {} candles, need {}", have, need)
            }
            DecisionReason::IndicatorFailure { message } => {
                write!(f, "indicator failure: {}", message)
            }
        }
    }
}

/// Trend risk classification derived from ADX
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    High,
}

/// Output of one analysis cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDecision {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub signal: Signal,
    pub score: f64,
    pub duration: u32,
    pub reason: DecisionReason,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default)]
    pub insights: Vec<String>,
    pub votes: VoteSnapshot,
}

impl TradeDecision {
    /// A WAIT decision that never reached the panel
    pub fn wait(reason: DecisionReason, duration: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            signal: Signal::Wait,
            score: 0.0,
            duration,
            reason,
            risk: RiskLevel::Low,
            insights: Vec::new(),
            votes: VoteSnapshot::new(),
        }
    }

    /// Build the settlement record for this decision
    pub fn outcome(&self, won: bool) -> TradeOutcome {
        TradeOutcome {
            decision_id: Some(self.id),
            signal: self.signal,
            won,
            votes: self.votes.clone(),
        }
    }
}

/// Settlement report for a trade that has resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOutcome {
    #[serde(default)]
    pub decision_id: Option<Uuid>,
    pub signal: Signal,
    pub won: bool,
    pub votes: VoteSnapshot,
}
