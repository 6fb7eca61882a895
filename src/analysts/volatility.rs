//! Volatility-envelope analysts, including the two that interact with the
//! rest of the panel: the trend-gated band reversion and the squeeze veto.

use super::{directional, AnalystInput};
use crate::indicators::{is_atr_spike, Indicator};
use crate::models::{VoteReport, META_STATUS, STATUS_SQUEEZING};

/// Fades closes outside the Bollinger Bands, unless the trend analyst flagged
/// a strong trend, in which case it always abstains.
pub fn bollinger_reversion(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    if input.strong_trend() {
        return Ok(VoteReport::abstain(2).with_meta("gated", "strongTrend"));
    }

    let price = input.last_close()?;
    let upper = input.indicators.last(Indicator::BollingerUpper)?;
    let lower = input.indicators.last(Indicator::BollingerLower)?;

    let vote = if price < lower {
        3
    } else if price > upper {
        -3
    } else {
        0
    };

    Ok(VoteReport::new(vote, 2))
}

/// Mean-reversion bias around the Keltner midline
pub fn keltner_bias(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let price = input.last_close()?;
    let middle = input.indicators.last(Indicator::KeltnerMiddle)?;

    Ok(VoteReport::new(directional(middle - price, 1), 2))
}

/// Sides with the latest candle body when ATR expands sharply
pub fn atr_expansion(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let t = input.thresholds;
    let atr = input.indicators.recent(Indicator::Atr, t.atr_lookback + 1)?;

    if !is_atr_spike(atr, t.atr_lookback, t.atr_spike_ratio) {
        return Ok(VoteReport::abstain(1));
    }

    let open = *input
        .candles
        .open()
        .last()
        .ok_or_else(|| anyhow::anyhow!("candle series is empty"))?;
    let close = input.last_close()?;

    Ok(VoteReport::new(directional(close - open, 1), 1))
}

/// Never votes; reports `SQUEEZING` when the Bollinger envelope sits entirely
/// inside the Keltner envelope.
pub fn squeeze(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let bb_upper = input.indicators.last(Indicator::BollingerUpper)?;
    let bb_lower = input.indicators.last(Indicator::BollingerLower)?;
    let kc_upper = input.indicators.last(Indicator::KeltnerUpper)?;
    let kc_lower = input.indicators.last(Indicator::KeltnerLower)?;

    let report = VoteReport::abstain(3);
    if bb_upper < kc_upper && bb_lower > kc_lower {
        Ok(report.with_meta(META_STATUS, STATUS_SQUEEZING))
    } else {
        Ok(report)
    }
}
