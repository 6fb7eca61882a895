//! Trend and structure analysts. These carry the largest magnitudes and the
//! longest suggested durations on the panel.

use super::{directional, AnalystInput};
use crate::indicators::Indicator;
use crate::models::{VoteReport, META_STRONG_TREND};

/// Trend-strength analyst: votes ±5 with the dominant directional index when
/// ADX exceeds `adx_strong_trend`, and flags `strongTrend` for its dependents.
pub fn adx_trend(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let adx = input.indicators.last(Indicator::Adx)?;

    if adx <= input.thresholds.adx_strong_trend {
        return Ok(VoteReport::abstain(5));
    }

    let plus_di = input.indicators.last(Indicator::PlusDi)?;
    let minus_di = input.indicators.last(Indicator::MinusDi)?;

    Ok(VoteReport::new(directional(plus_di - minus_di, 5), 5)
        .with_meta(META_STRONG_TREND, "true")
        .with_meta("adx", &format!("{:.1}", adx)))
}

/// Long-term regime: close above or below EMA(200)
pub fn ema200_regime(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let price = input.last_close()?;
    let ema = input.indicators.last(Indicator::EmaLong)?;

    Ok(VoteReport::new(directional(price - ema, 2), 5))
}

pub fn parabolic_sar(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let price = input.last_close()?;
    let sar = input.indicators.last(Indicator::Psar)?;

    Ok(VoteReport::new(directional(price - sar, 2), 4))
}

/// Votes when On-Balance Volume confirms the price move over `obv_lookback`
pub fn obv_trend(input: &AnalystInput<'_>) -> anyhow::Result<VoteReport> {
    let lookback = input.thresholds.obv_lookback;
    let obv = input.indicators.recent(Indicator::Obv, lookback + 1)?;

    let close = input.candles.close();
    if close.len() < lookback + 1 {
        anyhow::bail!("need {} closes for OBV confirmation", lookback + 1);
    }

    let obv_slope = obv[lookback] - obv[0];
    let price_slope = close[close.len() - 1] - close[close.len() - 1 - lookback];

    let vote = match (directional(obv_slope, 2), directional(price_slope, 2)) {
        (a, b) if a == b => a,
        _ => 0,
    };

    Ok(VoteReport::new(vote, 4))
}
