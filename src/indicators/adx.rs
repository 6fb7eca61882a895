/// Average Directional Index (ADX) - Measures trend strength
///
/// ADX ranges from 0 to 100:
/// - ADX > 35: Strong trend (bull or bear)
/// - ADX 20-35: Moderate trend
/// - ADX < 20: Weak trend / choppy / ranging market
///
/// Also returns +DI and -DI to determine trend direction:
/// - +DI > -DI: Uptrend
/// - -DI > +DI: Downtrend
use super::atr::true_ranges;
use super::moving_average::rma_series;
use crate::models::CandleSeries;

/// ADX with its directional components, each trailing-aligned with the candles
#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

/// Calculate ADX, +DI and -DI series
///
/// Needs at least `2 * period` candles: one period to smooth the directional
/// movement and another to smooth DX into ADX.
pub fn adx_series(candles: &CandleSeries, period: usize) -> Option<AdxSeries> {
    if period == 0 || candles.len() < 2 * period {
        return None;
    }

    let (high, low) = (candles.high(), candles.low());

    // Directional Movement
    let mut plus_dms = Vec::with_capacity(candles.len() - 1);
    let mut minus_dms = Vec::with_capacity(candles.len() - 1);

    for i in 1..candles.len() {
        let up_move = high[i] - high[i - 1];
        let down_move = low[i - 1] - low[i];

        plus_dms.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dms.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    // Wilder's smoothing of TR and DM
    let smoothed_tr = rma_series(&true_ranges(candles), period)?;
    let smoothed_plus = rma_series(&plus_dms, period)?;
    let smoothed_minus = rma_series(&minus_dms, period)?;

    let mut plus_di = Vec::with_capacity(smoothed_tr.len());
    let mut minus_di = Vec::with_capacity(smoothed_tr.len());
    let mut dx = Vec::with_capacity(smoothed_tr.len());

    for ((tr, plus), minus) in smoothed_tr.iter().zip(&smoothed_plus).zip(&smoothed_minus) {
        let (pdi, mdi) = if *tr > 0.0 {
            (plus / tr * 100.0, minus / tr * 100.0)
        } else {
            (0.0, 0.0)
        };

        let di_sum = pdi + mdi;
        dx.push(if di_sum > 0.0 {
            (pdi - mdi).abs() / di_sum * 100.0
        } else {
            0.0
        });
        plus_di.push(pdi);
        minus_di.push(mdi);
    }

    let adx = rma_series(&dx, period)?;

    Some(AdxSeries {
        adx,
        plus_di,
        minus_di,
    })
}
