/// Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 80: Overbought
/// - RSI < 20: Oversold
///
/// Gains and losses are smoothed with Wilder's running average.
use super::moving_average::rma_series;

/// Calculate the RSI series for closing prices
///
/// Returns `prices.len() - period` values, the last aligned with the last price.
pub fn rsi_series(prices: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);

    for window in prices.windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let avg_gains = rma_series(&gains, period)?;
    let avg_losses = rma_series(&losses, period)?;

    let rsi = avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(&gain, &loss)| {
            if loss == 0.0 {
                if gain == 0.0 {
                    50.0
                } else {
                    100.0
                }
            } else {
                100.0 - (100.0 / (1.0 + gain / loss))
            }
        })
        .collect();

    Some(rsi)
}
