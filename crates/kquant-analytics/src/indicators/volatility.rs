//! 변동성 지표 (ATR).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{check_period, IndicatorResult};

/// ATR (평균 실제 범위).
///
/// True Range = max(고가-저가, |고가-전일종가|, |저가-전일종가|),
/// 초기 ATR은 단순 평균, 이후 `alpha = 1 / period` EMA로 갱신합니다.
pub fn atr(
    high: &[Decimal],
    low: &[Decimal],
    close: &[Decimal],
    period: usize,
) -> IndicatorResult<Vec<Option<Decimal>>> {
    let len = high.len().min(low.len()).min(close.len());
    check_period(period, len, period + 1)?;

    let mut true_ranges = Vec::with_capacity(len);
    true_ranges.push(high[0] - low[0]);
    for i in 1..len {
        let hl = high[i] - low[i];
        let hc = (high[i] - close[i - 1]).abs();
        let lc = (low[i] - close[i - 1]).abs();
        true_ranges.push(hl.max(hc).max(lc));
    }

    let alpha = Decimal::ONE / Decimal::from(period);
    let one_minus_alpha = Decimal::ONE - alpha;
    let mut result: Vec<Option<Decimal>> = Vec::with_capacity(len);

    for i in 0..len {
        if i + 1 < period {
            result.push(None);
        } else if i + 1 == period {
            let sum: Decimal = true_ranges[..=i].iter().sum();
            result.push(Some(sum / Decimal::from(period)));
        } else {
            match result[i - 1] {
                Some(prev_atr) => {
                    result.push(Some((true_ranges[i] * alpha) + (prev_atr * one_minus_alpha)));
                }
                None => result.push(None),
            }
        }
    }

    Ok(result)
}

/// ATR 퍼센트 (ATR / 종가 × 100).
pub fn atr_percent(
    high: &[Decimal],
    low: &[Decimal],
    close: &[Decimal],
    period: usize,
) -> IndicatorResult<Vec<Option<Decimal>>> {
    let atr_values = atr(high, low, close, period)?;
    let len = close.len().min(atr_values.len());

    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        match atr_values[i] {
            Some(value) if close[i] != Decimal::ZERO => {
                result.push(Some((value / close[i]) * dec!(100)));
            }
            _ => result.push(None),
        }
    }

    Ok(result)
}
