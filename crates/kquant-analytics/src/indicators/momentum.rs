//! 모멘텀 지표 (RSI).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{check_period, IndicatorResult};

/// RSI (상대강도지수).
///
/// pandas의 `ewm(com=period-1, min_periods=period)`과 동일한 EWM 평활을
/// 사용합니다 (`alpha = 1 / period`). 반환값은 0~100.
pub fn rsi(prices: &[Decimal], period: usize) -> IndicatorResult<Vec<Option<Decimal>>> {
    check_period(period, prices.len(), period + 1)?;

    let mut deltas = Vec::with_capacity(prices.len());
    deltas.push(Decimal::ZERO);
    for i in 1..prices.len() {
        deltas.push(prices[i] - prices[i - 1]);
    }

    let gains: Vec<Decimal> = deltas
        .iter()
        .map(|&d| if d > Decimal::ZERO { d } else { Decimal::ZERO })
        .collect();
    let losses: Vec<Decimal> = deltas
        .iter()
        .map(|&d| if d < Decimal::ZERO { d.abs() } else { Decimal::ZERO })
        .collect();

    let alpha = Decimal::ONE / Decimal::from(period);
    let avg_gains = ewm(&gains, alpha, period);
    let avg_losses = ewm(&losses, alpha, period);

    let mut result = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        match (avg_gains[i], avg_losses[i]) {
            (Some(gain), Some(loss)) => {
                if loss == Decimal::ZERO {
                    result.push(Some(dec!(100)));
                } else {
                    let rs = gain / loss;
                    result.push(Some(dec!(100) - (dec!(100) / (Decimal::ONE + rs))));
                }
            }
            _ => result.push(None),
        }
    }

    Ok(result)
}

/// EWM (Exponential Weighted Mean).
///
/// 초기값은 `min_periods` 구간의 단순 평균으로 시작합니다.
fn ewm(values: &[Decimal], alpha: Decimal, min_periods: usize) -> Vec<Option<Decimal>> {
    let one_minus_alpha = Decimal::ONE - alpha;
    let mut result = Vec::with_capacity(values.len());

    if values.is_empty() {
        return result;
    }

    let mut ewm_value = values[0];

    for i in 0..values.len() {
        if i + 1 < min_periods {
            result.push(None);
            if i > 0 {
                ewm_value = (values[i] * alpha) + (ewm_value * one_minus_alpha);
            }
        } else if i + 1 == min_periods {
            let sum: Decimal = values[..=i].iter().sum();
            ewm_value = sum / Decimal::from(i + 1);
            result.push(Some(ewm_value));
        } else {
            ewm_value = (values[i] * alpha) + (ewm_value * one_minus_alpha);
            result.push(Some(ewm_value));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_all_gains_is_100() {
        let prices: Vec<Decimal> = (0..20).map(|i| Decimal::from(100 + i)).collect();
        let result = rsi(&prices, 14).unwrap();

        assert!(result[0].is_none());
        assert_eq!(result[19], Some(dec!(100)));
    }

    #[test]
    fn test_rsi_range() {
        let prices: Vec<Decimal> = vec![
            dec!(100),
            dec!(99),
            dec!(101),
            dec!(98),
            dec!(102),
            dec!(100),
            dec!(103),
            dec!(101),
            dec!(104),
            dec!(102),
            dec!(105),
            dec!(103),
            dec!(106),
            dec!(104),
            dec!(107),
            dec!(105),
        ];
        let result = rsi(&prices, 14).unwrap();

        for value in result.iter().flatten() {
            assert!(*value >= Decimal::ZERO && *value <= dec!(100));
        }
        assert!(result.last().copied().flatten().is_some());
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let prices: Vec<Decimal> = (0..10).map(Decimal::from).collect();
        assert!(rsi(&prices, 14).is_err());
    }
}
