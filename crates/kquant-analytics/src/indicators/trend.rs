//! 추세 지표 (SMA / EMA / MACD).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{check_period, IndicatorResult};

/// MACD 한 시점의 결과.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdPoint {
    /// MACD 라인 (단기 EMA - 장기 EMA)
    pub macd: Option<Decimal>,
    /// 시그널 라인 (MACD의 EMA)
    pub signal: Option<Decimal>,
    /// 히스토그램 (MACD - 시그널)
    pub histogram: Option<Decimal>,
}

impl MacdPoint {
    /// 상향 돌파 상태(MACD > 시그널, 히스토그램 양수)인지 확인.
    pub fn is_bullish(&self) -> bool {
        matches!(
            (self.macd, self.signal, self.histogram),
            (Some(m), Some(s), Some(h)) if m > s && h > Decimal::ZERO
        )
    }
}

/// 단순 이동평균 (SMA).
///
/// 처음 `period - 1`개는 None.
pub fn sma(prices: &[Decimal], period: usize) -> IndicatorResult<Vec<Option<Decimal>>> {
    check_period(period, prices.len(), period)?;

    let period_decimal = Decimal::from(period);
    let mut result = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        if i + 1 < period {
            result.push(None);
        } else {
            let sum: Decimal = prices[i + 1 - period..=i].iter().sum();
            result.push(Some(sum / period_decimal));
        }
    }

    Ok(result)
}

/// 지수 이동평균 (EMA).
///
/// 첫 EMA는 SMA로 시작하고 이후 `k = 2 / (period + 1)`로 갱신합니다.
pub fn ema(prices: &[Decimal], period: usize) -> IndicatorResult<Vec<Option<Decimal>>> {
    check_period(period, prices.len(), period)?;

    let multiplier = dec!(2) / Decimal::from(period + 1);
    let mut result = Vec::with_capacity(prices.len());

    for _ in 0..period - 1 {
        result.push(None);
    }

    let initial_sma: Decimal = prices[..period].iter().sum::<Decimal>() / Decimal::from(period);
    result.push(Some(initial_sma));

    let mut prev_ema = initial_sma;
    for price in prices.iter().skip(period) {
        let value = (*price * multiplier) + (prev_ema * (Decimal::ONE - multiplier));
        result.push(Some(value));
        prev_ema = value;
    }

    Ok(result)
}

/// MACD (12/26/9 기본).
///
/// MACD 라인 = 단기 EMA - 장기 EMA,
/// 시그널 라인 = MACD 라인의 EMA,
/// 히스토그램 = MACD - 시그널.
pub fn macd(
    prices: &[Decimal],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> IndicatorResult<Vec<MacdPoint>> {
    check_period(
        slow_period,
        prices.len(),
        slow_period + signal_period,
    )?;

    let fast_ema = ema(prices, fast_period)?;
    let slow_ema = ema(prices, slow_period)?;

    let macd_line: Vec<Option<Decimal>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|pair| match pair {
            (Some(fast), Some(slow)) => Some(*fast - *slow),
            _ => None,
        })
        .collect();

    // 시그널은 MACD가 정의된 구간에 대해서만 EMA를 적용
    let macd_values: Vec<Decimal> = macd_line.iter().flatten().copied().collect();
    let signal_ema = if macd_values.len() >= signal_period {
        ema(&macd_values, signal_period)?
    } else {
        vec![None; macd_values.len()]
    };

    let mut result = Vec::with_capacity(prices.len());
    let mut signal_idx = 0;

    for macd_val in macd_line {
        if macd_val.is_some() {
            let signal = signal_ema.get(signal_idx).copied().flatten();
            let histogram = match (macd_val, signal) {
                (Some(m), Some(s)) => Some(m - s),
                _ => None,
            };
            result.push(MacdPoint {
                macd: macd_val,
                signal,
                histogram,
            });
            signal_idx += 1;
        } else {
            result.push(MacdPoint {
                macd: None,
                signal: None,
                histogram: None,
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prices() -> Vec<Decimal> {
        vec![
            dec!(100),
            dec!(102),
            dec!(101),
            dec!(103),
            dec!(105),
            dec!(104),
            dec!(106),
            dec!(108),
            dec!(107),
            dec!(109),
        ]
    }

    #[test]
    fn test_sma_basic() {
        let result = sma(&sample_prices(), 3).unwrap();

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        // (100 + 102 + 101) / 3 = 101
        assert_eq!(result[2], Some(dec!(101)));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let err = sma(&[dec!(100)], 3).unwrap_err();
        match err {
            super::super::IndicatorError::InsufficientData { required, provided } => {
                assert_eq!(required, 3);
                assert_eq!(provided, 1);
            }
            other => panic!("예상치 못한 오류: {other}"),
        }
    }

    #[test]
    fn test_ema_starts_at_sma() {
        let result = ema(&sample_prices(), 3).unwrap();

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_eq!(result[2], Some(dec!(101)));
        assert!(result[9].is_some());
    }

    #[test]
    fn test_macd_length_and_warmup() {
        let prices: Vec<Decimal> = (0..50).map(|i| Decimal::from(100 + i)).collect();
        let result = macd(&prices, 12, 26, 9).unwrap();

        assert_eq!(result.len(), prices.len());
        assert!(result[0].macd.is_none());
        assert!(result[40].macd.is_some());
        // 등속 상승에서는 MACD가 시그널에 수렴해 히스토그램이 0 근처에 머문다
        let point = &result[45];
        assert!(point.macd.unwrap() > Decimal::ZERO);
        assert!(point.signal.is_some());
        assert!(point.histogram.is_some());
    }

    #[test]
    fn test_macd_bullish_on_accelerating_series() {
        // 상승 폭이 커지는 시계열에서는 MACD가 시그널 위에 머문다
        let prices: Vec<Decimal> = (0i64..50).map(|i| Decimal::from(100 + i * i)).collect();
        let result = macd(&prices, 12, 26, 9).unwrap();

        assert!(result[45].is_bullish());
        assert!(result[45].histogram.unwrap() > Decimal::ZERO);
    }
}
