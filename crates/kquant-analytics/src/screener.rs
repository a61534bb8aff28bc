//! VCP (변동성 수축 패턴) 스크리너.
//!
//! 베이스를 다지며 변동성이 줄어드는 종목을 찾습니다. ATR 기반의
//! 수축 비율과 고점 근접 조건을 함께 검사하고, 외국인/기관 수급을
//! 0~90점의 `supply_score`로 수치화합니다.
//!
//! 모든 판정은 순수 함수이며 같은 입력에 같은 출력을 보장합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use kquant_core::{PriceSeries, ScreenerConfig, SupplyData};

use crate::indicators::{self, IndicatorError, IndicatorResult};

/// VCP 탐지 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcpDetection {
    /// 수축 패턴 충족 여부 (수축 비율 + 고점 근접 동시 충족)
    pub is_contracted: bool,
    /// 최근 ATR / 과거 ATR (작을수록 수축)
    pub contraction_ratio: f64,
    /// 수급 점수 (0~90)
    pub supply_score: f64,
}

/// VCP 스크리너.
pub struct VcpScreener {
    config: ScreenerConfig,
}

impl VcpScreener {
    pub fn new(config: ScreenerConfig) -> Self {
        Self { config }
    }

    /// 탐지에 필요한 최소 거래일 수.
    pub fn min_bars(&self) -> usize {
        self.config.atr_period + self.config.range_window + 1
    }

    /// VCP 패턴을 탐지합니다.
    pub fn detect(
        &self,
        ticker: &str,
        series: &PriceSeries,
        supply: &SupplyData,
    ) -> IndicatorResult<VcpDetection> {
        let required = self.min_bars();
        if series.len() < required {
            return Err(IndicatorError::InsufficientData {
                required,
                provided: series.len(),
            });
        }

        let contraction_ratio = self.contraction_ratio(series)?;
        let near_high = self.is_near_high(series);
        let is_contracted =
            contraction_ratio <= self.config.contraction_threshold && near_high;

        let supply_score = self.supply_score(series, supply);

        debug!(
            ticker,
            contraction_ratio,
            near_high,
            is_contracted,
            supply_score,
            "VCP 탐지 완료"
        );

        Ok(VcpDetection {
            is_contracted,
            contraction_ratio,
            supply_score,
        })
    }

    /// 최근 ATR을 `range_window`일 전 ATR과 비교한 수축 비율.
    fn contraction_ratio(&self, series: &PriceSeries) -> IndicatorResult<f64> {
        let high: Vec<Decimal> = series.iter().map(|k| k.high).collect();
        let low: Vec<Decimal> = series.iter().map(|k| k.low).collect();
        let close: Vec<Decimal> = series.iter().map(|k| k.close).collect();

        let atr_values = indicators::atr(&high, &low, &close, self.config.atr_period)?;
        let len = atr_values.len();

        let recent = atr_values[len - 1];
        let earlier = atr_values[len - 1 - self.config.range_window];

        match (recent, earlier) {
            (Some(recent), Some(earlier)) if earlier > Decimal::ZERO => Ok((recent / earlier)
                .to_f64()
                .unwrap_or(f64::MAX)),
            _ => Err(IndicatorError::InsufficientData {
                required: self.min_bars(),
                provided: len,
            }),
        }
    }

    /// 종가가 최근 고점의 `near_high_pct`% 이내인지 확인.
    fn is_near_high(&self, series: &PriceSeries) -> bool {
        let Some(last_close) = series.last().map(|k| k.close) else {
            return false;
        };
        let Some(recent_high) = series.iter().map(|k| k.high).max() else {
            return false;
        };
        if recent_high.is_zero() {
            return false;
        }

        let gap_pct = ((recent_high - last_close) / recent_high * Decimal::from(100))
            .to_f64()
            .unwrap_or(f64::MAX);
        gap_pct <= self.config.near_high_pct
    }

    /// 수급 점수 (외국인 + 기관 + 거래량 비율 + 연속 순매수일).
    ///
    /// 각 항목을 자체 추세 기준선으로 정규화한 뒤 상한으로 잘라 더합니다.
    fn supply_score(&self, series: &PriceSeries, supply: &SupplyData) -> f64 {
        let foreign = flow_component(
            supply.foreign_net_5d,
            supply.foreign_net_60d,
            self.config.foreign_cap,
        );
        let institution = flow_component(
            supply.institution_net_5d,
            supply.institution_net_60d,
            self.config.institution_cap,
        );
        let volume = self.volume_component(series);
        let streak = (supply.buy_streak_days as f64 / 5.0).min(1.0) * self.config.streak_cap;

        foreign + institution + volume + streak
    }

    /// 최근 거래량을 20일 평균과 비교한 점수.
    fn volume_component(&self, series: &PriceSeries) -> f64 {
        let len = series.len();
        let window = 20.min(len - 1);
        if window == 0 {
            return 0.0;
        }

        let recent = series[len - 1].volume as f64;
        let avg: f64 = series[len - 1 - window..len - 1]
            .iter()
            .map(|k| k.volume as f64)
            .sum::<f64>()
            / window as f64;

        if avg <= 0.0 {
            return 0.0;
        }
        // 평균의 2배 이상이면 만점
        ((recent / avg) / 2.0).clamp(0.0, 1.0) * self.config.volume_cap
    }
}

/// 5일 순매수를 60일 추세 기준선(12개 5일 구간 평균)으로 정규화한 점수.
fn flow_component(net_5d: Decimal, net_60d: Decimal, cap: f64) -> f64 {
    if net_5d <= Decimal::ZERO {
        return 0.0;
    }

    let baseline = (net_60d.abs() / Decimal::from(12)).to_f64().unwrap_or(0.0);
    let net = net_5d.to_f64().unwrap_or(0.0);

    if baseline <= f64::EPSILON {
        return cap;
    }
    (net / baseline).min(1.0) * cap
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kquant_core::Kline;
    use rust_decimal_macros::dec;

    /// 전반부 범위가 넓고 후반부로 갈수록 수축하는 시계열.
    fn contracting_series(n: usize) -> PriceSeries {
        (0..n)
            .map(|i| {
                let close = dec!(10000);
                // 범위가 400에서 선형으로 40까지 줄어듦
                let spread = Decimal::from(400 - (360 * i / (n - 1)) as i64);
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                Kline::new(
                    "005930",
                    date,
                    close,
                    close + spread,
                    close - spread,
                    close + spread / dec!(2),
                    1_000_000,
                )
            })
            .collect()
    }

    /// 범위가 일정한 시계열.
    fn flat_series(n: usize) -> PriceSeries {
        (0..n)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                Kline::new(
                    "005930",
                    date,
                    dec!(10000),
                    dec!(10200),
                    dec!(9800),
                    dec!(10000),
                    1_000_000,
                )
            })
            .collect()
    }

    fn neutral_supply() -> SupplyData {
        SupplyData::default()
    }

    fn strong_supply() -> SupplyData {
        SupplyData {
            foreign_net_5d: dec!(500_000_000),
            foreign_net_20d: dec!(900_000_000),
            foreign_net_60d: dec!(1_200_000_000),
            institution_net_5d: dec!(300_000_000),
            institution_net_20d: dec!(500_000_000),
            institution_net_60d: dec!(800_000_000),
            buy_streak_days: 5,
        }
    }

    #[test]
    fn test_contracting_series_detected() {
        let screener = VcpScreener::new(ScreenerConfig::default());
        let series = contracting_series(60);

        let detection = screener
            .detect("005930", &series, &strong_supply())
            .unwrap();

        assert!(detection.contraction_ratio < 0.7);
        assert!(detection.is_contracted);
    }

    #[test]
    fn test_flat_series_not_detected() {
        let screener = VcpScreener::new(ScreenerConfig::default());
        let series = flat_series(60);

        let detection = screener
            .detect("005930", &series, &neutral_supply())
            .unwrap();

        // 범위가 일정하면 수축 비율이 1 근처
        assert!(detection.contraction_ratio > 0.9);
        assert!(!detection.is_contracted);
    }

    #[test]
    fn test_insufficient_data() {
        let screener = VcpScreener::new(ScreenerConfig::default());
        let series = flat_series(10);

        assert!(screener
            .detect("005930", &series, &neutral_supply())
            .is_err());
    }

    #[test]
    fn test_supply_score_caps() {
        let screener = VcpScreener::new(ScreenerConfig::default());
        let series = flat_series(60);

        let score = screener.supply_score(&series, &strong_supply());
        // 상한 합계(90)를 넘을 수 없음
        assert!(score <= 90.0);
        assert!(score > 0.0);

        let zero = screener.supply_score(&series, &neutral_supply());
        // 거래량이 평균 수준이면 volume 구간 점수만 남음
        assert!(zero <= ScreenerConfig::default().volume_cap);
    }

    #[test]
    fn test_deterministic() {
        let screener = VcpScreener::new(ScreenerConfig::default());
        let series = contracting_series(60);
        let supply = strong_supply();

        let a = screener.detect("005930", &series, &supply).unwrap();
        let b = screener.detect("005930", &series, &supply).unwrap();
        assert_eq!(a, b);
    }
}
