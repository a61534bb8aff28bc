//! 시장 레짐 평가기.
//!
//! KOSPI/KOSDAQ 일봉 시계열을 종합하여 0~100점의 레짐 점수와 라벨을
//! 산출합니다. 파이프라인은 이 점수를 매매 게이트로 사용합니다.
//!
//! # 배점 (기본 설정)
//!
//! - **추세 정렬 30점**: EMA 5/20/60 정배열 여부
//! - **모멘텀 40점**: RSI 구간 + MACD 교차 상태 (지배적 가중치)
//! - **수급 강도 30점**: 거래량 비율 + 이동평균 대비 상대 위치
//!
//! 두 지수를 각각 채점한 뒤 평균합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use kquant_core::{MarketStatus, PriceSeries, RegimeConfig, RegimeLabel, RegimeSubScores};

use crate::indicators::{self, IndicatorError, IndicatorResult};

/// 시장 레짐 평가기.
pub struct MarketRegimeEvaluator {
    config: RegimeConfig,
}

impl MarketRegimeEvaluator {
    /// 설정으로 평가기를 생성합니다.
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    /// KOSPI/KOSDAQ 시계열로 시장 레짐을 평가합니다.
    ///
    /// 어느 한 지수라도 `min_history` 미만이면 계산을 생략하고
    /// `insufficient_history`가 켜진 중립(50점) 상태를 반환합니다.
    /// 이 경우는 데이터에서 계산된 중립과 구분되는 별도 조건입니다.
    ///
    /// 시계열 자체가 없으면 이 함수에 도달하기 전에 데이터 계층에서
    /// 오류로 중단되어야 합니다.
    pub fn evaluate(
        &self,
        kospi: &PriceSeries,
        kosdaq: &PriceSeries,
    ) -> IndicatorResult<MarketStatus> {
        let min_history = self.config.min_history;
        if kospi.len() < min_history || kosdaq.len() < min_history {
            debug!(
                kospi_bars = kospi.len(),
                kosdaq_bars = kosdaq.len(),
                min_history,
                "이력 부족, 중립 레짐으로 보고"
            );
            return Ok(MarketStatus {
                score: 50,
                label: RegimeLabel::Neutral,
                sub_scores: RegimeSubScores {
                    trend: 0,
                    momentum: 0,
                    strength: 0,
                },
                insufficient_history: true,
            });
        }

        let kospi_scores = self.score_index(kospi)?;
        let kosdaq_scores = self.score_index(kosdaq)?;

        let sub_scores = RegimeSubScores {
            trend: (kospi_scores.trend + kosdaq_scores.trend) / 2,
            momentum: (kospi_scores.momentum + kosdaq_scores.momentum) / 2,
            strength: (kospi_scores.strength + kosdaq_scores.strength) / 2,
        };
        let score = sub_scores.trend + sub_scores.momentum + sub_scores.strength;
        let label = MarketStatus::label_for(
            score,
            self.config.strong_bull_cutoff,
            self.config.bull_cutoff,
            self.config.neutral_cutoff,
            self.config.caution_cutoff,
        );

        debug!(
            score,
            ?label,
            trend = sub_scores.trend,
            momentum = sub_scores.momentum,
            strength = sub_scores.strength,
            "시장 레짐 평가 완료"
        );

        Ok(MarketStatus {
            score,
            label,
            sub_scores,
            insufficient_history: false,
        })
    }

    /// 지수 하나를 채점합니다.
    fn score_index(&self, series: &PriceSeries) -> IndicatorResult<RegimeSubScores> {
        let closes: Vec<Decimal> = series.iter().map(|k| k.close).collect();

        Ok(RegimeSubScores {
            trend: self.score_trend(&closes)?,
            momentum: self.score_momentum(&closes)?,
            strength: self.score_strength(series, &closes)?,
        })
    }

    /// 추세 정렬 점수 (최대 trend_points).
    ///
    /// EMA 5 > 20 > 60 정배열이면 만점, 부분 정렬은 부분 점수.
    fn score_trend(&self, closes: &[Decimal]) -> IndicatorResult<u32> {
        let short = last_value(&indicators::ema(closes, self.config.ema_short)?)?;
        let mid = last_value(&indicators::ema(closes, self.config.ema_mid)?)?;
        let long = last_value(&indicators::ema(closes, self.config.ema_long)?)?;

        let max = self.config.trend_points;
        let score = if short > mid && mid > long {
            max
        } else if short > mid {
            max * 2 / 3
        } else if mid > long {
            max / 3
        } else {
            0
        };
        Ok(score.min(max))
    }

    /// 모멘텀 점수 (최대 momentum_points).
    ///
    /// RSI 구간 점수와 MACD 교차 상태 점수를 절반씩 배분합니다.
    fn score_momentum(&self, closes: &[Decimal]) -> IndicatorResult<u32> {
        let max = self.config.momentum_points;
        let half = max / 2;

        let rsi = last_value(&indicators::rsi(closes, self.config.rsi_period)?)?;
        let rsi_score = if rsi >= dec!(60) {
            half
        } else if rsi >= dec!(50) {
            half * 3 / 4
        } else if rsi >= dec!(40) {
            half / 2
        } else {
            0
        };

        let macd_points = indicators::macd(closes, 12, 26, 9)?;
        let last_macd = macd_points
            .last()
            .ok_or(IndicatorError::InsufficientData {
                required: 35,
                provided: closes.len(),
            })?;
        let macd_score = if last_macd.is_bullish() {
            half
        } else if matches!(
            (last_macd.macd, last_macd.signal),
            (Some(m), Some(s)) if m > s
        ) {
            half * 3 / 5
        } else {
            0
        };

        Ok((rsi_score + macd_score).min(max))
    }

    /// 수급 강도 점수 (최대 strength_points).
    ///
    /// 최근 거래량 대비 20일 평균 비율과 종가의 SMA20 대비 위치를
    /// 절반씩 배분합니다.
    fn score_strength(&self, series: &PriceSeries, closes: &[Decimal]) -> IndicatorResult<u32> {
        let max = self.config.strength_points;
        let half = max / 2;

        let baseline = self.config.ema_mid;
        let len = series.len();
        let recent_volume = series[len - 1].volume;
        let avg_volume: i64 = series[len - baseline..]
            .iter()
            .map(|k| k.volume)
            .sum::<i64>()
            / baseline as i64;

        let volume_score = if avg_volume <= 0 {
            0
        } else {
            let ratio = recent_volume as f64 / avg_volume as f64;
            if ratio >= 1.5 {
                half
            } else if ratio >= 1.0 {
                half * 2 / 3
            } else if ratio >= 0.7 {
                half / 3
            } else {
                0
            }
        };

        let sma_mid = last_value(&indicators::sma(closes, baseline)?)?;
        let last_close = closes[len - 1];
        let position_score = if last_close > sma_mid {
            half
        } else if sma_mid > Decimal::ZERO
            && relative_gap_pct(last_close, sma_mid) <= 2.0
        {
            half / 2
        } else {
            0
        };

        Ok((volume_score + position_score).min(max))
    }
}

/// 지표 벡터의 마지막 유효값.
fn last_value(values: &[Option<Decimal>]) -> IndicatorResult<Decimal> {
    values
        .last()
        .copied()
        .flatten()
        .ok_or(IndicatorError::InsufficientData {
            required: 1,
            provided: 0,
        })
}

/// |a - b| / b × 100 (%).
fn relative_gap_pct(a: Decimal, b: Decimal) -> f64 {
    ((a - b).abs() / b * dec!(100)).to_f64().unwrap_or(f64::MAX)
}
