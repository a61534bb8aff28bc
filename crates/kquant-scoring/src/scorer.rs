//! 가중 점수표 채점기.
//!
//! 후보 종목의 거래대금/차트/캔들/타이밍/수급 점수와 보너스를 계산합니다.
//! 뉴스 점수(0~3)는 이후 단계에서 채워지며, 여기서는 빈 칸으로 둡니다.
//! 누락과 0점은 다른 의미이므로 `PartialScore`의 `Option`으로 구분합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use kquant_analytics::indicators;
use kquant_analytics::VcpDetection;
use kquant_core::{
    EngineResult, Grade, PartialScore, PriceSeries, ScoreDetail, ScoringConfig, StockCandidate,
};

/// 가중 점수표 채점기.
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// 뉴스를 제외한 모든 항목을 채점합니다.
    ///
    /// 반환된 `PartialScore`의 `news`는 `None`이며, 이후 단계에서
    /// 감성 분석 결과로 채워져야 확정할 수 있습니다.
    pub fn base_scores(
        &self,
        candidate: &StockCandidate,
        series: &PriceSeries,
        detection: &VcpDetection,
    ) -> PartialScore {
        let partial = PartialScore {
            news: None,
            trading_value: Some(self.score_trading_value(candidate.trading_value)),
            chart_pattern: Some(self.score_chart_pattern(series)),
            candle: Some(self.score_candle(series)),
            timing: Some(self.score_timing(series)),
            supply: Some(self.score_supply(detection.supply_score)),
            volume_surge_bonus: self.volume_surge_bonus(series),
            daily_rise_bonus: self.daily_rise_bonus(candidate.change_pct),
        };

        debug!(ticker = %candidate.ticker, ?partial, "기본 항목 채점 완료");
        partial
    }

    /// 부분 점수표를 확정합니다. 필수 항목 누락 시 실패합니다.
    pub fn finalize(&self, partial: &PartialScore) -> EngineResult<ScoreDetail> {
        ScoreDetail::from_partial(partial)
    }

    /// 총점 → 등급 계단 함수.
    ///
    /// 경계값은 상위 등급에 포함됩니다 (기본 컷오프에서 15 → S, 14 → A).
    pub fn determine_grade(&self, total: u32) -> Grade {
        if total >= self.config.s_cutoff {
            Grade::S
        } else if total >= self.config.a_cutoff {
            Grade::A
        } else if total >= self.config.b_cutoff {
            Grade::B
        } else {
            Grade::C
        }
    }

    /// 거래대금 점수 (0~3).
    fn score_trading_value(&self, trading_value: Decimal) -> u32 {
        if trading_value >= self.config.value_tier3 {
            3
        } else if trading_value >= self.config.value_tier2 {
            2
        } else if trading_value >= self.config.value_tier1 {
            1
        } else {
            0
        }
    }

    /// 차트 패턴 점수 (0~2).
    ///
    /// 신고가 돌파 +2, 이동평균 정배열 +2를 각각 판정한 뒤 상한 2점으로
    /// 클램프합니다.
    fn score_chart_pattern(&self, series: &PriceSeries) -> u32 {
        let mut score = 0u32;

        if is_new_high_breakout(series) {
            score += 2;
        }
        if is_ma_aligned(series) {
            score += 2;
        }
        score.min(ScoreDetail::CHART_PATTERN_MAX)
    }

    /// 캔들 점수 (0~1). 고가 부근 마감(체결 강도 0.7 이상)이면 1점.
    fn score_candle(&self, series: &PriceSeries) -> u32 {
        let strong = series
            .last()
            .and_then(|k| k.closing_strength())
            .is_some_and(|s| s >= Decimal::new(7, 1));
        u32::from(strong)
    }

    /// 타이밍 점수 (0~1). 20일선 위 3% 이내의 눌림목이면 1점.
    fn score_timing(&self, series: &PriceSeries) -> u32 {
        let Some(last_close) = series.last().map(|k| k.close) else {
            return 0;
        };
        let closes: Vec<Decimal> = series.iter().map(|k| k.close).collect();
        let Ok(sma20) = indicators::sma(&closes, 20) else {
            return 0;
        };
        let Some(sma) = sma20.last().copied().flatten() else {
            return 0;
        };
        if sma.is_zero() {
            return 0;
        }

        let gap_pct = (last_close - sma) / sma * Decimal::from(100);
        u32::from(gap_pct >= Decimal::ZERO && gap_pct <= Decimal::from(3))
    }

    /// 수급 점수 (0~2). 스크리너의 supply_score를 구간으로 변환합니다.
    fn score_supply(&self, supply_score: f64) -> u32 {
        if supply_score >= self.config.supply_tier2 {
            2
        } else if supply_score >= self.config.supply_tier1 {
            1
        } else {
            0
        }
    }

    /// 뉴스 감성 점수를 상한으로 클램프합니다 (0~3).
    pub fn clamp_news(&self, news: u32) -> u32 {
        news.min(ScoreDetail::NEWS_MAX)
    }

    /// 거래량 급증 보너스. 계단식 테이블의 첫 일치 구간을 적용합니다.
    fn volume_surge_bonus(&self, series: &PriceSeries) -> u32 {
        let Some(ratio) = volume_ratio(series) else {
            return 0;
        };
        self.config
            .volume_surge_tiers
            .iter()
            .find(|(threshold, _)| ratio >= *threshold)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }

    /// 일일 상승률 보너스.
    fn daily_rise_bonus(&self, change_pct: Decimal) -> u32 {
        let change = change_pct.to_f64().unwrap_or(0.0);
        self.config
            .daily_rise_tiers
            .iter()
            .find(|(threshold, _)| change >= *threshold)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }
}

/// 마지막 종가가 직전 고점들을 돌파했는지 확인.
fn is_new_high_breakout(series: &PriceSeries) -> bool {
    let len = series.len();
    if len < 2 {
        return false;
    }
    let last_close = series[len - 1].close;
    series[..len - 1].iter().all(|k| last_close > k.high)
}

/// 5일선 > 20일선이고 종가가 20일선 위인지 확인.
fn is_ma_aligned(series: &PriceSeries) -> bool {
    let closes: Vec<Decimal> = series.iter().map(|k| k.close).collect();
    let (Ok(sma5), Ok(sma20)) = (indicators::sma(&closes, 5), indicators::sma(&closes, 20))
    else {
        return false;
    };
    match (
        sma5.last().copied().flatten(),
        sma20.last().copied().flatten(),
        closes.last(),
    ) {
        (Some(short), Some(mid), Some(close)) => short > mid && *close > mid,
        _ => false,
    }
}

/// 마지막 거래량 / 직전 20일 평균 거래량.
fn volume_ratio(series: &PriceSeries) -> Option<f64> {
    let len = series.len();
    let window = 20.min(len.checked_sub(1)?);
    if window == 0 {
        return None;
    }

    let recent = series[len - 1].volume as f64;
    let avg = series[len - 1 - window..len - 1]
        .iter()
        .map(|k| k.volume as f64)
        .sum::<f64>()
        / window as f64;

    if avg <= 0.0 {
        None
    } else {
        Some(recent / avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kquant_core::{Kline, Market};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn scorer() -> Scorer {
        Scorer::new(ScoringConfig::default())
    }

    fn candidate(trading_value: Decimal, change_pct: Decimal) -> StockCandidate {
        StockCandidate::new(
            "005930",
            "삼성전자",
            Market::Kospi,
            dec!(70000),
            change_pct,
            trading_value,
        )
    }

    /// 상승 추세에 마지막 봉이 신고가 돌파인 시계열.
    fn breakout_series(volume_multiplier: i64) -> PriceSeries {
        let mut series: PriceSeries = (0..30)
            .map(|i| {
                let close = Decimal::from(10000 + i * 50);
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i);
                Kline::new(
                    "005930",
                    date,
                    close - dec!(50),
                    close + dec!(100),
                    close - dec!(100),
                    close,
                    1_000_000,
                )
            })
            .collect();

        // 마지막 봉: 전 고점 돌파 + 고가 부근 마감
        series.push(Kline::new(
            "005930",
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            dec!(11500),
            dec!(11800),
            dec!(11450),
            dec!(11790),
            1_000_000 * volume_multiplier,
        ));
        series
    }

    #[test]
    fn test_trading_value_tiers() {
        let scorer = scorer();
        assert_eq!(scorer.score_trading_value(dec!(1_500_000_000_000)), 3);
        assert_eq!(scorer.score_trading_value(dec!(1_000_000_000_000)), 3);
        assert_eq!(scorer.score_trading_value(dec!(600_000_000_000)), 2);
        assert_eq!(scorer.score_trading_value(dec!(200_000_000_000)), 1);
        assert_eq!(scorer.score_trading_value(dec!(50_000_000_000)), 0);
    }

    #[test]
    fn test_grade_boundaries() {
        let scorer = scorer();
        assert_eq!(scorer.determine_grade(21), Grade::S);
        assert_eq!(scorer.determine_grade(15), Grade::S);
        assert_eq!(scorer.determine_grade(14), Grade::A);
        assert_eq!(scorer.determine_grade(12), Grade::A);
        assert_eq!(scorer.determine_grade(11), Grade::B);
        assert_eq!(scorer.determine_grade(8), Grade::B);
        assert_eq!(scorer.determine_grade(7), Grade::C);
        assert_eq!(scorer.determine_grade(0), Grade::C);
    }

    #[test]
    fn test_chart_pattern_capped_at_2() {
        let scorer = scorer();
        // 신고가 돌파와 정배열이 동시에 성립하는 시계열
        let series = breakout_series(1);
        assert_eq!(scorer.score_chart_pattern(&series), 2);
    }

    #[test]
    fn test_volume_surge_bonus_tiers() {
        let scorer = scorer();
        assert_eq!(scorer.volume_surge_bonus(&breakout_series(12)), 4);
        assert_eq!(scorer.volume_surge_bonus(&breakout_series(6)), 2);
        assert_eq!(scorer.volume_surge_bonus(&breakout_series(3)), 1);
        assert_eq!(scorer.volume_surge_bonus(&breakout_series(1)), 0);
    }

    #[test]
    fn test_daily_rise_bonus_tiers() {
        let scorer = scorer();
        assert_eq!(scorer.daily_rise_bonus(dec!(26)), 5);
        assert_eq!(scorer.daily_rise_bonus(dec!(25)), 5);
        assert_eq!(scorer.daily_rise_bonus(dec!(18)), 3);
        assert_eq!(scorer.daily_rise_bonus(dec!(11)), 1);
        assert_eq!(scorer.daily_rise_bonus(dec!(5)), 0);
    }

    #[test]
    fn test_base_scores_leave_news_empty() {
        let scorer = scorer();
        let detection = VcpDetection {
            is_contracted: true,
            contraction_ratio: 0.5,
            supply_score: 65.0,
        };
        let partial = scorer.base_scores(
            &candidate(dec!(1_200_000_000_000), dec!(12)),
            &breakout_series(11),
            &detection,
        );

        assert!(partial.news.is_none());
        assert_eq!(partial.trading_value, Some(3));
        assert_eq!(partial.supply, Some(2));
        assert_eq!(partial.volume_surge_bonus, 4);
        assert_eq!(partial.daily_rise_bonus, 1);

        // 뉴스 누락 상태에서는 확정 불가
        assert!(scorer.finalize(&partial).is_err());
    }

    #[test]
    fn test_finalize_after_news() {
        let scorer = scorer();
        let detection = VcpDetection {
            is_contracted: true,
            contraction_ratio: 0.5,
            supply_score: 65.0,
        };
        let mut partial = scorer.base_scores(
            &candidate(dec!(1_200_000_000_000), dec!(12)),
            &breakout_series(11),
            &detection,
        );
        partial.news = Some(scorer.clamp_news(7));

        let detail = scorer.finalize(&partial).unwrap();
        assert_eq!(detail.news, 3);
        assert_eq!(detail.total, detail.base_sum() + detail.bonus_sum());
    }

    proptest! {
        /// 총점이 높을수록 등급 순위가 낮아지지 않는다.
        #[test]
        fn prop_grade_monotonic(a in 0u32..40, b in 0u32..40) {
            let scorer = scorer();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                scorer.determine_grade(high).rank() >= scorer.determine_grade(low).rank()
            );
        }
    }
}
