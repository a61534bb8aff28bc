//! 점수표 및 등급.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// 시그널 등급.
///
/// 총점에 대한 순수 계단 함수로 결정되며, 점수가 높을수록
/// 등급이 낮아지는 일은 없습니다 (단조성).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
}

impl Grade {
    /// 정렬용 순위를 반환합니다 (S가 가장 높음).
    pub fn rank(&self) -> u8 {
        match self {
            Grade::S => 3,
            Grade::A => 2,
            Grade::B => 1,
            Grade::C => 0,
        }
    }

    /// 등급별 R-배수를 반환합니다 (목표가 = 진입가 + R × 리스크).
    pub fn r_multiple(&self) -> rust_decimal::Decimal {
        use rust_decimal::Decimal;
        match self {
            Grade::S => Decimal::from(3),
            Grade::A => Decimal::from(2),
            Grade::B => Decimal::new(15, 1), // 1.5
            Grade::C => Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::S => write!(f, "S"),
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
        }
    }
}

/// 점수 집계 전의 부분 점수표.
///
/// Phase1이 뉴스 외의 모든 항목을 채우고, Phase3이 뉴스 점수를 채웁니다.
/// 누락(`None`)과 0점은 다른 의미이므로 구분해서 유지합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialScore {
    /// 뉴스 감성 (0~3, Phase3 제공)
    pub news: Option<u32>,
    /// 거래대금 (0~3)
    pub trading_value: Option<u32>,
    /// 차트 패턴 (0~2)
    pub chart_pattern: Option<u32>,
    /// 캔들 모양 (0~1)
    pub candle: Option<u32>,
    /// 타이밍 (0~1)
    pub timing: Option<u32>,
    /// 수급 (0~2)
    pub supply: Option<u32>,
    /// 거래량 급증 보너스
    pub volume_surge_bonus: u32,
    /// 일일 상승률 보너스
    pub daily_rise_bonus: u32,
}

/// 확정된 점수표.
///
/// 불변식: `total == 기본 항목 합 + 보너스 합`이며,
/// 각 항목은 문서화된 상한으로 클램프되어 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetail {
    /// 뉴스 감성 (0~3)
    pub news: u32,
    /// 거래대금 (0~3)
    pub trading_value: u32,
    /// 차트 패턴 (0~2)
    pub chart_pattern: u32,
    /// 캔들 모양 (0~1)
    pub candle: u32,
    /// 타이밍 (0~1)
    pub timing: u32,
    /// 수급 (0~2)
    pub supply: u32,
    /// 거래량 급증 보너스
    pub volume_surge_bonus: u32,
    /// 일일 상승률 보너스
    pub daily_rise_bonus: u32,
    /// 총점
    pub total: u32,
}

impl ScoreDetail {
    /// 항목별 상한.
    pub const NEWS_MAX: u32 = 3;
    pub const TRADING_VALUE_MAX: u32 = 3;
    pub const CHART_PATTERN_MAX: u32 = 2;
    pub const CANDLE_MAX: u32 = 1;
    pub const TIMING_MAX: u32 = 1;
    pub const SUPPLY_MAX: u32 = 2;

    /// 부분 점수표를 확정합니다.
    ///
    /// 필수 항목이 하나라도 누락되면 `IncompleteScore`로 실패합니다.
    /// 누락을 0점으로 취급하면 등급 결과가 달라지므로 허용하지 않습니다.
    pub fn from_partial(partial: &PartialScore) -> EngineResult<Self> {
        let require = |value: Option<u32>, field: &str| {
            value.ok_or_else(|| EngineError::IncompleteScore(field.to_string()))
        };

        let news = require(partial.news, "news")?.min(Self::NEWS_MAX);
        let trading_value =
            require(partial.trading_value, "trading_value")?.min(Self::TRADING_VALUE_MAX);
        let chart_pattern =
            require(partial.chart_pattern, "chart_pattern")?.min(Self::CHART_PATTERN_MAX);
        let candle = require(partial.candle, "candle")?.min(Self::CANDLE_MAX);
        let timing = require(partial.timing, "timing")?.min(Self::TIMING_MAX);
        let supply = require(partial.supply, "supply")?.min(Self::SUPPLY_MAX);

        let base = news + trading_value + chart_pattern + candle + timing + supply;
        let bonus = partial.volume_surge_bonus + partial.daily_rise_bonus;

        Ok(Self {
            news,
            trading_value,
            chart_pattern,
            candle,
            timing,
            supply,
            volume_surge_bonus: partial.volume_surge_bonus,
            daily_rise_bonus: partial.daily_rise_bonus,
            total: base + bonus,
        })
    }

    /// 기본 항목 합을 반환합니다.
    pub fn base_sum(&self) -> u32 {
        self.news + self.trading_value + self.chart_pattern + self.candle + self.timing + self.supply
    }

    /// 보너스 합을 반환합니다.
    pub fn bonus_sum(&self) -> u32 {
        self.volume_surge_bonus + self.daily_rise_bonus
    }
}
