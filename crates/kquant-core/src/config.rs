//! 설정 관리.
//!
//! 점수/레짐/스크리너 로직에 흩어지기 쉬운 임계값들을 하나의 불변 설정
//! 구조체로 모아 생성 시점에 주입합니다. 모든 컷오프는 여기서만 정의되며,
//! 단위 테스트가 정확한 경계값을 검증할 수 있습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 엔진 전체 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// 시장 레짐 평가 설정
    #[serde(default)]
    pub regime: RegimeConfig,
    /// VCP 스크리너 설정
    #[serde(default)]
    pub screener: ScreenerConfig,
    /// 점수표 설정
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// 포지션 사이징 설정
    #[serde(default)]
    pub sizing: SizingConfig,
    /// 파이프라인 실행 설정
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// LLM 감성 분석 설정
    #[serde(default)]
    pub llm: LlmConfig,
}

/// 시장 레짐 평가 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegimeConfig {
    /// 단기 이동평균 기간
    pub ema_short: usize,
    /// 중기 이동평균 기간
    pub ema_mid: usize,
    /// 장기 이동평균 기간
    pub ema_long: usize,
    /// RSI 기간
    pub rsi_period: usize,
    /// 추세 정렬 배점
    pub trend_points: u32,
    /// RSI/MACD 모멘텀 배점 (지배적 가중치)
    pub momentum_points: u32,
    /// 거래량/상대강도 배점
    pub strength_points: u32,
    /// 평가에 필요한 최소 거래일 수
    pub min_history: usize,
    /// STRONG_BULL 컷오프 (이상)
    pub strong_bull_cutoff: u32,
    /// BULL 컷오프
    pub bull_cutoff: u32,
    /// NEUTRAL 컷오프
    pub neutral_cutoff: u32,
    /// CAUTION 컷오프 (미만이면 BEAR)
    pub caution_cutoff: u32,
    /// 거래 가능 최저 점수 (이 미만이면 게이트 차단)
    pub tradeable_floor: u32,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            ema_short: 5,
            ema_mid: 20,
            ema_long: 60,
            rsi_period: 14,
            trend_points: 30,
            momentum_points: 40,
            strength_points: 30,
            min_history: 70,
            strong_bull_cutoff: 80,
            bull_cutoff: 60,
            neutral_cutoff: 40,
            caution_cutoff: 20,
            tradeable_floor: 40,
        }
    }
}

/// VCP 스크리너 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScreenerConfig {
    /// ATR 기간
    pub atr_period: usize,
    /// 수축 비교 윈도우 크기 (거래일)
    pub range_window: usize,
    /// 수축 판정 임계값 (최근 범위 / 과거 범위, 이하)
    pub contraction_threshold: f64,
    /// 최근 고점 근접 허용 비율 (%)
    pub near_high_pct: f64,
    /// 외국인 순매수 배점 상한
    pub foreign_cap: f64,
    /// 기관 순매수 배점 상한
    pub institution_cap: f64,
    /// 거래량 비율 배점 상한
    pub volume_cap: f64,
    /// 연속 순매수일 배점 상한
    pub streak_cap: f64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            range_window: 10,
            contraction_threshold: 0.7,
            near_high_pct: 5.0,
            foreign_cap: 25.0,
            institution_cap: 20.0,
            volume_cap: 20.0,
            streak_cap: 25.0,
        }
    }
}

/// 점수표 설정.
///
/// 등급 컷오프는 21점 만점 기준입니다. 경계값은 상위 등급에 포함됩니다
/// (예: 총점 15 → S, 14 → A).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// S 등급 컷오프 (이상)
    pub s_cutoff: u32,
    /// A 등급 컷오프
    pub a_cutoff: u32,
    /// B 등급 컷오프 (미만이면 C)
    pub b_cutoff: u32,
    /// 거래대금 3점 기준 (원)
    pub value_tier3: Decimal,
    /// 거래대금 2점 기준
    pub value_tier2: Decimal,
    /// 거래대금 1점 기준
    pub value_tier1: Decimal,
    /// 수급 점수 2점 기준 (supply_score 이상)
    pub supply_tier2: f64,
    /// 수급 점수 1점 기준
    pub supply_tier1: f64,
    /// 거래량 급증 보너스 기준 배수 및 가점
    pub volume_surge_tiers: Vec<(f64, u32)>,
    /// 일일 상승률 보너스 기준(%) 및 가점
    pub daily_rise_tiers: Vec<(f64, u32)>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            s_cutoff: 15,
            a_cutoff: 12,
            b_cutoff: 8,
            value_tier3: Decimal::new(1_000_000_000_000, 0), // 1조
            value_tier2: Decimal::new(500_000_000_000, 0),   // 5000억
            value_tier1: Decimal::new(100_000_000_000, 0),   // 1000억
            supply_tier2: 60.0,
            supply_tier1: 30.0,
            volume_surge_tiers: vec![(10.0, 4), (5.0, 2), (3.0, 1)],
            daily_rise_tiers: vec![(25.0, 5), (15.0, 3), (10.0, 1)],
        }
    }
}

/// 포지션 사이징 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SizingConfig {
    /// 거래당 최대 리스크 (자본 대비 비율, 0.005 = 0.5%)
    pub risk_fraction: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_fraction: Decimal::new(5, 3), // 0.005
        }
    }
}

/// 파이프라인 실행 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Phase1 데이터 조회 동시성 한도
    pub fetch_concurrency: usize,
    /// 뉴스 조회 윈도우 (일)
    pub news_window_days: u32,
    /// Phase3 LLM 배치 크기
    pub llm_batch_size: usize,
    /// Phase3 LLM 동시성 한도
    pub llm_concurrency: usize,
    /// 일시적 실패 재시도 횟수 상한
    pub max_retries: u32,
    /// 재시도 기본 백오프 (밀리초)
    pub retry_backoff_ms: u64,
    /// 최종 시그널 최대 개수
    pub max_positions: usize,
    /// 런 전체 타임아웃 (초)
    pub run_timeout_secs: u64,
    /// 후보 분석에 필요한 최소 거래일 수
    pub min_history: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 4,
            news_window_days: 3,
            llm_batch_size: 5,
            llm_concurrency: 2,
            max_retries: 3,
            retry_backoff_ms: 500,
            max_positions: 5,
            run_timeout_secs: 300,
            min_history: 70,
        }
    }
}

/// LLM 감성 분석 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// OpenAI 호환 API 베이스 URL
    pub base_url: String,
    /// API 키
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름
    pub model: String,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `KQUANT__` 접두사와 `__` 구분자로 파일 값을 덮어씁니다
    /// (예: `KQUANT__SCORING__S_CUTOFF=16`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("KQUANT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cutoffs() {
        let config = ScoringConfig::default();
        assert_eq!(config.s_cutoff, 15);
        assert_eq!(config.a_cutoff, 12);
        assert!(config.b_cutoff < config.a_cutoff);
    }

    #[test]
    fn test_regime_points_sum_to_100() {
        let config = RegimeConfig::default();
        assert_eq!(
            config.trend_points + config.momentum_points + config.strength_points,
            100
        );
    }

    #[test]
    fn test_risk_fraction_default() {
        let config = SizingConfig::default();
        assert_eq!(config.risk_fraction, Decimal::new(5, 3));
    }
}
