//! 기술적 지표 모듈.
//!
//! 시장 국면 평가와 VCP 스크리닝에 필요한 지표들을 제공합니다.
//! 가격은 `Decimal`로 계산하며 부동소수점을 사용하지 않습니다.
//!
//! # 지원 지표
//!
//! - **추세**: SMA, EMA, MACD
//! - **모멘텀**: RSI (EWM 방식)
//! - **변동성**: ATR
//!
//! 모든 지표는 입력과 같은 길이의 `Vec<Option<Decimal>>`을 반환하고,
//! 워밍업 구간은 `None`으로 채워집니다.

pub mod momentum;
pub mod trend;
pub mod volatility;

use thiserror::Error;

pub use momentum::rsi;
pub use trend::{ema, macd, sma, MacdPoint};
pub use volatility::{atr, atr_percent};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

pub(crate) fn check_period(period: usize, provided: usize, required: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "기간은 0보다 커야 합니다".to_string(),
        ));
    }
    if provided < required {
        return Err(IndicatorError::InsufficientData { required, provided });
    }
    Ok(())
}
