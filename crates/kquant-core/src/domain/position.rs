//! 포지션 계획.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// 등급과 리스크 거리로부터 계산된 포지션 계획.
///
/// 불변식 (롱 전용): 손절가 < 진입가 < 목표가,
/// 수량 × 진입가 <= 가용 자본.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPlan {
    /// 진입가
    pub entry: Price,
    /// 손절가
    pub stop: Price,
    /// 목표가 (진입가 + R배수 × 리스크 거리)
    pub target: Price,
    /// 수량 (주, 항상 0 이상의 정수)
    pub quantity: i64,
    /// R-배수 (등급 의존)
    pub r_multiple: Decimal,
    /// 자본 제약으로 수량이 축소되었는지 여부.
    ///
    /// 리스크 한도 기반 수량과 자본 한도 기반 수량을 호출부가
    /// 구분할 수 있도록 표시합니다.
    pub capital_constrained: bool,
}

impl PositionPlan {
    /// 주당 리스크(진입가 - 손절가)를 반환합니다.
    pub fn risk_per_share(&self) -> Decimal {
        self.entry - self.stop
    }

    /// 포지션 명목 금액(수량 × 진입가)을 반환합니다.
    pub fn notional(&self) -> Decimal {
        Decimal::from(self.quantity) * self.entry
    }
}
