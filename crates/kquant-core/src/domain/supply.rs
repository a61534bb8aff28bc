//! 수급(스마트머니) 데이터.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 종목별 외국인/기관 순매수 데이터.
///
/// 5/20/60 거래일 윈도우의 순매수 금액과 연속 순매수일을 담습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyData {
    /// 외국인 순매수 5일 (원)
    pub foreign_net_5d: Decimal,
    /// 외국인 순매수 20일 (원)
    pub foreign_net_20d: Decimal,
    /// 외국인 순매수 60일 (원)
    pub foreign_net_60d: Decimal,
    /// 기관 순매수 5일 (원)
    pub institution_net_5d: Decimal,
    /// 기관 순매수 20일 (원)
    pub institution_net_20d: Decimal,
    /// 기관 순매수 60일 (원)
    pub institution_net_60d: Decimal,
    /// 외국인+기관 연속 순매수일
    pub buy_streak_days: u32,
}

impl SupplyData {
    /// 외국인+기관 합산 5일 순매수를 반환합니다.
    pub fn combined_net_5d(&self) -> Decimal {
        self.foreign_net_5d + self.institution_net_5d
    }

    /// 외국인+기관 합산 20일 순매수를 반환합니다.
    pub fn combined_net_20d(&self) -> Decimal {
        self.foreign_net_20d + self.institution_net_20d
    }
}
