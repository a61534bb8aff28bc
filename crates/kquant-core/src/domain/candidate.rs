//! 스캔 후보 종목.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Market, Price};

/// 상승률 상위 조회로 생성되는 스캔 후보 종목.
///
/// 한 번의 런 내에서는 불변입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCandidate {
    /// 종목코드 (6자리)
    pub ticker: String,
    /// 종목명
    pub name: String,
    /// 시장 구분
    pub market: Market,
    /// 현재가
    pub current_price: Price,
    /// 일일 등락률 (%)
    pub change_pct: Decimal,
    /// 거래대금 (원)
    pub trading_value: Decimal,
}

impl StockCandidate {
    /// 새 후보를 생성합니다.
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        market: Market,
        current_price: Price,
        change_pct: Decimal,
        trading_value: Decimal,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            market,
            current_price,
            change_pct,
            trading_value,
        }
    }
}
