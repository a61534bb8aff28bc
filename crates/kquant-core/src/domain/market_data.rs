//! 시장 데이터 타입 및 구조체.
//!
//! 이 모듈은 시장 데이터 관련 타입을 정의합니다:
//! - `Kline` - OHLCV 일봉 데이터
//! - `PriceSeries` - 날짜 오름차순 일봉 시계열

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// OHLCV 일봉 데이터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    /// 심볼 (종목코드 또는 지수명)
    pub symbol: String,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량 (주)
    pub volume: i64,
    /// 거래대금 (원)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trading_value: Option<Decimal>,
}

impl Kline {
    /// 새 일봉을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            volume,
            trading_value: None,
        }
    }

    /// 거래대금을 설정합니다.
    pub fn with_trading_value(mut self, trading_value: Decimal) -> Self {
        self.trading_value = Some(trading_value);
        self
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 종가 체결 강도 ((종가 - 저가) / (고가 - 저가)).
    ///
    /// 고가 부근 마감이면 1에 가깝고, 저가 부근 마감이면 0에 가깝습니다.
    /// 고가 == 저가이면 None.
    pub fn closing_strength(&self) -> Option<Decimal> {
        let range = self.range();
        if range.is_zero() {
            return None;
        }
        Some((self.close - self.low) / range)
    }
}

/// 날짜 오름차순 일봉 시계열. 빠진 거래일은 허용됩니다.
pub type PriceSeries = Vec<Kline>;
