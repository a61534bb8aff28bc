//! 공통 타입 정의.
//!
//! 이 모듈은 엔진 전반에서 사용되는 기본 타입을 정의합니다:
//! - `Market` - 시장 구분 (KOSPI/KOSDAQ)
//! - `Price`, `Quantity` - 금융 정밀도를 위한 Decimal 별칭

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 주문 수량을 위한 타입.
pub type Quantity = Decimal;

/// 국내 주식 시장 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// 유가증권시장 (코스피)
    Kospi,
    /// 코스닥
    Kosdaq,
}

impl Market {
    /// 시장 대표 지수 심볼을 반환합니다.
    pub fn index_symbol(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }

    /// Yahoo Finance 티커 접미사를 반환합니다.
    pub fn yahoo_suffix(&self) -> &'static str {
        match self {
            Market::Kospi => ".KS",
            Market::Kosdaq => ".KQ",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Kospi => write!(f, "KOSPI"),
            Market::Kosdaq => write!(f, "KOSDAQ"),
        }
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KOSPI" | "STK" => Ok(Market::Kospi),
            "KOSDAQ" | "KSQ" => Ok(Market::Kosdaq),
            _ => Err(format!("알 수 없는 시장: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_parse() {
        assert_eq!("kospi".parse::<Market>().unwrap(), Market::Kospi);
        assert_eq!("KSQ".parse::<Market>().unwrap(), Market::Kosdaq);
        assert!("NYSE".parse::<Market>().is_err());
    }

    #[test]
    fn test_yahoo_suffix() {
        assert_eq!(Market::Kospi.yahoo_suffix(), ".KS");
        assert_eq!(Market::Kosdaq.yahoo_suffix(), ".KQ");
    }
}
