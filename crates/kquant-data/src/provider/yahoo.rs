//! Yahoo Finance 과거 데이터 Provider.
//!
//! KRX / 네이버가 모두 실패했을 때의 최후 폴백 소스입니다.
//!
//! # 심볼 형식
//!
//! Yahoo Finance 형식으로 변환하여 조회합니다:
//! - 코스피 지수: "KOSPI" → "^KS11"
//! - 코스닥 지수: "KOSDAQ" → "^KQ11"
//! - 개별 종목: "005930" → "005930.KS" (코스피) 또는 "005930.KQ" (코스닥)

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use kquant_core::{Kline, PriceSeries};

use crate::error::{DataError, Result};
use crate::provider::MarketDataProvider;

/// Yahoo Finance 과거 데이터 Provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    /// 새로운 Yahoo Finance Provider 생성.
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| DataError::FetchError(format!("Yahoo Finance 연결 실패: {}", e)))?;

        Ok(Self { connector })
    }

    /// 엔진 심볼을 Yahoo Finance 심볼 후보 목록으로 변환.
    ///
    /// 개별 종목은 시장 구분을 알 수 없으므로 코스피(.KS)를 먼저 시도하고
    /// 실패하면 코스닥(.KQ)으로 재시도합니다.
    fn yahoo_symbols(symbol: &str) -> Vec<String> {
        match symbol {
            "KOSPI" => vec!["^KS11".to_string()],
            "KOSDAQ" => vec!["^KQ11".to_string()],
            s if s.chars().all(|c| c.is_ascii_digit()) => {
                vec![format!("{}.KS", s), format!("{}.KQ", s)]
            }
            s => vec![s.to_string()],
        }
    }

    /// Yahoo Quote를 일봉 Kline으로 변환.
    fn quote_to_kline(symbol: &str, quote: &yahoo::Quote) -> Option<Kline> {
        let date = Utc
            .timestamp_opt(quote.timestamp, 0)
            .single()?
            .date_naive();

        Some(Kline {
            symbol: symbol.to_string(),
            date,
            open: Decimal::from_f64_retain(quote.open)?,
            high: Decimal::from_f64_retain(quote.high)?,
            low: Decimal::from_f64_retain(quote.low)?,
            close: Decimal::from_f64_retain(quote.close)?,
            volume: quote.volume as i64,
            trading_value: None,
        })
    }

    async fn fetch_one(
        &self,
        symbol: &str,
        yahoo_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let to_offset = |d: NaiveDate, t: NaiveTime| -> Result<time::OffsetDateTime> {
            time::OffsetDateTime::from_unix_timestamp(d.and_time(t).and_utc().timestamp())
                .map_err(|e| DataError::ParseError(format!("타임스탬프 변환 실패: {}", e)))
        };
        let start_ts = to_offset(start, NaiveTime::MIN)?;
        let end_ts = to_offset(end, NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))?;

        let response = self
            .connector
            .get_quote_history(yahoo_symbol, start_ts, end_ts)
            .await
            .map_err(|e| {
                DataError::FetchError(format!("Yahoo Finance 오류 ({}): {}", yahoo_symbol, e))
            })?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::ParseError(format!("Quote 파싱 오류: {}", e)))?;

        let mut series: PriceSeries = quotes
            .iter()
            .filter_map(|q| Self::quote_to_kline(symbol, q))
            .collect();
        series.sort_by_key(|k| k.date);
        series.dedup_by_key(|k| k.date);

        debug!(
            ticker = symbol,
            yahoo = yahoo_symbol,
            count = series.len(),
            "Yahoo Finance 일봉 조회 완료"
        );
        Ok(series)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let mut last_err = None;

        for yahoo_symbol in Self::yahoo_symbols(symbol) {
            match self.fetch_one(symbol, &yahoo_symbol, start, end).await {
                Ok(series) if !series.is_empty() => return Ok(series),
                Ok(_) => {
                    warn!(ticker = symbol, yahoo = %yahoo_symbol, "Yahoo Finance 데이터 없음");
                }
                Err(e) => {
                    warn!(ticker = symbol, yahoo = %yahoo_symbol, error = %e, "Yahoo Finance 조회 실패");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| DataError::InvalidData {
            provider: "yahoo".to_string(),
            reason: format!("빈 응답: {}", symbol),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yahoo_symbols_index() {
        assert_eq!(YahooProvider::yahoo_symbols("KOSPI"), vec!["^KS11"]);
        assert_eq!(YahooProvider::yahoo_symbols("KOSDAQ"), vec!["^KQ11"]);
    }

    #[test]
    fn test_yahoo_symbols_stock() {
        assert_eq!(
            YahooProvider::yahoo_symbols("005930"),
            vec!["005930.KS", "005930.KQ"]
        );
    }

    #[test]
    fn test_yahoo_symbols_passthrough() {
        assert_eq!(YahooProvider::yahoo_symbols("AAPL"), vec!["AAPL"]);
    }
}
