//! 글로벌 매크로 데이터 수집.
//!
//! 해외 지수, 환율, 원자재, 암호화폐 시세를 수집하여 시장 국면 판단의
//! 보조 컨텍스트로 제공합니다. 국내 데이터와 달리 Yahoo Finance 단일
//! 소스를 사용합니다.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use kquant_core::PriceSeries;

use crate::error::Result;
use crate::failover::FailoverDataSource;
use crate::provider::YahooProvider;

/// 글로벌 자산 스냅샷 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalQuote {
    /// 심볼 (Yahoo Finance 형식)
    pub symbol: String,
    /// 최근 종가
    pub close: Decimal,
    /// 전일 대비 등락률 (%)
    pub change_pct: Decimal,
}

/// 한 번의 런에서 수집한 글로벌 컨텍스트.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSnapshot {
    /// 해외 지수 (S&P500, 나스닥 등)
    pub indices: Vec<GlobalQuote>,
    /// 환율 (원/달러 등)
    pub fx: Vec<GlobalQuote>,
    /// 원자재 (금, WTI 등)
    pub commodities: Vec<GlobalQuote>,
    /// 암호화폐 (BTC 등)
    pub crypto: Vec<GlobalQuote>,
}

/// 글로벌 매크로 데이터 수집기.
///
/// 소스는 하나지만 국내 경로와 같은 정제(정렬/중복 제거/보정)를 태우기
/// 위해 [`FailoverDataSource`]를 거칩니다.
pub struct GlobalDataFetcher {
    source: FailoverDataSource,
}

impl GlobalDataFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self::with_source(FailoverDataSource::new(vec![Arc::new(
            YahooProvider::new()?,
        )])))
    }

    /// 임의의 소스 구성으로 생성합니다.
    pub fn with_source(source: FailoverDataSource) -> Self {
        Self { source }
    }

    /// 해외 지수 일봉 조회 (예: "^GSPC", "^IXIC").
    pub async fn fetch_index(&self, symbol: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries> {
        self.fetch_series(symbol, as_of, days).await
    }

    /// 환율 일봉 조회 (예: "KRW=X").
    pub async fn fetch_fx(&self, symbol: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries> {
        self.fetch_series(symbol, as_of, days).await
    }

    /// 원자재 일봉 조회 (예: "GC=F", "CL=F").
    pub async fn fetch_commodity(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        days: i64,
    ) -> Result<PriceSeries> {
        self.fetch_series(symbol, as_of, days).await
    }

    /// 암호화폐 일봉 조회 (예: "BTC-USD").
    pub async fn fetch_crypto(&self, symbol: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries> {
        self.fetch_series(symbol, as_of, days).await
    }

    async fn fetch_series(&self, symbol: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries> {
        let start = as_of - Duration::days(days);
        self.source.fetch_daily(symbol, start, as_of).await
    }

    /// 기본 구성의 글로벌 스냅샷 수집.
    ///
    /// 개별 심볼 실패는 경고 후 건너뜁니다. 글로벌 컨텍스트는 보조
    /// 지표이므로 전체 런을 중단시키지 않습니다.
    pub async fn snapshot(&self, as_of: NaiveDate) -> GlobalSnapshot {
        let mut snapshot = GlobalSnapshot::default();

        for (symbol, bucket) in [
            ("^GSPC", Bucket::Index),
            ("^IXIC", Bucket::Index),
            ("KRW=X", Bucket::Fx),
            ("GC=F", Bucket::Commodity),
            ("CL=F", Bucket::Commodity),
            ("BTC-USD", Bucket::Crypto),
        ] {
            match self.fetch_series(symbol, as_of, 10).await {
                Ok(series) => {
                    if let Some(quote) = latest_quote(symbol, &series) {
                        match bucket {
                            Bucket::Index => snapshot.indices.push(quote),
                            Bucket::Fx => snapshot.fx.push(quote),
                            Bucket::Commodity => snapshot.commodities.push(quote),
                            Bucket::Crypto => snapshot.crypto.push(quote),
                        }
                    }
                }
                Err(e) => warn!(symbol, error = %e, "글로벌 심볼 조회 실패, 건너뜀"),
            }
        }

        snapshot
    }
}

enum Bucket {
    Index,
    Fx,
    Commodity,
    Crypto,
}

/// 시계열의 마지막 두 봉으로 최근 시세와 등락률을 계산.
fn latest_quote(symbol: &str, series: &PriceSeries) -> Option<GlobalQuote> {
    let last = series.last()?;
    let change_pct = match series.len().checked_sub(2).and_then(|i| series.get(i)) {
        Some(prev) if !prev.close.is_zero() => {
            (last.close - prev.close) / prev.close * Decimal::from(100)
        }
        _ => Decimal::ZERO,
    };

    Some(GlobalQuote {
        symbol: symbol.to_string(),
        close: last.close,
        change_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use kquant_core::Kline;
    use rust_decimal_macros::dec;

    use crate::provider::MarketDataProvider;

    fn kline(day: u32, close: Decimal) -> Kline {
        Kline::new(
            "^GSPC",
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            close,
            close,
            close,
            close,
            0,
        )
    }

    #[test]
    fn test_latest_quote_change_pct() {
        let series = vec![kline(3, dec!(5000)), kline(4, dec!(5100))];
        let quote = latest_quote("^GSPC", &series).unwrap();
        assert_eq!(quote.close, dec!(5100));
        assert_eq!(quote.change_pct, dec!(2));
    }

    #[test]
    fn test_latest_quote_single_bar() {
        let series = vec![kline(3, dec!(5000))];
        let quote = latest_quote("^GSPC", &series).unwrap();
        assert_eq!(quote.change_pct, Decimal::ZERO);
    }

    #[test]
    fn test_latest_quote_empty() {
        assert!(latest_quote("^GSPC", &Vec::new()).is_none());
    }

    struct StubProvider(PriceSeries);

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_daily(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_fetch_series_sanitizes_bad_bars() {
        // 비정상 봉(종가 0)은 국내 경로와 동일하게 직전 종가로 보정된다
        let series = vec![
            kline(3, dec!(5000)),
            kline(4, dec!(0)),
            kline(5, dec!(5100)),
        ];
        let fetcher = GlobalDataFetcher::with_source(FailoverDataSource::new(vec![Arc::new(
            StubProvider(series),
        )]));

        let as_of = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let fetched = fetcher.fetch_index("^GSPC", as_of, 10).await.unwrap();

        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[1].close, dec!(5000));
        assert_eq!(fetched[1].volume, 0);
        assert_eq!(fetched[2].close, dec!(5100));
    }
}
