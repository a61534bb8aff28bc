//! 파이프라인이 소비하는 데이터 수집 서비스.
//!
//! `StockDataFetcher` 트레잇이 파이프라인과 데이터 계층의 경계입니다.
//! 실제 구현(`MarketDataService`)은 장애 조치 소스와 런 캐시를 조합하고,
//! 테스트에서는 이 트레잇을 스텁으로 대체합니다.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::debug;

use kquant_core::{Market, PriceSeries, StockCandidate, SupplyData};

use crate::cache::RunCache;
use crate::error::Result;
use crate::failover::FailoverDataSource;
use crate::provider::NaverProvider;

/// 파이프라인용 데이터 수집 인터페이스.
#[async_trait]
pub trait StockDataFetcher: Send + Sync {
    /// 시장 지수 일봉 조회 ("KOSPI" / "KOSDAQ").
    async fn fetch_index(&self, symbol: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries>;

    /// 개별 종목 일봉 조회.
    async fn fetch_prices(&self, ticker: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries>;

    /// 외국인/기관 수급 데이터 조회.
    async fn fetch_supply(&self, ticker: &str) -> Result<SupplyData>;

    /// 시장별 상승률 상위 종목 조회.
    async fn top_gainers(&self, market: Market, limit: usize) -> Result<Vec<StockCandidate>>;
}

/// 장애 조치 소스 + 런 캐시를 조합한 기본 구현.
pub struct MarketDataService {
    source: FailoverDataSource,
    naver: NaverProvider,
    cache: RunCache,
}

impl MarketDataService {
    pub fn new(source: FailoverDataSource) -> Self {
        Self {
            source,
            naver: NaverProvider::new(),
            cache: RunCache::new(),
        }
    }

    /// 국내 기본 구성(KRX → 네이버 → Yahoo)으로 생성.
    pub fn korean_default() -> Result<Self> {
        Ok(Self::new(FailoverDataSource::korean_default()?))
    }

    async fn fetch_cached(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        days: i64,
    ) -> Result<PriceSeries> {
        if let Some(cached) = self.cache.get_prices(symbol).await {
            debug!(ticker = symbol, "런 캐시 적중");
            return Ok((*cached).clone());
        }

        // 휴장일을 감안해 달력일 기준 1.6배 여유를 둔 범위로 조회
        let start = as_of - Duration::days(days * 8 / 5 + 10);
        let series = self.source.fetch_daily(symbol, start, as_of).await?;
        let arc = self.cache.put_prices(symbol, series).await;
        Ok((*arc).clone())
    }
}

#[async_trait]
impl StockDataFetcher for MarketDataService {
    async fn fetch_index(&self, symbol: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries> {
        self.fetch_cached(symbol, as_of, days).await
    }

    async fn fetch_prices(&self, ticker: &str, as_of: NaiveDate, days: i64) -> Result<PriceSeries> {
        self.fetch_cached(ticker, as_of, days).await
    }

    async fn fetch_supply(&self, ticker: &str) -> Result<SupplyData> {
        if let Some(cached) = self.cache.get_supply(ticker).await {
            return Ok((*cached).clone());
        }
        let data = self.naver.fetch_supply(ticker).await?;
        let arc = self.cache.put_supply(ticker, data).await;
        Ok((*arc).clone())
    }

    async fn top_gainers(&self, market: Market, limit: usize) -> Result<Vec<StockCandidate>> {
        self.naver.fetch_top_gainers(market, limit).await
    }
}
