//! 시장 데이터 수집 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 여러 데이터 소스에 대한 공통 Provider 인터페이스
//! - 우선순위 기반 장애 조치 (`FailoverDataSource`)
//! - 지수/환율/원자재/암호화폐용 `GlobalDataFetcher`
//! - 런 단위 인메모리 캐시 (`RunCache`)
//! - 후보/수급 데이터 조회용 `StockDataFetcher`

pub mod cache;
pub mod error;
pub mod failover;
pub mod fetcher;
pub mod global;
pub mod provider;

pub use cache::RunCache;
pub use error::{DataError, Result};
pub use failover::FailoverDataSource;
pub use fetcher::{MarketDataService, StockDataFetcher};
pub use global::{GlobalDataFetcher, GlobalQuote, GlobalSnapshot};
pub use provider::{KrxProvider, MarketDataProvider, NaverProvider, YahooProvider};
