//! 데이터 Provider 모듈.
//!
//! 다양한 소스에서 시세 데이터를 가져오는 Provider들을 정의합니다.
//! 각 Provider는 소스별 특이사항(타임존, 컬럼 이름, 숫자 형식)을
//! 어댑터 내부에서 정규화하여 공통 `Kline` 형태로 반환합니다.
//!
//! ## 우선순위
//! 1. `KrxProvider`: KRX Open API (공식 거래소 소스, 인증키 필요)
//! 2. `NaverProvider`: 네이버 금융 크롤러 (보조)
//! 3. `YahooProvider`: Yahoo Finance (범용, 최후 수단)

pub mod krx;
pub mod naver;
pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use kquant_core::PriceSeries;

use crate::error::Result;

pub use krx::KrxProvider;
pub use naver::NaverProvider;
pub use yahoo::YahooProvider;

/// 시세 데이터 Provider 공통 인터페이스.
///
/// 읽기 전용이며 부수 효과가 없습니다. 캐싱은 계약에 포함되지 않고,
/// 런 단위 메모이제이션은 상위 계층(`RunCache`)이 담당합니다.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider 이름 (탈락 기록과 로그에 사용).
    fn name(&self) -> &'static str;

    /// 일봉 시계열 조회 (날짜 오름차순).
    ///
    /// `symbol`은 6자리 종목코드 또는 지수/글로벌 심볼입니다.
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}
