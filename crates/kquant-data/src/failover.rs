//! 우선순위 기반 데이터 소스 장애 조치.
//!
//! 등록된 Provider를 순서대로 시도하고, 처음으로 유효한 시계열을 반환한
//! Provider의 결과를 사용합니다. 모든 Provider가 실패하면 시도한 Provider
//! 이름 목록을 담아 `DataError::Unavailable`을 반환합니다.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use kquant_core::PriceSeries;

use crate::error::{DataError, Result};
use crate::provider::MarketDataProvider;

/// 우선순위 기반 장애 조치 데이터 소스.
///
/// Provider의 등록 순서가 곧 우선순위입니다.
pub struct FailoverDataSource {
    providers: Vec<Arc<dyn MarketDataProvider>>,
}

impl FailoverDataSource {
    /// Provider 목록으로 생성합니다. 비어 있으면 안 됩니다.
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self { providers }
    }

    /// 국내 주식용 기본 구성: KRX → 네이버 → Yahoo.
    ///
    /// KRX 인증키가 없으면 KRX는 목록에서 제외됩니다.
    pub fn korean_default() -> Result<Self> {
        let mut providers: Vec<Arc<dyn MarketDataProvider>> = Vec::new();

        match crate::provider::KrxProvider::from_env() {
            Ok(krx) => providers.push(Arc::new(krx)),
            Err(e) => warn!(error = %e, "KRX Provider 비활성화"),
        }
        providers.push(Arc::new(crate::provider::NaverProvider::new()));
        providers.push(Arc::new(crate::provider::YahooProvider::new()?));

        Ok(Self::new(providers))
    }

    /// 등록된 Provider 이름 목록.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// 일봉 시계열 조회.
    ///
    /// 각 Provider의 결과는 유효성 검사와 단일 스텝 보정을 거칩니다.
    /// 검사에 실패한 결과는 실패한 조회와 동일하게 취급하고 다음
    /// Provider로 넘어갑니다.
    pub async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let mut attempted = Vec::new();

        for provider in &self.providers {
            attempted.push(provider.name().to_string());

            match provider.fetch_daily(symbol, start, end).await {
                Ok(series) => match sanitize_series(provider.name(), series) {
                    Ok(series) => {
                        debug!(
                            ticker = symbol,
                            provider = provider.name(),
                            count = series.len(),
                            "시계열 조회 성공"
                        );
                        return Ok(series);
                    }
                    Err(e) => {
                        warn!(
                            ticker = symbol,
                            provider = provider.name(),
                            error = %e,
                            "유효성 검사 실패, 다음 Provider로 이동"
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        ticker = symbol,
                        provider = provider.name(),
                        error = %e,
                        "조회 실패, 다음 Provider로 이동"
                    );
                }
            }
        }

        Err(DataError::Unavailable {
            symbol: symbol.to_string(),
            attempted,
        })
    }
}

/// 시계열 유효성 검사 및 보정.
///
/// - 빈 시계열은 거부
/// - 날짜 오름차순 정렬과 중복 제거를 보장
/// - 종가가 0 이하인 봉은 직전 봉의 종가로 1스텝까지만 보정
/// - 연속 2개 이상의 비정상 봉은 보간하지 않고 버림
fn sanitize_series(provider: &str, mut series: PriceSeries) -> Result<PriceSeries> {
    series.sort_by_key(|k| k.date);
    series.dedup_by_key(|k| k.date);

    let mut sanitized: PriceSeries = Vec::with_capacity(series.len());
    let mut prev_filled = false;

    for mut kline in series {
        let invalid = kline.close <= Decimal::ZERO
            || kline.high < kline.low
            || kline.low <= Decimal::ZERO;

        if invalid {
            // 보정은 직전 봉이 정상일 때 1스텝만. 그 외에는 봉을 버림.
            let close = match sanitized.last() {
                Some(prev) if !prev_filled => prev.close,
                _ => continue,
            };
            kline.open = close;
            kline.high = close;
            kline.low = close;
            kline.close = close;
            kline.volume = 0;
            prev_filled = true;
        } else {
            prev_filled = false;
        }
        sanitized.push(kline);
    }

    if sanitized.is_empty() {
        return Err(DataError::InvalidData {
            provider: provider.to_string(),
            reason: "유효한 봉 없음".to_string(),
        });
    }

    Ok(sanitized)
}
