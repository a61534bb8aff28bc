//! 런 단위 인메모리 캐시.
//!
//! 한 번의 파이프라인 런 동안 동일 종목의 시계열/수급 데이터를
//! 재조회하지 않도록 메모이제이션합니다. 런이 끝나면 캐시도 버려집니다.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use kquant_core::{PriceSeries, SupplyData};

/// 런 단위 캐시.
///
/// `Arc`로 감싼 값을 반환하므로 여러 태스크가 복사 없이 공유할 수 있습니다.
#[derive(Default)]
pub struct RunCache {
    prices: RwLock<HashMap<String, Arc<PriceSeries>>>,
    supply: RwLock<HashMap<String, Arc<SupplyData>>>,
}

impl RunCache {
    /// 빈 캐시 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 캐시된 시계열 조회.
    pub async fn get_prices(&self, symbol: &str) -> Option<Arc<PriceSeries>> {
        self.prices.read().await.get(symbol).cloned()
    }

    /// 시계열 저장. 저장된 `Arc`를 돌려줍니다.
    pub async fn put_prices(&self, symbol: &str, series: PriceSeries) -> Arc<PriceSeries> {
        let arc = Arc::new(series);
        self.prices
            .write()
            .await
            .insert(symbol.to_string(), Arc::clone(&arc));
        arc
    }

    /// 캐시된 수급 데이터 조회.
    pub async fn get_supply(&self, symbol: &str) -> Option<Arc<SupplyData>> {
        self.supply.read().await.get(symbol).cloned()
    }

    /// 수급 데이터 저장.
    pub async fn put_supply(&self, symbol: &str, data: SupplyData) -> Arc<SupplyData> {
        let arc = Arc::new(data);
        self.supply
            .write()
            .await
            .insert(symbol.to_string(), Arc::clone(&arc));
        arc
    }

    /// 캐시된 시계열 항목 수.
    pub async fn price_entries(&self) -> usize {
        self.prices.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kquant_core::Kline;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_prices_roundtrip() {
        let cache = RunCache::new();
        assert!(cache.get_prices("005930").await.is_none());

        let kline = Kline::new(
            "005930",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            dec!(70000),
            dec!(71000),
            dec!(69500),
            dec!(70500),
            1_000_000,
        );
        cache.put_prices("005930", vec![kline]).await;

        let cached = cache.get_prices("005930").await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cache.price_entries().await, 1);
    }

    #[tokio::test]
    async fn test_supply_roundtrip() {
        let cache = RunCache::new();
        let data = SupplyData {
            foreign_net_5d: dec!(1000),
            foreign_net_20d: dec!(2000),
            foreign_net_60d: dec!(3000),
            institution_net_5d: dec!(-500),
            institution_net_20d: dec!(100),
            institution_net_60d: dec!(200),
            buy_streak_days: 3,
        };
        cache.put_supply("005930", data.clone()).await;

        let cached = cache.get_supply("005930").await.unwrap();
        assert_eq!(*cached, data);
    }
}
