//! KRX Open API Provider.
//!
//! 한국거래소(KRX) Open API를 통해 일봉 시세를 수집합니다.
//! 공식 거래소 소스이므로 장애 조치 우선순위 1순위입니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use kquant_data::provider::KrxProvider;
//!
//! let provider = KrxProvider::from_env()?;
//! let series = provider.fetch_daily("005930", start, end).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use kquant_core::{Kline, PriceSeries};

use crate::error::{DataError, Result};
use crate::provider::MarketDataProvider;

/// API 응답 래퍼.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(rename = "OutBlock_1")]
    out_block: Option<Vec<T>>,
}

/// KRX Open API Provider.
#[derive(Clone)]
pub struct KrxProvider {
    client: reqwest::Client,
    auth_key: String,
    base_url: String,
}

impl KrxProvider {
    /// 새로운 KRX Provider 생성.
    ///
    /// # Arguments
    /// * `auth_key` - KRX Open API 인증키
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("HTTP 클라이언트 생성 실패"),
            auth_key: auth_key.into(),
            base_url: "https://data-dbg.krx.co.kr".to_string(),
        }
    }

    /// `KRX_API_KEY` 환경변수에서 인증키를 읽어 생성합니다.
    pub fn from_env() -> Result<Self> {
        let auth_key = std::env::var("KRX_API_KEY").map_err(|_| {
            DataError::ConfigError("KRX_API_KEY 환경변수가 설정되지 않았습니다".to_string())
        })?;
        Ok(Self::new(auth_key))
    }

    /// 테스트용으로 베이스 URL을 교체합니다.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// API 요청 공통 처리.
    async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        category: &str,
        api_id: &str,
        params: &HashMap<&str, &str>,
    ) -> Result<Vec<T>> {
        let url = format!("{}/svc/sample/apis/{}/{}", self.base_url, category, api_id);

        tracing::debug!(api_id = api_id, url = %url, "KRX API 요청");

        let response = self
            .client
            .get(&url)
            .query(params)
            // AUTH_KEY를 HTTP 헤더로 전달 (명세 준수)
            .header("AUTH_KEY", &self.auth_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if response.status().as_u16() == 429 {
            return Err(DataError::RateLimited(format!("KRX API [{}]", api_id)));
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(DataError::FetchError(format!(
                "KRX API 오류 [{}]: {}",
                api_id, status
            )));
        }

        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(format!("KRX 응답 파싱 실패: {}", e)))?;

        Ok(data.out_block.unwrap_or_default())
    }

    /// 지수 일별 시세 조회 (KOSPI/KOSDAQ).
    pub async fn fetch_index_daily(
        &self,
        index_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        #[derive(Deserialize)]
        struct RawIndex {
            #[serde(rename = "TRD_DD")]
            date: String,
            #[serde(rename = "IDX_NM", default)]
            index_name: Option<String>,
            #[serde(rename = "OPNPRC_IDX", default)]
            open: Option<String>,
            #[serde(rename = "HGPRC_IDX", default)]
            high: Option<String>,
            #[serde(rename = "LWPRC_IDX", default)]
            low: Option<String>,
            #[serde(rename = "CLSPRC_IDX", default)]
            close: Option<String>,
            #[serde(rename = "ACC_TRDVOL", default)]
            volume: Option<String>,
            #[serde(rename = "ACC_TRDVAL", default)]
            trading_value: Option<String>,
        }

        let start_str = start.format("%Y%m%d").to_string();
        let end_str = end.format("%Y%m%d").to_string();
        let params: HashMap<&str, &str> =
            [("strtDd", start_str.as_str()), ("endDd", end_str.as_str())]
                .into_iter()
                .collect();

        let raw: Vec<RawIndex> = self.request("idx", "krx_dd_trd", &params).await?;

        let mut series: PriceSeries = raw
            .into_iter()
            .filter(|r| {
                r.index_name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(index_name))
            })
            .filter_map(|r| {
                let date = parse_date(&r.date)?;
                let close = parse_decimal_opt(&r.close)?;
                Some(Kline {
                    symbol: index_name.to_string(),
                    date,
                    open: parse_decimal_opt(&r.open).unwrap_or(close),
                    high: parse_decimal_opt(&r.high).unwrap_or(close),
                    low: parse_decimal_opt(&r.low).unwrap_or(close),
                    close,
                    volume: parse_i64_opt(&r.volume).unwrap_or(0),
                    trading_value: parse_decimal_opt(&r.trading_value),
                })
            })
            .collect();

        series.sort_by_key(|k| k.date);

        tracing::debug!(index = index_name, count = series.len(), "지수 시세 조회 완료");
        Ok(series)
    }
}

#[async_trait]
impl MarketDataProvider for KrxProvider {
    fn name(&self) -> &'static str {
        "krx"
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        // 지수 심볼은 별도 API를 사용
        if symbol == "KOSPI" || symbol == "KOSDAQ" {
            return self.fetch_index_daily(symbol, start, end).await;
        }

        #[derive(Deserialize)]
        struct RawOhlcv {
            #[serde(rename = "TRD_DD")]
            date: String,
            #[serde(rename = "TDD_OPNPRC", default)]
            open: Option<String>,
            #[serde(rename = "TDD_HGPRC", default)]
            high: Option<String>,
            #[serde(rename = "TDD_LWPRC", default)]
            low: Option<String>,
            #[serde(rename = "TDD_CLSPRC", default)]
            close: Option<String>,
            #[serde(rename = "ACC_TRDVOL", default)]
            volume: Option<String>,
            #[serde(rename = "ACC_TRDVAL", default)]
            trading_value: Option<String>,
        }

        let start_str = start.format("%Y%m%d").to_string();
        let end_str = end.format("%Y%m%d").to_string();
        let params: HashMap<&str, &str> = [
            ("isuCd", symbol),
            ("strtDd", start_str.as_str()),
            ("endDd", end_str.as_str()),
        ]
        .into_iter()
        .collect();

        let raw: Vec<RawOhlcv> = self.request("stk", "stk_isu_ohlcv", &params).await?;

        let mut series: PriceSeries = raw
            .into_iter()
            .filter_map(|r| {
                let date = parse_date(&r.date)?;
                let close = parse_decimal_opt(&r.close)?;
                Some(Kline {
                    symbol: symbol.to_string(),
                    date,
                    open: parse_decimal_opt(&r.open).unwrap_or(close),
                    high: parse_decimal_opt(&r.high).unwrap_or(close),
                    low: parse_decimal_opt(&r.low).unwrap_or(close),
                    close,
                    volume: parse_i64_opt(&r.volume).unwrap_or(0),
                    trading_value: parse_decimal_opt(&r.trading_value),
                })
            })
            .collect();

        series.sort_by_key(|k| k.date);

        tracing::debug!(ticker = symbol, count = series.len(), "일별 시세 조회 완료");
        Ok(series)
    }
}

/// 문자열을 Decimal로 파싱 (쉼표 제거).
fn parse_decimal_opt(s: &Option<String>) -> Option<Decimal> {
    s.as_ref().and_then(|v| {
        let cleaned = v.replace(",", "").replace("%", "");
        if cleaned.is_empty() || cleaned == "-" {
            return None;
        }
        cleaned.parse().ok()
    })
}

/// 문자열을 i64로 파싱 (쉼표 제거).
fn parse_i64_opt(s: &Option<String>) -> Option<i64> {
    s.as_ref().and_then(|v| v.replace(",", "").parse().ok())
}

/// KRX 날짜 문자열 파싱 (YYYY/MM/DD 또는 YYYYMMDD).
fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.contains('/') {
        NaiveDate::parse_from_str(s, "%Y/%m/%d").ok()
    } else {
        NaiveDate::parse_from_str(s, "%Y%m%d").ok()
    }
}
