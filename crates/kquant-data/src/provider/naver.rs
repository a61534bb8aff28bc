//! 네이버 금융 크롤러 Provider.
//!
//! 국내(KR) 주식의 일봉/수급/상승률 상위 데이터를 네이버 금융에서 수집합니다.
//! KRX Open API가 실패하거나 인증키가 없을 때의 2순위 소스입니다.
//!
//! ## 데이터 소스
//! - `/item/sise_day.naver`: 일별 시세 (OHLCV)
//! - `/item/frgn.naver`: 외국인/기관 순매매
//! - `/sise/sise_rise.naver`: 상승률 상위 종목

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use kquant_core::{Kline, Market, PriceSeries, StockCandidate, SupplyData};

use crate::error::{DataError, Result};
use crate::provider::MarketDataProvider;

const BASE_URL: &str = "https://finance.naver.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 네이버 금융 크롤러 Provider.
///
/// HTML 파싱을 통해 네이버 금융에서 시세 데이터를 수집합니다.
pub struct NaverProvider {
    client: reqwest::Client,
    base_url: String,
    /// 요청 간 딜레이 (기본: 300ms)
    request_delay: Duration,
}

impl Default for NaverProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NaverProvider {
    /// 기본 설정으로 생성.
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(300))
    }

    /// 커스텀 딜레이로 생성.
    pub fn with_delay(request_delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self {
            client,
            base_url: BASE_URL.to_string(),
            request_delay,
        }
    }

    /// 테스트용으로 베이스 URL을 교체합니다.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    // Html은 Send가 아니므로 await 지점을 넘기지 않도록 본문 문자열만 반환합니다.
    async fn get_body(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;

        if response.status().as_u16() == 429 {
            return Err(DataError::RateLimited(url));
        }
        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "네이버 금융 응답 오류: {} ({})",
                response.status(),
                url
            )));
        }

        Ok(response.text().await?)
    }

    /// 일별 시세 페이지 한 장을 파싱합니다.
    fn parse_sise_day_page(symbol: &str, body: &str) -> Vec<Kline> {
        let (Ok(row_sel), Ok(cell_sel)) = (
            Selector::parse("table.type2 tr"),
            Selector::parse("td"),
        ) else {
            return Vec::new();
        };

        let html = Html::parse_document(body);
        let mut klines = Vec::new();
        for row in html.select(&row_sel) {
            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();

            // 날짜, 종가, 전일비, 시가, 고가, 저가, 거래량
            if cells.len() < 7 {
                continue;
            }
            let Some(date) = parse_kr_date(&cells[0]) else {
                continue;
            };
            let (Some(close), Some(open), Some(high), Some(low)) = (
                parse_decimal(&cells[1]),
                parse_decimal(&cells[3]),
                parse_decimal(&cells[4]),
                parse_decimal(&cells[5]),
            ) else {
                continue;
            };
            let volume = parse_i64(&cells[6]).unwrap_or(0);

            klines.push(Kline {
                symbol: symbol.to_string(),
                date,
                open,
                high,
                low,
                close,
                volume,
                trading_value: None,
            });
        }
        klines
    }

    /// 외국인/기관 순매매 데이터 수집.
    ///
    /// 순매매량(주) × 해당일 종가로 금액을 근사합니다.
    pub async fn fetch_supply(&self, ticker: &str) -> Result<SupplyData> {
        let mut daily: Vec<(NaiveDate, Decimal, Decimal, Decimal)> = Vec::new();

        // 페이지당 20 거래일, 60일 윈도우를 위해 3페이지 수집
        for page in 1..=3 {
            let body = self
                .get_body(&format!("/item/frgn.naver?code={}&page={}", ticker, page))
                .await?;
            daily.extend(Self::parse_frgn_page(&body));
            tokio::time::sleep(self.request_delay).await;
        }

        if daily.is_empty() {
            return Err(DataError::InvalidData {
                provider: "naver".to_string(),
                reason: format!("수급 데이터 없음: {}", ticker),
            });
        }

        // 최신 날짜가 앞에 오도록 정렬
        daily.sort_by(|a, b| b.0.cmp(&a.0));

        let window_sum = |n: usize| -> (Decimal, Decimal) {
            daily.iter().take(n).fold(
                (Decimal::ZERO, Decimal::ZERO),
                |(f_acc, i_acc), (_, close, inst, frgn)| {
                    (f_acc + *frgn * *close, i_acc + *inst * *close)
                },
            )
        };

        let (foreign_net_5d, institution_net_5d) = window_sum(5);
        let (foreign_net_20d, institution_net_20d) = window_sum(20);
        let (foreign_net_60d, institution_net_60d) = window_sum(60);

        // 외국인+기관 합산이 양(+)인 날이 끊기지 않고 이어진 일수
        let buy_streak_days = daily
            .iter()
            .take_while(|(_, _, inst, frgn)| *inst + *frgn > Decimal::ZERO)
            .count() as u32;

        Ok(SupplyData {
            foreign_net_5d,
            foreign_net_20d,
            foreign_net_60d,
            institution_net_5d,
            institution_net_20d,
            institution_net_60d,
            buy_streak_days,
        })
    }

    /// 순매매 페이지 파싱: (날짜, 종가, 기관 순매매량, 외국인 순매매량).
    fn parse_frgn_page(body: &str) -> Vec<(NaiveDate, Decimal, Decimal, Decimal)> {
        let (Ok(row_sel), Ok(cell_sel)) = (
            Selector::parse("table.type2 tr"),
            Selector::parse("td"),
        ) else {
            return Vec::new();
        };

        let html = Html::parse_document(body);
        let mut rows = Vec::new();
        for row in html.select(&row_sel) {
            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();

            // 날짜, 종가, 전일비, 등락률, 거래량, 기관 순매매량, 외국인 순매매량, ...
            if cells.len() < 7 {
                continue;
            }
            let Some(date) = parse_kr_date(&cells[0]) else {
                continue;
            };
            let (Some(close), Some(inst), Some(frgn)) = (
                parse_decimal(&cells[1]),
                parse_decimal(&cells[5]),
                parse_decimal(&cells[6]),
            ) else {
                continue;
            };
            rows.push((date, close, inst, frgn));
        }
        rows
    }

    /// 상승률 상위 종목 조회.
    pub async fn fetch_top_gainers(&self, market: Market, limit: usize) -> Result<Vec<StockCandidate>> {
        let sosok = match market {
            Market::Kospi => 0,
            Market::Kosdaq => 1,
        };
        let body = self
            .get_body(&format!("/sise/sise_rise.naver?sosok={}", sosok))
            .await?;
        let candidates = Self::parse_rise_page(market, limit, &body);

        tracing::debug!(market = %market, count = candidates.len(), "상승률 상위 조회 완료");
        Ok(candidates)
    }

    /// 상승률 상위 페이지 파싱.
    fn parse_rise_page(market: Market, limit: usize, body: &str) -> Vec<StockCandidate> {
        let (Ok(row_sel), Ok(cell_sel), Ok(link_sel)) = (
            Selector::parse("table.type_2 tr"),
            Selector::parse("td"),
            Selector::parse("a.tltle"),
        ) else {
            return Vec::new();
        };

        let html = Html::parse_document(body);
        let mut candidates = Vec::new();
        for row in html.select(&row_sel) {
            let Some(link) = row.select(&link_sel).next() else {
                continue;
            };
            let name = link.text().collect::<String>().trim().to_string();
            let Some(ticker) = link
                .value()
                .attr("href")
                .and_then(|href| href.split("code=").nth(1))
                .map(|c| c.chars().take(6).collect::<String>())
            else {
                continue;
            };

            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();
            // N, 종목명, 현재가, 전일비, 등락률, 거래량, 거래대금(백만)
            if cells.len() < 7 {
                continue;
            }
            let (Some(price), Some(change_pct)) =
                (parse_decimal(&cells[2]), parse_decimal(&cells[4]))
            else {
                continue;
            };
            let trading_value = parse_decimal(&cells[6])
                .map(|v| v * Decimal::from(1_000_000))
                .unwrap_or(Decimal::ZERO);

            candidates.push(StockCandidate::new(
                ticker,
                name,
                market,
                price,
                change_pct,
                trading_value,
            ));
            if candidates.len() >= limit {
                break;
            }
        }
        candidates
    }
}

#[async_trait]
impl MarketDataProvider for NaverProvider {
    fn name(&self) -> &'static str {
        "naver"
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let mut series: PriceSeries = Vec::new();

        // 페이지당 10 거래일. 시작일 이전 데이터가 나오면 중단.
        for page in 1..=40 {
            let body = self
                .get_body(&format!(
                    "/item/sise_day.naver?code={}&page={}",
                    symbol, page
                ))
                .await?;

            let klines = Self::parse_sise_day_page(symbol, &body);
            if klines.is_empty() {
                break;
            }
            let oldest = klines.iter().map(|k| k.date).min();
            series.extend(klines);

            if oldest.is_some_and(|d| d < start) {
                break;
            }
            tokio::time::sleep(self.request_delay).await;
        }

        series.retain(|k| k.date >= start && k.date <= end);
        series.sort_by_key(|k| k.date);
        series.dedup_by_key(|k| k.date);

        tracing::debug!(ticker = symbol, count = series.len(), "네이버 일별 시세 조회 완료");
        Ok(series)
    }
}

/// "2024.06.03" 형식의 날짜 파싱.
fn parse_kr_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y.%m.%d").ok()
}

/// 쉼표/부호가 포함된 숫자 텍스트 파싱.
fn parse_decimal(s: &str) -> Option<Decimal> {
    let cleaned = s.replace(",", "").replace("%", "").replace("+", "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// 쉼표가 포함된 정수 텍스트 파싱.
fn parse_i64(s: &str) -> Option<i64> {
    s.replace(",", "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_kr_date() {
        assert_eq!(
            parse_kr_date("2024.06.03"),
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
        assert_eq!(parse_kr_date("2024-06-03"), None);
    }

    #[test]
    fn test_parse_decimal_signs() {
        assert_eq!(parse_decimal("71,500"), Some(dec!(71500)));
        assert_eq!(parse_decimal("+4.25%"), Some(dec!(4.25)));
        assert_eq!(parse_decimal("-1,230"), Some(dec!(-1230)));
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_sise_day_page() {
        let body = r#"<table class="type2">
                <tr><th>날짜</th></tr>
                <tr>
                    <td>2024.06.04</td><td>72,000</td><td>500</td>
                    <td>71,400</td><td>72,300</td><td>71,200</td><td>11,222,333</td>
                </tr>
                <tr>
                    <td>2024.06.03</td><td>71,500</td><td>300</td>
                    <td>71,000</td><td>71,900</td><td>70,800</td><td>9,876,543</td>
                </tr>
                <tr><td colspan="7">&nbsp;</td></tr>
            </table>"#;

        let klines = NaverProvider::parse_sise_day_page("005930", body);
        assert_eq!(klines.len(), 2);
        assert_eq!(klines[0].close, dec!(72000));
        assert_eq!(klines[0].volume, 11_222_333);
        assert_eq!(klines[1].low, dec!(70800));
    }

    #[test]
    fn test_parse_frgn_page() {
        let body = r#"<table class="type2">
                <tr>
                    <td>2024.06.04</td><td>72,000</td><td>500</td><td>+0.70%</td>
                    <td>11,000,000</td><td>-120,000</td><td>+350,000</td>
                    <td>3,000,000,000</td><td>50.1</td>
                </tr>
            </table>"#;

        let rows = NaverProvider::parse_frgn_page(body);
        assert_eq!(rows.len(), 1);
        let (_, close, inst, frgn) = &rows[0];
        assert_eq!(*close, dec!(72000));
        assert_eq!(*inst, dec!(-120000));
        assert_eq!(*frgn, dec!(350000));
    }

    #[test]
    fn test_parse_rise_page() {
        let body = r#"<table class="type_2">
                <tr>
                    <td>1</td>
                    <td><a class="tltle" href="/item/main.naver?code=005930">삼성전자</a></td>
                    <td>72,000</td><td>3,000</td><td>+4.35%</td>
                    <td>11,222,333</td><td>812,345</td>
                </tr>
            </table>"#;

        let candidates = NaverProvider::parse_rise_page(Market::Kospi, 10, body);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ticker, "005930");
        assert_eq!(candidates[0].change_pct, dec!(4.35));
    }

    // 멀티스레드 런타임에서 spawn 가능하려면 모든 조회 Future가 Send여야 한다
    #[test]
    fn test_fetch_futures_are_send() {
        fn assert_send<T: Send>(_: T) {}

        let provider = NaverProvider::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();

        assert_send(provider.fetch_daily("005930", start, end));
        assert_send(provider.fetch_supply("005930"));
        assert_send(provider.fetch_top_gainers(Market::Kospi, 10));
    }
}
