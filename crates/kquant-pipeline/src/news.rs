//! 뉴스 수집 (Phase2).
//!
//! 네이버 검색 Open API로 종목별 최근 뉴스를 수집합니다.
//! 뉴스가 없는 것은 정상 상태이며 빈 목록으로 표현합니다.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// 수집된 뉴스 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// 제목 (HTML 태그 제거됨)
    pub title: String,
    /// 요약
    pub description: String,
    /// 원문 링크
    pub link: String,
    /// 발행 시각
    pub published_at: DateTime<Utc>,
}

/// 뉴스 수집 인터페이스.
#[async_trait]
pub trait NewsCollector: Send + Sync {
    /// 검색어(종목명)로 최근 `window_days`일 이내의 뉴스를 수집합니다.
    ///
    /// 뉴스가 없으면 빈 목록을 반환하며, 이는 오류가 아닙니다.
    async fn recent_news(&self, query: &str, window_days: u32) -> Result<Vec<NewsItem>>;
}

/// 네이버 검색 Open API 뉴스 수집기.
pub struct NaverNewsCollector {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    description: String,
    link: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

impl NaverNewsCollector {
    const BASE_URL: &'static str = "https://openapi.naver.com";

    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// 환경 변수(NAVER_CLIENT_ID / NAVER_CLIENT_SECRET)에서 생성.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("NAVER_CLIENT_ID")
            .map_err(|_| PipelineError::News("NAVER_CLIENT_ID 미설정".to_string()))?;
        let client_secret = std::env::var("NAVER_CLIENT_SECRET")
            .map_err(|_| PipelineError::News("NAVER_CLIENT_SECRET 미설정".to_string()))?;
        Ok(Self::new(client_id, client_secret))
    }

    /// 테스트용으로 베이스 URL을 교체합니다.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl NewsCollector for NaverNewsCollector {
    async fn recent_news(&self, query: &str, window_days: u32) -> Result<Vec<NewsItem>> {
        let url = format!("{}/v1/search/news.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[("query", query), ("display", "20"), ("sort", "date")])
            .send()
            .await
            .map_err(|e| PipelineError::News(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::News(format!(
                "네이버 뉴스 API 응답 오류: {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::News(format!("뉴스 응답 파싱 실패: {}", e)))?;

        let cutoff = Utc::now() - Duration::days(window_days as i64);
        let items: Vec<NewsItem> = body
            .items
            .into_iter()
            .filter_map(|item| {
                let published_at = parse_rfc2822(&item.pub_date)?;
                if published_at < cutoff {
                    return None;
                }
                Some(NewsItem {
                    title: strip_html(&item.title),
                    description: strip_html(&item.description),
                    link: item.link,
                    published_at,
                })
            })
            .collect();

        debug!(query, count = items.len(), "뉴스 수집 완료");
        Ok(items)
    }
}

/// RFC 2822 형식의 발행 시각 파싱 (예: "Mon, 03 Jun 2024 09:30:00 +0900").
fn parse_rfc2822(s: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 검색 결과에 섞여 오는 <b> 태그와 엔티티를 제거합니다.
fn strip_html(s: &str) -> String {
    s.replace("<b>", "")
        .replace("</b>", "")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<b>삼성전자</b> 신고가 &amp; 거래량 급증"),
            "삼성전자 신고가 & 거래량 급증"
        );
    }

    #[test]
    fn test_parse_rfc2822() {
        let parsed = parse_rfc2822("Mon, 03 Jun 2024 09:30:00 +0900").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-06-03T00:30:00+00:00");
    }

    #[test]
    fn test_parse_rfc2822_invalid() {
        assert!(parse_rfc2822("2024-06-03").is_none());
    }
}
