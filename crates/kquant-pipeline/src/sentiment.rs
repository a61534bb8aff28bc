//! LLM 감성 분석 (Phase3).
//!
//! OpenAI 호환 Chat Completions API로 종목별 뉴스 헤드라인을 배치 평가해
//! 뉴스 점수(0~3)를 받아옵니다. 응답은 마크다운 코드 펜스를 제거한 뒤
//! JSON으로 파싱합니다.
//!
//! 배치 계약: 응답 배열의 길이와 순서는 요청과 같아야 하며, 어기면
//! `BatchMismatch`로 실패합니다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use kquant_core::LlmConfig;

use crate::error::{PipelineError, Result};

/// 감성 분석 요청 한 건.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentRequest {
    /// 종목코드
    pub ticker: String,
    /// 종목명
    pub stock_name: String,
    /// 뉴스 헤드라인 (비어 있을 수 있음)
    pub headlines: Vec<String>,
}

/// 감성 분석 판정 한 건.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentVerdict {
    /// 종목코드 (요청과 일치해야 함)
    pub ticker: String,
    /// 뉴스 점수 (0~3)
    pub news_score: u32,
    /// 판정 근거 요약
    pub reasoning: String,
}

/// 감성 분석 인터페이스.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// 배치 단위 감성 분석.
    ///
    /// 반환 벡터는 요청과 같은 길이, 같은 순서여야 합니다.
    async fn analyze_batch(&self, requests: &[SentimentRequest]) -> Result<Vec<SentimentVerdict>>;
}

/// OpenAI 호환 Chat Completions 기반 감성 분석기.
pub struct LlmSentimentClient {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl LlmSentimentClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self { client, config }
    }

    fn build_prompt(requests: &[SentimentRequest]) -> String {
        let mut entries = String::new();
        for (i, request) in requests.iter().enumerate() {
            let headlines = if request.headlines.is_empty() {
                "(최근 뉴스 없음)".to_string()
            } else {
                request.headlines.join(" / ")
            };
            entries.push_str(&format!(
                "{}. [{}] {}: {}\n",
                i + 1,
                request.ticker,
                request.stock_name,
                headlines
            ));
        }

        format!(
            "당신은 한국 주식 뉴스를 평가하는 애널리스트입니다. \
             아래 각 종목의 최근 헤드라인이 단기 주가에 얼마나 긍정적인지 \
             0~3점으로 채점하세요.\n\
             - 3: 강한 호재 (실적 서프라이즈, 대형 수주 등)\n\
             - 2: 호재\n\
             - 1: 중립 또는 약한 호재\n\
             - 0: 악재 또는 뉴스 없음\n\n\
             종목 목록:\n{}\n\
             모든 종목에 대해, 입력과 같은 순서의 JSON 배열만 출력하세요. \
             각 원소는 {{\"ticker\": \"종목코드\", \"news_score\": 점수, \
             \"reasoning\": \"근거 한 줄\"}} 형식입니다.",
            entries
        )
    }

    /// 마크다운 코드 펜스를 제거합니다.
    fn strip_fences(content: &str) -> &str {
        content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    }
}

#[async_trait]
impl SentimentAnalyzer for LlmSentimentClient {
    async fn analyze_batch(&self, requests: &[SentimentRequest]) -> Result<Vec<SentimentVerdict>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = Self::build_prompt(requests);
        let body = json!({
            "model": self.config.model,
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant that outputs JSON."},
                {"role": "user", "content": prompt},
            ],
        });

        info!(
            model = %self.config.model,
            batch = requests.len(),
            "LLM 감성 분석 요청"
        );

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Sentiment(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Sentiment(format!(
                "LLM 응답 오류: {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Sentiment(format!("응답 파싱 실패: {}", e)))?;

        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| PipelineError::Sentiment("응답 본문 없음".to_string()))?;

        let clean = Self::strip_fences(content);
        let verdicts: Vec<SentimentVerdict> = serde_json::from_str(clean)
            .map_err(|e| PipelineError::Sentiment(format!("JSON 파싱 실패: {} ({})", e, clean)))?;

        if verdicts.len() != requests.len() {
            return Err(PipelineError::BatchMismatch {
                requested: requests.len(),
                returned: verdicts.len(),
            });
        }

        debug!(batch = verdicts.len(), "LLM 감성 분석 완료");
        Ok(verdicts)
    }
}
