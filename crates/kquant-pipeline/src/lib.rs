//! 시그널 생성 파이프라인.
//!
//! 후보 스캔부터 최종 시그널 확정까지 4단계로 실행됩니다:
//!
//! 1. **Phase1 기본 분석**: 시장 게이트 → 후보별 시계열/수급 조회,
//!    VCP 탐지, 뉴스 외 항목 채점
//! 2. **Phase2 뉴스 수집**: 생존 후보의 최근 뉴스 수집
//! 3. **Phase3 감성 분석**: LLM 배치 호출로 뉴스 점수(0~3) 결정
//! 4. **Phase4 확정**: 점수 확정 → 등급 → 포지션 계획 → 상위 N개 시그널
//!
//! 각 단계는 배리어로 구분되어 이전 단계가 모두 끝나야 다음 단계가
//! 시작됩니다.

pub mod error;
pub mod news;
pub mod pipeline;
pub mod report;
pub mod sentiment;

pub use error::{PipelineError, Result};
pub use news::{NaverNewsCollector, NewsCollector, NewsItem};
pub use pipeline::{SignalPipeline, SignalPipelineBuilder};
pub use report::PipelineReport;
pub use sentiment::{LlmSentimentClient, SentimentAnalyzer, SentimentRequest, SentimentVerdict};
