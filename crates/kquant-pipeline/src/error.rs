//! 파이프라인 오류 타입.

use thiserror::Error;

/// 파이프라인 실행 오류.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 데이터 계층 오류
    #[error("데이터 오류: {0}")]
    Data(#[from] kquant_data::DataError),

    /// 도메인/코어 오류
    #[error(transparent)]
    Engine(#[from] kquant_core::EngineError),

    /// 뉴스 수집 오류
    #[error("뉴스 수집 오류: {0}")]
    News(String),

    /// LLM 감성 분석 오류
    #[error("감성 분석 오류: {0}")]
    Sentiment(String),

    /// 배치 계약 위반 (요청 수 != 응답 수)
    #[error("배치 계약 위반: 요청 {requested}건, 응답 {returned}건")]
    BatchMismatch { requested: usize, returned: usize },

    /// Phase1에서 생존한 후보가 없음
    #[error("Phase1 생존 후보 없음 (스캔 {0}건)")]
    NoSurvivors(usize),

    /// 런 전체 타임아웃
    #[error("런 타임아웃: {0}초 초과")]
    RunTimeout(u64),
}

impl PipelineError {
    /// 일시적 오류로 재시도할 가치가 있는지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Data(e) => e.is_retryable(),
            PipelineError::Engine(e) => e.is_retryable(),
            PipelineError::News(_) | PipelineError::Sentiment(_) => true,
            PipelineError::BatchMismatch { .. }
            | PipelineError::NoSurvivors(_)
            | PipelineError::RunTimeout(_) => false,
        }
    }
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, PipelineError>;
