//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 외부 소스 조회 오류
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 유효성 검사 실패 (빈 응답, 비정상 가격대 등)
    #[error("Invalid data from {provider}: {reason}")]
    InvalidData { provider: String, reason: String },

    /// 모든 Provider 소진
    #[error("Data unavailable for {symbol} (attempted: {attempted:?})")]
    Unavailable {
        symbol: String,
        attempted: Vec<String>,
    },

    /// 이력 부족
    #[error("Insufficient history for {symbol}: required {required}, provided {provided}")]
    InsufficientHistory {
        symbol: String,
        required: usize,
        provided: usize,
    },

    /// 요청 한도 초과
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DataError {
    /// 재시도 가능한 오류인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::FetchError(_) | DataError::RateLimited(_))
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::FetchError(err.to_string())
    }
}

impl From<DataError> for kquant_core::EngineError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Unavailable { symbol, attempted } => {
                kquant_core::EngineError::DataUnavailable { symbol, attempted }
            }
            DataError::InsufficientHistory {
                symbol,
                required,
                provided,
            } => kquant_core::EngineError::InsufficientHistory {
                symbol,
                required,
                provided,
            },
            DataError::RateLimited(msg) => kquant_core::EngineError::RateLimit(msg),
            DataError::ParseError(msg) => kquant_core::EngineError::Parse(msg),
            DataError::ConfigError(msg) => kquant_core::EngineError::Config(msg),
            other => kquant_core::EngineError::Network(other.to_string()),
        }
    }
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, DataError>;
