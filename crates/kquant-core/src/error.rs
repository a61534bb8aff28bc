//! 시그널 엔진의 에러 타입.
//!
//! 이 모듈은 엔진 전반에서 사용되는 에러 분류 체계를 정의합니다.
//! 런 전체를 실패시키는 에러와 개별 후보 종목에만 국한되는 에러를 구분합니다.

use thiserror::Error;

/// 핵심 엔진 에러.
#[derive(Debug, Error)]
pub enum EngineError {
    /// 모든 데이터 소스가 소진됨
    #[error("데이터 조회 불가: {symbol} (시도한 소스: {attempted:?})")]
    DataUnavailable {
        symbol: String,
        attempted: Vec<String>,
    },

    /// 필요한 거래일 수보다 이력이 부족함
    #[error("이력 부족: {symbol} (필요 {required}일, 보유 {provided}일)")]
    InsufficientHistory {
        symbol: String,
        required: usize,
        provided: usize,
    },

    /// 불완전한 점수표로 등급을 계산하려 함
    #[error("점수 미완성: {0} 항목 누락")]
    IncompleteScore(String),

    /// 진입가가 손절가 이하 (리스크 거리가 0 또는 음수)
    #[error("잘못된 리스크 거리: 진입가 {entry} <= 손절가 {stop}")]
    InvalidRiskDistance { entry: String, stop: String },

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 요청 한도 초과
    #[error("요청 한도 초과: {0}")]
    RateLimit(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Network(_) | EngineError::RateLimit(_))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let network_err = EngineError::Network("timeout".to_string());
        assert!(network_err.is_retryable());

        let score_err = EngineError::IncompleteScore("news".to_string());
        assert!(!score_err.is_retryable());
    }

    #[test]
    fn test_data_error_has_symbol_context() {
        let err = EngineError::InsufficientHistory {
            symbol: "005930".to_string(),
            required: 70,
            provided: 40,
        };
        assert!(err.to_string().contains("005930"));
        assert!(!err.is_retryable());
    }
}
