//! # KQuant Core
//!
//! 시그널 생성 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 캔들(OHLCV) 및 가격 시계열 구조체
//! - 스캔 후보 종목 및 수급 데이터
//! - 시장 레짐 상태 (Market Gate)
//! - 점수표, 등급, 포지션 계획, 최종 시그널
//! - 에러 분류 체계
//! - 임계값 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
