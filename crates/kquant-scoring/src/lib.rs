//! 점수 집계와 포지션 사이징.
//!
//! 이 crate는 다음을 제공합니다:
//! - 가중 점수표 기반 후보 채점 (`Scorer`)
//! - 총점 → 등급 계단 함수 (`Scorer::determine_grade`)
//! - 리스크 기반 포지션 사이징 (`PositionSizer`)

pub mod scorer;
pub mod sizer;

pub use scorer::Scorer;
pub use sizer::PositionSizer;
