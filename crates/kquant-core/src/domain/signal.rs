//! 최종 매매 시그널.
//!
//! 이 모듈은 Phase4가 조립하는 최종 산출물을 정의합니다:
//! - `TradeSignal` - 후보 + 점수표 + 등급 + 포지션 계획의 집합체
//! - `SignalStatus` - 시그널 상태 (엔진은 PENDING만 생성)
//! - `DropRecord` - 탈락 후보와 사유

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Grade, PositionPlan, ScoreDetail, StockCandidate};

/// 시그널 상태.
///
/// 상태 전이는 외부 실행/포트폴리오 컴포넌트가 관리하며,
/// 엔진은 항상 `Pending`으로만 생성합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    /// 생성됨, 미체결
    Pending,
    /// 진입 완료
    Open,
    /// 청산 완료
    Closed,
}

/// 파이프라인이 생성한 최종 매매 시그널.
///
/// 후보당 런당 한 번, Phase4에서 생성됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// 고유 시그널 ID
    pub id: Uuid,
    /// 후보 종목
    pub candidate: StockCandidate,
    /// 등급
    pub grade: Grade,
    /// 총점
    pub total_score: u32,
    /// 점수표
    pub score_detail: ScoreDetail,
    /// 포지션 계획
    pub position_plan: PositionPlan,
    /// 상태 (엔진은 항상 PENDING)
    pub status: SignalStatus,
    /// LLM 감성 분석 실패로 뉴스 점수가 0으로 대체되었는지 여부
    pub llm_unavailable: bool,
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
}

impl TradeSignal {
    /// 새 시그널을 생성합니다.
    pub fn new(
        candidate: StockCandidate,
        grade: Grade,
        score_detail: ScoreDetail,
        position_plan: PositionPlan,
        llm_unavailable: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            total_score: score_detail.total,
            candidate,
            grade,
            score_detail,
            position_plan,
            status: SignalStatus::Pending,
            llm_unavailable,
            generated_at: Utc::now(),
        }
    }
}

/// 탈락 후보 기록.
///
/// 런이 전체적으로 성공하더라도 응답에는 항상 탈락 후보와
/// 사유 요약이 포함됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRecord {
    /// 종목코드
    pub ticker: String,
    /// 탈락 사유
    pub reason: String,
}

impl DropRecord {
    /// 새 탈락 기록을 생성합니다.
    pub fn new(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }
}
