//! 시장 레짐 상태 (Market Gate).

use serde::{Deserialize, Serialize};

/// 레짐 라벨.
///
/// 레짐 점수(0~100)에 대한 계단 함수로 결정됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeLabel {
    /// 강한 상승장 (점수 >= 80)
    StrongBull,
    /// 상승장 (>= 60)
    Bull,
    /// 중립 (>= 40)
    Neutral,
    /// 주의 (>= 20)
    Caution,
    /// 약세장 (< 20)
    Bear,
}

impl std::fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegimeLabel::StrongBull => write!(f, "STRONG_BULL"),
            RegimeLabel::Bull => write!(f, "BULL"),
            RegimeLabel::Neutral => write!(f, "NEUTRAL"),
            RegimeLabel::Caution => write!(f, "CAUTION"),
            RegimeLabel::Bear => write!(f, "BEAR"),
        }
    }
}

/// 지표별 하위 점수.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeSubScores {
    /// 이동평균 정렬 점수
    pub trend: u32,
    /// RSI/MACD 모멘텀 점수 (지배적 가중치)
    pub momentum: u32,
    /// 거래량/상대강도 점수
    pub strength: u32,
}

/// 시장 레짐 평가 결과.
///
/// 평가 호출당 하나씩 생성되며, 계산 후에는 불변입니다.
/// 파이프라인은 이 값을 읽기 전용 게이트로 소비합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
    /// 레짐 점수 (0~100)
    pub score: u32,
    /// 레짐 라벨
    pub label: RegimeLabel,
    /// 지표별 하위 점수
    pub sub_scores: RegimeSubScores,
    /// 이력 부족으로 인한 중립 판정 여부.
    ///
    /// 이 플래그가 켜진 상태는 데이터에서 계산된 중립과 구분되는
    /// 별도 조건으로 보고되어야 하며, 조용히 기본값으로 취급하면 안 됩니다.
    pub insufficient_history: bool,
}

impl MarketStatus {
    /// 점수에 해당하는 레짐 라벨을 반환합니다.
    pub fn label_for(
        score: u32,
        strong_bull: u32,
        bull: u32,
        neutral: u32,
        caution: u32,
    ) -> RegimeLabel {
        if score >= strong_bull {
            RegimeLabel::StrongBull
        } else if score >= bull {
            RegimeLabel::Bull
        } else if score >= neutral {
            RegimeLabel::Neutral
        } else if score >= caution {
            RegimeLabel::Caution
        } else {
            RegimeLabel::Bear
        }
    }

    /// 거래 가능 여부를 반환합니다.
    pub fn tradeable(&self, floor: u32) -> bool {
        self.score >= floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_step_function() {
        let label = |s| MarketStatus::label_for(s, 80, 60, 40, 20);
        assert_eq!(label(85), RegimeLabel::StrongBull);
        assert_eq!(label(80), RegimeLabel::StrongBull);
        assert_eq!(label(79), RegimeLabel::Bull);
        assert_eq!(label(40), RegimeLabel::Neutral);
        assert_eq!(label(39), RegimeLabel::Caution);
        assert_eq!(label(19), RegimeLabel::Bear);
    }

    #[test]
    fn test_tradeable_floor() {
        let status = MarketStatus {
            score: 40,
            label: RegimeLabel::Neutral,
            sub_scores: RegimeSubScores::default(),
            insufficient_history: false,
        };
        assert!(status.tradeable(40));
        assert!(!status.tradeable(41));
    }
}
