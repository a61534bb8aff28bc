//! 리스크 기반 포지션 사이징.
//!
//! 거래당 리스크 예산(자본 × risk_fraction)을 1주당 리스크(진입가 - 손절가)로
//! 나눠 수량을 정합니다. 목표가는 등급별 R-배수로 계산합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use kquant_core::{EngineError, EngineResult, Grade, PositionPlan, Price, SizingConfig};

/// 포지션 사이저.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// 포지션 계획을 계산합니다.
    ///
    /// - 수량 = floor(자본 × risk_fraction / (진입가 - 손절가))
    /// - 목표가 = 진입가 + 등급 R-배수 × (진입가 - 손절가)
    /// - 명목 금액이 자본을 넘으면 자본 한도로 수량을 줄이고
    ///   `capital_constrained`를 켭니다.
    ///
    /// # 오류
    /// 진입가가 손절가보다 높지 않으면 `InvalidRiskDistance`.
    pub fn size(
        &self,
        entry: Price,
        stop: Price,
        capital: Decimal,
        grade: Grade,
    ) -> EngineResult<PositionPlan> {
        let risk_per_share = entry - stop;
        if risk_per_share <= Decimal::ZERO {
            return Err(EngineError::InvalidRiskDistance {
                entry: entry.to_string(),
                stop: stop.to_string(),
            });
        }

        let risk_budget = capital * self.config.risk_fraction;
        let mut quantity = (risk_budget / risk_per_share)
            .floor()
            .to_i64()
            .unwrap_or(0);

        let mut capital_constrained = false;
        if entry > Decimal::ZERO && Decimal::from(quantity) * entry > capital {
            quantity = (capital / entry).floor().to_i64().unwrap_or(0);
            capital_constrained = true;
        }

        let r_multiple = grade.r_multiple();
        let target = entry + r_multiple * risk_per_share;

        debug!(
            %entry,
            %stop,
            %target,
            quantity,
            capital_constrained,
            "포지션 계획 계산 완료"
        );

        Ok(PositionPlan {
            entry,
            stop,
            target,
            quantity,
            r_multiple,
            capital_constrained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer() -> PositionSizer {
        PositionSizer::new(SizingConfig::default())
    }

    #[test]
    fn test_reference_vector() {
        // 진입 100, 손절 97, 자본 5000만 → 리스크 예산 25만, 수량 83,333
        let plan = sizer()
            .size(dec!(100), dec!(97), dec!(50_000_000), Grade::S)
            .unwrap();

        assert_eq!(plan.quantity, 83_333);
        assert_eq!(plan.target, dec!(109));
        assert_eq!(plan.r_multiple, dec!(3));
        assert!(!plan.capital_constrained);
    }

    #[test]
    fn test_target_by_grade() {
        let sizer = sizer();
        let target = |grade| {
            sizer
                .size(dec!(100), dec!(97), dec!(50_000_000), grade)
                .unwrap()
                .target
        };

        assert_eq!(target(Grade::S), dec!(109));
        assert_eq!(target(Grade::A), dec!(106));
        assert_eq!(target(Grade::B), dec!(104.5));
        assert_eq!(target(Grade::C), dec!(103));
    }

    #[test]
    fn test_invalid_risk_distance() {
        let err = sizer()
            .size(dec!(97), dec!(100), dec!(50_000_000), Grade::A)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRiskDistance { .. }));

        // 진입가 == 손절가도 거부
        assert!(sizer()
            .size(dec!(100), dec!(100), dec!(50_000_000), Grade::A)
            .is_err());
    }

    #[test]
    fn test_capital_constrained() {
        // 리스크 예산 기준 수량의 명목 금액이 자본을 초과하는 경우
        let plan = sizer()
            .size(dec!(100), dec!(99.9), dec!(1_000_000), Grade::B)
            .unwrap();

        // 리스크 예산 5000 / 0.1 = 50,000주 → 500만 원 > 자본 100만 원
        assert!(plan.capital_constrained);
        assert_eq!(plan.quantity, 10_000);
    }

    #[test]
    fn test_notional_never_exceeds_capital() {
        let plan = sizer()
            .size(dec!(70000), dec!(68000), dec!(10_000_000), Grade::A)
            .unwrap();

        assert!(plan.notional() <= dec!(10_000_000));
    }
}
