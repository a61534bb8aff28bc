//! 파이프라인 런 보고서.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use kquant_core::{DropRecord, MarketStatus, TradeSignal};

/// 한 번의 런 결과 요약.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    /// 시장 레짐 평가 결과
    pub market_status: Option<MarketStatus>,
    /// 시장 게이트로 조기 종료되었는지 여부
    pub gated: bool,
    /// 스캔된 후보 수
    pub scanned: usize,
    /// Phase1을 통과한 후보 수
    pub analyzed: usize,
    /// 최종 시그널
    pub signals: Vec<TradeSignal>,
    /// 탈락 기록 (종목과 사유)
    pub drops: Vec<DropRecord>,
    /// LLM 불가로 보수적 처리된 시그널 수
    pub llm_degraded: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 후보 생존율 (%)
    pub fn survival_rate(&self) -> f64 {
        if self.scanned == 0 {
            0.0
        } else {
            (self.signals.len() as f64 / self.scanned as f64) * 100.0
        }
    }

    /// 런 요약 로그 출력.
    pub fn log_summary(&self) {
        tracing::info!(
            gated = self.gated,
            scanned = self.scanned,
            analyzed = self.analyzed,
            signals = self.signals.len(),
            drops = self.drops.len(),
            llm_degraded = self.llm_degraded,
            survival_rate = format!("{:.1}%", self.survival_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "시그널 생성 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survival_rate() {
        let mut report = PipelineReport::new();
        assert_eq!(report.survival_rate(), 0.0);

        report.scanned = 20;
        // 시그널 없이도 0%가 나와야 함
        assert_eq!(report.survival_rate(), 0.0);
    }
}
