//! 기술적 분석 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - Decimal 기반 기술적 지표 (SMA/EMA/MACD/RSI/ATR)
//! - 시장 국면 평가 (`MarketRegimeEvaluator`)
//! - VCP(변동성 수축 패턴) 스크리너 (`VcpScreener`)
//!
//! 모든 계산은 순수 함수이며 같은 입력에 같은 출력을 보장합니다.

pub mod indicators;
pub mod regime;
pub mod screener;

pub use indicators::{IndicatorError, IndicatorResult};
pub use regime::MarketRegimeEvaluator;
pub use screener::{VcpDetection, VcpScreener};
