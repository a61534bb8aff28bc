//! 도메인 모델.
//!
//! 파이프라인의 각 단계가 주고받는 불변 객체들을 정의합니다.
//! 한 단계가 출력한 객체는 다음 단계에서 절대 제자리 수정되지 않습니다.

pub mod candidate;
pub mod market_data;
pub mod market_status;
pub mod position;
pub mod score;
pub mod signal;
pub mod supply;

pub use candidate::StockCandidate;
pub use market_data::{Kline, PriceSeries};
pub use market_status::{MarketStatus, RegimeLabel, RegimeSubScores};
pub use position::PositionPlan;
pub use score::{Grade, PartialScore, ScoreDetail};
pub use signal::{DropRecord, SignalStatus, TradeSignal};
pub use supply::SupplyData;
