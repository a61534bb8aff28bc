//! 파이프라인 통합 테스트.
//!
//! 데이터/뉴스/LLM을 스텁으로 대체하고 단계 격리, 게이트 차단,
//! LLM 저하 처리, 정렬 규칙을 검증합니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use kquant_core::{
    EngineConfig, Grade, Kline, Market, PriceSeries, StockCandidate, SupplyData,
};
use kquant_data::{DataError, StockDataFetcher};
use kquant_pipeline::{
    NewsCollector, NewsItem, PipelineError, SentimentAnalyzer, SentimentRequest,
    SentimentVerdict, SignalPipeline,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

/// 상승 추세 지수 시계열 (게이트 통과용).
fn bullish_index(symbol: &str, n: usize) -> PriceSeries {
    (0..n)
        .map(|i| {
            let close = Decimal::from(2000 + 5 * i as i64);
            let date =
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64);
            Kline::new(
                symbol,
                date,
                close - Decimal::ONE,
                close + Decimal::from(2),
                close - Decimal::from(2),
                close,
                1_000_000,
            )
        })
        .collect()
}

/// 하락 추세 지수 시계열 (게이트 차단용).
fn bearish_index(symbol: &str, n: usize) -> PriceSeries {
    (0..n)
        .map(|i| {
            let close = Decimal::from(3000 - 5 * i as i64);
            let date =
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64);
            Kline::new(
                symbol,
                date,
                close + Decimal::ONE,
                close + Decimal::from(2),
                close - Decimal::from(2),
                close,
                500_000,
            )
        })
        .collect()
}

/// VCP 조건(수축 + 고점 근접)을 충족하는 종목 시계열.
fn vcp_series(ticker: &str, n: usize) -> PriceSeries {
    (0..n)
        .map(|i| {
            let close = dec!(10000);
            let spread = Decimal::from(400 - (360 * i / (n - 1)) as i64);
            let date =
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64);
            Kline::new(
                ticker,
                date,
                close,
                close + spread,
                close - spread,
                close + spread / dec!(2),
                1_000_000,
            )
        })
        .collect()
}

fn strong_supply() -> SupplyData {
    SupplyData {
        foreign_net_5d: dec!(500_000_000),
        foreign_net_20d: dec!(900_000_000),
        foreign_net_60d: dec!(1_200_000_000),
        institution_net_5d: dec!(300_000_000),
        institution_net_20d: dec!(500_000_000),
        institution_net_60d: dec!(800_000_000),
        buy_streak_days: 5,
    }
}

fn candidate(ticker: &str, name: &str, change_pct: Decimal) -> StockCandidate {
    StockCandidate::new(
        ticker,
        name,
        Market::Kospi,
        dec!(10000),
        change_pct,
        dec!(1_200_000_000_000),
    )
}

/// 스텁 데이터 수집기.
struct StubFetcher {
    bullish: bool,
    candidates: Vec<StockCandidate>,
    /// 시계열 조회가 실패해야 하는 종목
    failing: Vec<String>,
}

impl StubFetcher {
    fn new(bullish: bool, candidates: Vec<StockCandidate>) -> Self {
        Self {
            bullish,
            candidates,
            failing: Vec::new(),
        }
    }

    fn with_failing(mut self, ticker: &str) -> Self {
        self.failing.push(ticker.to_string());
        self
    }
}

#[async_trait]
impl StockDataFetcher for StubFetcher {
    async fn fetch_index(
        &self,
        symbol: &str,
        _as_of: NaiveDate,
        _days: i64,
    ) -> kquant_data::Result<PriceSeries> {
        Ok(if self.bullish {
            bullish_index(symbol, 100)
        } else {
            bearish_index(symbol, 100)
        })
    }

    async fn fetch_prices(
        &self,
        ticker: &str,
        _as_of: NaiveDate,
        _days: i64,
    ) -> kquant_data::Result<PriceSeries> {
        if self.failing.iter().any(|t| t == ticker) {
            return Err(DataError::Unavailable {
                symbol: ticker.to_string(),
                attempted: vec!["stub".to_string()],
            });
        }
        Ok(vcp_series(ticker, 80))
    }

    async fn fetch_supply(&self, _ticker: &str) -> kquant_data::Result<SupplyData> {
        Ok(strong_supply())
    }

    async fn top_gainers(
        &self,
        market: Market,
        _limit: usize,
    ) -> kquant_data::Result<Vec<StockCandidate>> {
        Ok(if market == Market::Kospi {
            self.candidates.clone()
        } else {
            Vec::new()
        })
    }
}

/// 항상 뉴스 한 건을 돌려주는 스텁 수집기.
struct StubNews;

#[async_trait]
impl NewsCollector for StubNews {
    async fn recent_news(
        &self,
        query: &str,
        _window_days: u32,
    ) -> kquant_pipeline::Result<Vec<NewsItem>> {
        Ok(vec![NewsItem {
            title: format!("{} 신규 수주 공시", query),
            description: String::new(),
            link: "https://example.com".to_string(),
            published_at: chrono::Utc::now(),
        }])
    }
}

/// 종목코드별 뉴스 점수를 돌려주는 스텁 분석기.
struct StubSentiment {
    scores: HashMap<String, u32>,
    fail: bool,
    mismatch: bool,
}

impl StubSentiment {
    fn with_scores(scores: &[(&str, u32)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(t, s)| (t.to_string(), *s))
                .collect(),
            fail: false,
            mismatch: false,
        }
    }

    fn failing() -> Self {
        Self {
            scores: HashMap::new(),
            fail: true,
            mismatch: false,
        }
    }

    fn mismatching() -> Self {
        Self {
            scores: HashMap::new(),
            fail: false,
            mismatch: true,
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for StubSentiment {
    async fn analyze_batch(
        &self,
        requests: &[SentimentRequest],
    ) -> kquant_pipeline::Result<Vec<SentimentVerdict>> {
        if self.fail {
            return Err(PipelineError::Sentiment("LLM 다운".to_string()));
        }
        if self.mismatch {
            // 계약 위반: 요청보다 하나 적게 응답
            return Ok(requests
                .iter()
                .skip(1)
                .map(|r| SentimentVerdict {
                    ticker: r.ticker.clone(),
                    news_score: 1,
                    reasoning: String::new(),
                })
                .collect());
        }
        Ok(requests
            .iter()
            .map(|r| SentimentVerdict {
                ticker: r.ticker.clone(),
                news_score: self.scores.get(&r.ticker).copied().unwrap_or(1),
                reasoning: "스텁".to_string(),
            })
            .collect())
    }
}

/// 재시도 대기를 없앤 테스트용 설정.
fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.pipeline.max_retries = 0;
    config.pipeline.retry_backoff_ms = 1;
    config
}

fn build_pipeline(
    fetcher: StubFetcher,
    sentiment: StubSentiment,
    config: EngineConfig,
) -> SignalPipeline {
    SignalPipeline::builder(config)
        .fetcher(Arc::new(fetcher))
        .news(Arc::new(StubNews))
        .sentiment(Arc::new(sentiment))
        .capital(dec!(50_000_000))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_gate_short_circuits_to_empty_signals() {
    let fetcher = StubFetcher::new(false, vec![candidate("005930", "삼성전자", dec!(5))]);
    let pipeline = build_pipeline(fetcher, StubSentiment::with_scores(&[]), test_config());

    let report = pipeline.run(as_of()).await.unwrap();

    assert!(report.gated);
    assert!(report.signals.is_empty());
    assert_eq!(report.scanned, 0);
    let status = report.market_status.unwrap();
    assert!(!status.tradeable(40));
}

#[tokio::test]
async fn test_full_run_produces_signals() {
    let fetcher = StubFetcher::new(
        true,
        vec![
            candidate("005930", "삼성전자", dec!(5)),
            candidate("000660", "SK하이닉스", dec!(12)),
        ],
    );
    let sentiment = StubSentiment::with_scores(&[("005930", 3), ("000660", 2)]);
    let pipeline = build_pipeline(fetcher, sentiment, test_config());

    let report = pipeline.run(as_of()).await.unwrap();

    assert!(!report.gated);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.analyzed, 2);
    assert_eq!(report.signals.len(), 2);
    assert_eq!(report.llm_degraded, 0);

    for signal in &report.signals {
        assert!(!signal.llm_unavailable);
        assert_eq!(
            signal.total_score,
            signal.score_detail.base_sum() + signal.score_detail.bonus_sum()
        );
        assert!(signal.position_plan.quantity > 0);
        assert!(signal.position_plan.entry > signal.position_plan.stop);
    }
}

#[tokio::test]
async fn test_one_failing_candidate_does_not_poison_run() {
    let fetcher = StubFetcher::new(
        true,
        vec![
            candidate("005930", "삼성전자", dec!(5)),
            candidate("999999", "고장난종목", dec!(8)),
        ],
    )
    .with_failing("999999");
    let sentiment = StubSentiment::with_scores(&[("005930", 2)]);
    let pipeline = build_pipeline(fetcher, sentiment, test_config());

    let report = pipeline.run(as_of()).await.unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.analyzed, 1);
    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.signals[0].candidate.ticker, "005930");

    // 탈락 기록이 항상 보고에 포함됨
    assert!(report
        .drops
        .iter()
        .any(|d| d.ticker == "999999" && d.reason.contains("시계열")));
}

#[tokio::test]
async fn test_llm_failure_degrades_conservatively() {
    let fetcher = StubFetcher::new(true, vec![candidate("005930", "삼성전자", dec!(5))]);
    let pipeline = build_pipeline(fetcher, StubSentiment::failing(), test_config());

    let report = pipeline.run(as_of()).await.unwrap();

    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.llm_degraded, 1);

    let signal = &report.signals[0];
    assert!(signal.llm_unavailable);
    assert_eq!(signal.score_detail.news, 0);
}

#[tokio::test]
async fn test_batch_mismatch_is_contract_violation() {
    let fetcher = StubFetcher::new(
        true,
        vec![
            candidate("005930", "삼성전자", dec!(5)),
            candidate("000660", "SK하이닉스", dec!(7)),
        ],
    );
    let pipeline = build_pipeline(fetcher, StubSentiment::mismatching(), test_config());

    let report = pipeline.run(as_of()).await.unwrap();

    // 길이가 어긋난 응답은 배치 전체를 보수 처리
    assert_eq!(report.llm_degraded, 2);
    assert!(report.signals.iter().all(|s| s.llm_unavailable));
}

#[tokio::test]
async fn test_signals_sorted_by_grade_then_total() {
    let fetcher = StubFetcher::new(
        true,
        vec![
            candidate("000001", "저점수", dec!(1)),
            candidate("000002", "고점수", dec!(26)),
            candidate("000003", "중간점수", dec!(12)),
        ],
    );
    let sentiment =
        StubSentiment::with_scores(&[("000001", 0), ("000002", 3), ("000003", 2)]);
    let pipeline = build_pipeline(fetcher, sentiment, test_config());

    let report = pipeline.run(as_of()).await.unwrap();

    assert_eq!(report.signals.len(), 3);
    for pair in report.signals.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.grade.rank() > b.grade.rank()
                || (a.grade.rank() == b.grade.rank() && a.total_score >= b.total_score)
        );
    }
    // 일일 상승률 26% 후보가 보너스로 최상위
    assert_eq!(report.signals[0].candidate.ticker, "000002");
}

#[tokio::test]
async fn test_max_positions_truncation() {
    let candidates: Vec<StockCandidate> = (0..8)
        .map(|i| candidate(&format!("10000{}", i), &format!("종목{}", i), dec!(5)))
        .collect();
    let fetcher = StubFetcher::new(true, candidates);
    let sentiment = StubSentiment::with_scores(&[]);

    let mut config = test_config();
    config.pipeline.max_positions = 3;
    let pipeline = build_pipeline(fetcher, sentiment, config);

    let report = pipeline.run(as_of()).await.unwrap();

    assert_eq!(report.scanned, 8);
    assert_eq!(report.signals.len(), 3);
}

#[tokio::test]
async fn test_all_candidates_failing_is_error() {
    let fetcher = StubFetcher::new(true, vec![candidate("999999", "고장난종목", dec!(5))])
        .with_failing("999999");
    let pipeline = build_pipeline(fetcher, StubSentiment::with_scores(&[]), test_config());

    let err = pipeline.run(as_of()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoSurvivors(1)));
}
