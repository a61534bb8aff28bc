//! 4단계 시그널 생성 파이프라인.
//!
//! 단계 사이에는 엄격한 배리어가 있습니다. 각 단계는 이전 단계의 완전한
//! 출력을 소비해 새 객체를 만들며, 단계를 넘나드는 변경은 없습니다.
//! 후보 하나의 실패는 탈락 기록으로 남기고 런은 계속됩니다.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use kquant_analytics::{MarketRegimeEvaluator, VcpScreener};
use kquant_core::{
    DropRecord, EngineConfig, EngineError, Market, PartialScore, StockCandidate, SupplyData,
    TradeSignal,
};
use kquant_data::{DataError, StockDataFetcher};
use kquant_scoring::{PositionSizer, Scorer};

use crate::error::{PipelineError, Result};
use crate::news::{NewsCollector, NewsItem};
use crate::report::PipelineReport;
use crate::sentiment::{SentimentAnalyzer, SentimentRequest};

/// 스캔 시 시장별 상위 종목 수.
const SCAN_LIMIT_PER_MARKET: usize = 30;

/// 지수 조회 시 휴장일 여유분 (거래일).
const HISTORY_BUFFER_DAYS: i64 = 30;

/// Phase1 분석을 통과한 후보.
struct AnalyzedCandidate {
    candidate: StockCandidate,
    partial: PartialScore,
    entry: Decimal,
    stop: Decimal,
}

/// Phase2까지 끝난 후보 (뉴스 포함).
struct NewsReadyCandidate {
    analyzed: AnalyzedCandidate,
    headlines: Vec<String>,
}

/// Phase3까지 끝난 후보 (뉴스 점수 확정).
struct ScoredCandidate {
    analyzed: AnalyzedCandidate,
    news_score: u32,
    llm_unavailable: bool,
}

/// 시그널 생성 파이프라인.
pub struct SignalPipeline {
    config: EngineConfig,
    fetcher: Arc<dyn StockDataFetcher>,
    news: Arc<dyn NewsCollector>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    regime: MarketRegimeEvaluator,
    screener: VcpScreener,
    scorer: Scorer,
    sizer: PositionSizer,
    capital: Decimal,
}

/// 파이프라인 빌더.
pub struct SignalPipelineBuilder {
    config: EngineConfig,
    fetcher: Option<Arc<dyn StockDataFetcher>>,
    news: Option<Arc<dyn NewsCollector>>,
    sentiment: Option<Arc<dyn SentimentAnalyzer>>,
    capital: Decimal,
}

impl SignalPipelineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            fetcher: None,
            news: None,
            sentiment: None,
            capital: Decimal::from(10_000_000),
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn StockDataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn news(mut self, news: Arc<dyn NewsCollector>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn sentiment(mut self, sentiment: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// 운용 자본 (원). 파이프라인은 이 값을 읽기만 합니다.
    pub fn capital(mut self, capital: Decimal) -> Self {
        self.capital = capital;
        self
    }

    pub fn build(self) -> Result<SignalPipeline> {
        let missing = |what: &str| {
            PipelineError::Engine(EngineError::Config(format!("{} 미설정", what)))
        };

        let regime = MarketRegimeEvaluator::new(self.config.regime.clone());
        let screener = VcpScreener::new(self.config.screener.clone());
        let scorer = Scorer::new(self.config.scoring.clone());
        let sizer = PositionSizer::new(self.config.sizing.clone());

        Ok(SignalPipeline {
            fetcher: self.fetcher.ok_or_else(|| missing("fetcher"))?,
            news: self.news.ok_or_else(|| missing("news collector"))?,
            sentiment: self.sentiment.ok_or_else(|| missing("sentiment analyzer"))?,
            config: self.config,
            regime,
            screener,
            scorer,
            sizer,
            capital: self.capital,
        })
    }
}

impl SignalPipeline {
    pub fn builder(config: EngineConfig) -> SignalPipelineBuilder {
        SignalPipelineBuilder::new(config)
    }

    /// 파이프라인 한 번을 실행합니다.
    ///
    /// 런 전체에 `run_timeout_secs` 타임아웃이 적용되며, 초과 시 진행 중인
    /// 단계가 중단되고 부분 결과는 출력되지 않습니다.
    pub async fn run(&self, as_of: NaiveDate) -> Result<PipelineReport> {
        let timeout = std::time::Duration::from_secs(self.config.pipeline.run_timeout_secs);
        match tokio::time::timeout(timeout, self.run_inner(as_of)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::RunTimeout(
                self.config.pipeline.run_timeout_secs,
            )),
        }
    }

    async fn run_inner(&self, as_of: NaiveDate) -> Result<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport::new();

        // 시장 게이트: 지수 데이터가 없으면 중립 대체 없이 즉시 실패
        let history_days = self.config.regime.min_history as i64 + HISTORY_BUFFER_DAYS;
        let kospi = self
            .fetcher
            .fetch_index(Market::Kospi.index_symbol(), as_of, history_days)
            .await
            .map_err(EngineError::from)?;
        let kosdaq = self
            .fetcher
            .fetch_index(Market::Kosdaq.index_symbol(), as_of, history_days)
            .await
            .map_err(EngineError::from)?;

        let status = self
            .regime
            .evaluate(&kospi, &kosdaq)
            .map_err(|e| PipelineError::Engine(EngineError::Internal(e.to_string())))?;
        info!(
            score = status.score,
            label = %status.label,
            insufficient_history = status.insufficient_history,
            "시장 레짐 평가"
        );

        let tradeable = status.tradeable(self.config.regime.tradeable_floor);
        report.market_status = Some(status);

        if !tradeable {
            report.gated = true;
            report.elapsed = started.elapsed();
            report.log_summary();
            return Ok(report);
        }

        // 후보 스캔
        let candidates = self.scan_candidates().await?;
        report.scanned = candidates.len();

        // Phase1: 기본 분석 (배리어: 전원 완료 후 다음 단계)
        let (analyzed, mut drops) = self.phase1_analyze(as_of, candidates).await;
        report.analyzed = analyzed.len();
        if analyzed.is_empty() {
            report.drops = drops;
            report.log_summary();
            return Err(PipelineError::NoSurvivors(report.scanned));
        }

        // Phase2: 뉴스 수집
        let with_news = self.phase2_news(analyzed).await;

        // Phase3: LLM 감성 분석
        let scored = self.phase3_sentiment(with_news).await;
        report.llm_degraded = scored.iter().filter(|s| s.llm_unavailable).count();

        // Phase4: 확정
        let signals = self.phase4_finalize(scored, &mut drops);

        report.signals = signals;
        report.drops = drops;
        report.elapsed = started.elapsed();
        report.log_summary();
        Ok(report)
    }

    /// KOSPI/KOSDAQ 상승률 상위 종목을 스캔하고 중복을 제거합니다.
    async fn scan_candidates(&self) -> Result<Vec<StockCandidate>> {
        let mut candidates = Vec::new();
        for market in [Market::Kospi, Market::Kosdaq] {
            match self
                .fetcher
                .top_gainers(market, SCAN_LIMIT_PER_MARKET)
                .await
            {
                Ok(mut list) => candidates.append(&mut list),
                Err(e) => warn!(%market, error = %e, "후보 스캔 실패"),
            }
        }

        candidates.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        candidates.dedup_by(|a, b| a.ticker == b.ticker);

        if candidates.is_empty() {
            return Err(PipelineError::Data(DataError::Unavailable {
                symbol: "top_gainers".to_string(),
                attempted: vec!["naver".to_string()],
            }));
        }
        Ok(candidates)
    }

    /// Phase1: 시계열/수급 조회 → VCP 탐지 → 뉴스 외 항목 채점.
    ///
    /// 후보 하나의 실패는 탈락 기록으로 남고 나머지는 계속 진행합니다.
    async fn phase1_analyze(
        &self,
        as_of: NaiveDate,
        candidates: Vec<StockCandidate>,
    ) -> (Vec<AnalyzedCandidate>, Vec<DropRecord>) {
        let min_history = self.config.pipeline.min_history;
        let history_days = min_history as i64 + HISTORY_BUFFER_DAYS;

        let results: Vec<std::result::Result<AnalyzedCandidate, DropRecord>> =
            stream::iter(candidates)
                .map(|candidate| async move {
                    self.analyze_one(as_of, history_days, min_history, candidate)
                        .await
                })
                .buffer_unordered(self.config.pipeline.fetch_concurrency)
                .collect()
                .await;

        let mut analyzed = Vec::new();
        let mut drops = Vec::new();
        for result in results {
            match result {
                Ok(a) => analyzed.push(a),
                Err(d) => drops.push(d),
            }
        }
        info!(
            survivors = analyzed.len(),
            dropped = drops.len(),
            "Phase1 기본 분석 완료"
        );
        (analyzed, drops)
    }

    async fn analyze_one(
        &self,
        as_of: NaiveDate,
        history_days: i64,
        min_history: usize,
        candidate: StockCandidate,
    ) -> std::result::Result<AnalyzedCandidate, DropRecord> {
        let ticker = candidate.ticker.clone();

        let series = self
            .with_retry(|| self.fetcher.fetch_prices(&ticker, as_of, history_days))
            .await
            .map_err(|e| DropRecord::new(&ticker, format!("시계열 조회 실패: {}", e)))?;

        if series.len() < min_history {
            let e = EngineError::InsufficientHistory {
                symbol: ticker.clone(),
                required: min_history,
                provided: series.len(),
            };
            return Err(DropRecord::new(&ticker, e.to_string()));
        }

        let supply = self
            .with_retry(|| self.fetcher.fetch_supply(&ticker))
            .await
            .unwrap_or_else(|e| {
                warn!(ticker = %ticker, error = %e, "수급 조회 실패, 0으로 대체");
                SupplyData::default()
            });

        let detection = self
            .screener
            .detect(&ticker, &series, &supply)
            .map_err(|e| DropRecord::new(&ticker, format!("VCP 탐지 실패: {}", e)))?;

        if !detection.is_contracted {
            return Err(DropRecord::new(
                &ticker,
                format!(
                    "VCP 미충족 (수축 비율 {:.2})",
                    detection.contraction_ratio
                ),
            ));
        }

        let partial = self.scorer.base_scores(&candidate, &series, &detection);

        // 진입가 = 마지막 종가, 손절가 = 최근 10일 저가 (종가 이상이면 -3%)
        let entry = series
            .last()
            .map(|k| k.close)
            .ok_or_else(|| DropRecord::new(&ticker, "빈 시계열".to_string()))?;
        let recent_low = series
            .iter()
            .rev()
            .take(10)
            .map(|k| k.low)
            .min()
            .unwrap_or(entry);
        let stop = if recent_low < entry {
            recent_low
        } else {
            entry * Decimal::new(97, 2)
        };

        Ok(AnalyzedCandidate {
            candidate,
            partial,
            entry,
            stop,
        })
    }

    /// Phase2: 생존 후보의 뉴스 수집. 수집 실패는 빈 목록으로 대체합니다.
    async fn phase2_news(&self, analyzed: Vec<AnalyzedCandidate>) -> Vec<NewsReadyCandidate> {
        let window_days = self.config.pipeline.news_window_days;

        let with_news: Vec<NewsReadyCandidate> = stream::iter(analyzed)
            .map(|analyzed| async move {
                let query = analyzed.candidate.name.clone();
                let headlines = match self
                    .with_retry(|| self.news.recent_news(&query, window_days))
                    .await
                {
                    Ok(items) => items.iter().map(|n: &NewsItem| n.title.clone()).collect(),
                    Err(e) => {
                        warn!(ticker = %analyzed.candidate.ticker, error = %e, "뉴스 수집 실패, 빈 목록으로 진행");
                        Vec::new()
                    }
                };
                NewsReadyCandidate {
                    analyzed,
                    headlines,
                }
            })
            .buffer_unordered(self.config.pipeline.fetch_concurrency)
            .collect()
            .await;

        info!(count = with_news.len(), "Phase2 뉴스 수집 완료");
        with_news
    }

    /// Phase3: 고정 크기 배치로 LLM 감성 분석.
    ///
    /// 배치가 끝내 실패하면 해당 후보들의 뉴스 점수를 0으로 두고
    /// `llm_unavailable`을 켭니다. 런은 계속됩니다.
    async fn phase3_sentiment(&self, with_news: Vec<NewsReadyCandidate>) -> Vec<ScoredCandidate> {
        let batch_size = self.config.pipeline.llm_batch_size.max(1);
        let semaphore = Arc::new(Semaphore::new(self.config.pipeline.llm_concurrency.max(1)));

        let batches: Vec<Vec<NewsReadyCandidate>> = {
            let mut batches = Vec::new();
            let mut iter = with_news.into_iter().peekable();
            while iter.peek().is_some() {
                batches.push(iter.by_ref().take(batch_size).collect());
            }
            batches
        };

        let scored: Vec<Vec<ScoredCandidate>> = stream::iter(batches)
            .map(|batch| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    // 세마포어가 닫히는 경우는 없으므로 실패 시 전체 배치를 보수 처리
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return Self::degrade_batch(batch),
                    };

                    let requests: Vec<SentimentRequest> = batch
                        .iter()
                        .map(|item| SentimentRequest {
                            ticker: item.analyzed.candidate.ticker.clone(),
                            stock_name: item.analyzed.candidate.name.clone(),
                            headlines: item.headlines.clone(),
                        })
                        .collect();

                    match self
                        .with_retry(|| self.sentiment.analyze_batch(&requests))
                        .await
                    {
                        Ok(verdicts) if verdicts.len() == batch.len() => batch
                            .into_iter()
                            .zip(verdicts)
                            .map(|(item, verdict)| ScoredCandidate {
                                analyzed: item.analyzed,
                                news_score: self.scorer.clamp_news(verdict.news_score),
                                llm_unavailable: false,
                            })
                            .collect(),
                        // 응답 수가 요청 수와 어긋나면 어느 후보의 점수인지 알 수 없다
                        Ok(verdicts) => {
                            let e = PipelineError::BatchMismatch {
                                requested: batch.len(),
                                returned: verdicts.len(),
                            };
                            warn!(error = %e, "LLM 배치 응답 불일치, 뉴스 점수 0으로 보수 처리");
                            Self::degrade_batch(batch)
                        }
                        Err(e) => {
                            warn!(error = %e, "LLM 배치 실패, 뉴스 점수 0으로 보수 처리");
                            Self::degrade_batch(batch)
                        }
                    }
                }
            })
            .buffer_unordered(self.config.pipeline.llm_concurrency.max(1))
            .collect()
            .await;

        let scored: Vec<ScoredCandidate> = scored.into_iter().flatten().collect();
        info!(count = scored.len(), "Phase3 감성 분석 완료");
        scored
    }

    /// LLM 불가 시의 보수적 대체: 뉴스 점수 0 + 플래그.
    fn degrade_batch(batch: Vec<NewsReadyCandidate>) -> Vec<ScoredCandidate> {
        batch
            .into_iter()
            .map(|item| ScoredCandidate {
                analyzed: item.analyzed,
                news_score: 0,
                llm_unavailable: true,
            })
            .collect()
    }

    /// Phase4: 점수 확정 → 등급 → 포지션 계획 → 정렬/상위 N개.
    fn phase4_finalize(
        &self,
        scored: Vec<ScoredCandidate>,
        drops: &mut Vec<DropRecord>,
    ) -> Vec<TradeSignal> {
        let mut signals = Vec::new();

        for item in scored {
            let ticker = item.analyzed.candidate.ticker.clone();
            let mut partial = item.analyzed.partial.clone();
            partial.news = Some(item.news_score);

            let detail = match self.scorer.finalize(&partial) {
                Ok(detail) => detail,
                Err(e) => {
                    drops.push(DropRecord::new(&ticker, format!("점수 확정 실패: {}", e)));
                    continue;
                }
            };

            let grade = self.scorer.determine_grade(detail.total);
            let plan = match self.sizer.size(
                item.analyzed.entry,
                item.analyzed.stop,
                self.capital,
                grade,
            ) {
                Ok(plan) => plan,
                Err(e) => {
                    drops.push(DropRecord::new(
                        &ticker,
                        format!("포지션 계산 실패: {}", e),
                    ));
                    continue;
                }
            };

            signals.push(TradeSignal::new(
                item.analyzed.candidate,
                grade,
                detail,
                plan,
                item.llm_unavailable,
            ));
        }

        // 등급 높은 순 → 같은 등급이면 총점 높은 순
        signals.sort_by(|a, b| {
            b.grade
                .rank()
                .cmp(&a.grade.rank())
                .then(b.total_score.cmp(&a.total_score))
        });
        signals.truncate(self.config.pipeline.max_positions);

        info!(signals = signals.len(), "Phase4 확정 완료");
        signals
    }

    /// 일시적 오류에 한해 백오프를 두고 재시도합니다.
    async fn with_retry<T, E, F, Fut>(&self, mut op: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let max_retries = self.config.pipeline.max_retries;
        let backoff_ms = self.config.pipeline.retry_backoff_ms;

        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_retries && e.is_retryable() => {
                    attempt += 1;
                    let delay = backoff_ms * 2u64.saturating_pow(attempt - 1);
                    warn!(error = %e, attempt, delay_ms = delay, "일시적 오류, 재시도");
                    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 재시도 판정용 내부 트레잇.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for DataError {
    fn is_retryable(&self) -> bool {
        DataError::is_retryable(self)
    }
}

impl Retryable for PipelineError {
    fn is_retryable(&self) -> bool {
        PipelineError::is_retryable(self)
    }
}
