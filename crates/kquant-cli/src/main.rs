//! 시그널 엔진 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 오늘 기준 전체 파이프라인 실행 (JSON 보고서를 표준 출력으로)
//! kquant run
//!
//! # 특정 날짜 + 운용 자본 지정
//! kquant run --as-of 2024-06-28 --capital 50000000 --output report.json
//!
//! # 시장 레짐만 평가
//! kquant regime
//!
//! # 상승률 상위 후보 스캔
//! kquant scan --limit 10
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use kquant_analytics::MarketRegimeEvaluator;
use kquant_core::{init_logging, EngineConfig, LogConfig, Market};
use kquant_data::{GlobalDataFetcher, MarketDataService, StockDataFetcher};
use kquant_pipeline::{LlmSentimentClient, NaverNewsCollector, SignalPipeline};

#[derive(Parser)]
#[command(name = "kquant")]
#[command(about = "KQuant - 한국 주식 퀀트 시그널 엔진", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (미지정 시 기본값 + KQUANT__ 환경 변수)
    #[arg(long)]
    config: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 파이프라인 실행 (게이트 → 분석 → 뉴스 → LLM → 시그널)
    Run {
        /// 기준 날짜 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long)]
        as_of: Option<String>,

        /// 운용 자본 (원)
        #[arg(long, default_value = "10000000")]
        capital: String,

        /// 보고서 저장 경로 (미지정 시 표준 출력)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 시장 레짐 평가만 수행
    Regime {
        /// 기준 날짜 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// 상승률 상위 후보 스캔 (KOSPI + KOSDAQ)
    Scan {
        /// 시장별 후보 수
        #[arg(long, default_value = "30")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(LogConfig::new(cli.log_level.clone()))?;

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_default()?,
    };

    match cli.command {
        Commands::Run {
            as_of,
            capital,
            output,
        } => run_pipeline(config, as_of, capital, output).await,
        Commands::Regime { as_of } => evaluate_regime(config, as_of).await,
        Commands::Scan { limit } => scan_candidates(limit).await,
    }
}

async fn run_pipeline(
    config: EngineConfig,
    as_of: Option<String>,
    capital: String,
    output: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let as_of = parse_as_of(as_of)?;
    let capital: Decimal = capital.parse()?;

    let fetcher = Arc::new(MarketDataService::korean_default()?);
    let news = Arc::new(NaverNewsCollector::from_env()?);
    let sentiment = Arc::new(LlmSentimentClient::new(config.llm.clone()));

    let pipeline = SignalPipeline::builder(config)
        .fetcher(fetcher)
        .news(news)
        .sentiment(sentiment)
        .capital(capital)
        .build()?;

    info!(%as_of, %capital, "파이프라인 실행");
    let report = pipeline.run(as_of).await?;

    let document = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "as_of": as_of,
        "capital": capital,
        "report": report,
    });
    let rendered = serde_json::to_string_pretty(&document)?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            info!(path = %path, signals = report.signals.len(), "보고서 저장 완료");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn evaluate_regime(
    config: EngineConfig,
    as_of: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let as_of = parse_as_of(as_of)?;
    let history_days = config.regime.min_history as i64 + 30;

    let fetcher = MarketDataService::korean_default()?;
    let kospi = fetcher
        .fetch_index(Market::Kospi.index_symbol(), as_of, history_days)
        .await?;
    let kosdaq = fetcher
        .fetch_index(Market::Kosdaq.index_symbol(), as_of, history_days)
        .await?;

    let floor = config.regime.tradeable_floor;
    let evaluator = MarketRegimeEvaluator::new(config.regime);
    let status = evaluator.evaluate(&kospi, &kosdaq)?;

    // 글로벌 컨텍스트는 보조 지표라 실패해도 평가 결과에는 영향 없음
    let global = GlobalDataFetcher::new()?.snapshot(as_of).await;

    let document = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "as_of": as_of,
        "status": status,
        "tradeable": status.tradeable(floor),
        "global": global,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

async fn scan_candidates(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = MarketDataService::korean_default()?;

    let mut candidates = Vec::new();
    for market in [Market::Kospi, Market::Kosdaq] {
        candidates.extend(fetcher.top_gainers(market, limit).await?);
    }

    let document = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "count": candidates.len(),
        "candidates": candidates,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn parse_as_of(raw: Option<String>) -> Result<chrono::NaiveDate, chrono::ParseError> {
    match raw {
        Some(s) => chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d"),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
