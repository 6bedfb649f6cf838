//! 개인 자산관리 분석 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기술적 분석 (최근 6개월)
//! advisor analyze data/AAPL_daily.csv --period 6mo
//!
//! # 포트폴리오 최적화 (샤프 비율 최대화, 1,000만원 배분)
//! advisor optimize data/AAPL.csv data/MSFT.csv data/GOOG.csv --objective max_sharpe --amount 10000000
//!
//! # 가격 예측 (JSON 출력)
//! advisor --format json forecast data/SPY.csv --seed 7
//!
//! # 적립식 투자 계산
//! advisor sip --monthly 500000 --years 10 --rate 12 --target 100000000
//! ```

use std::path::PathBuf;

use advisor_analytics::ml::ForecastSeeds;
use advisor_analytics::{AnalysisService, AnalyticsConfig, Objective};
use advisor_cli::commands::analyze::run_analyze;
use advisor_cli::commands::forecast::run_forecast;
use advisor_cli::commands::optimize::run_optimize;
use advisor_cli::commands::sip::{run_sip, SipInput};
use advisor_cli::{load_series, OutputFormat};
use advisor_core::{init_logging, DataPeriod, DEFAULT_CONFIG_PATH};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "Personal finance analytics - 기술적 분석, 포트폴리오 최적화, 가격 예측", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (TOML)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 출력 형식 (table, json)
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 기술적 지표와 매매 시그널 분석
    Analyze {
        /// OHLCV CSV 파일 (date,open,high,low,close,volume)
        file: PathBuf,

        /// 종목 심볼 (기본: 파일 이름)
        #[arg(short, long)]
        symbol: Option<String>,

        /// 분석 기간 (1mo, 3mo, 6mo, 1y, 2y, 3y, 5y, max)
        #[arg(short, long, default_value = "max")]
        period: DataPeriod,
    },

    /// 몬테카를로 포트폴리오 최적화
    Optimize {
        /// 종목별 OHLCV CSV 파일 (2개 이상)
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// 최적화 목표 (max_sharpe, max_return, min_volatility)
        #[arg(short, long, default_value = "max_sharpe")]
        objective: Objective,

        /// 난수 시드 (기본: 설정값)
        #[arg(long)]
        seed: Option<u64>,

        /// 배분할 투자금
        #[arg(short, long)]
        amount: Option<Decimal>,

        /// 분석 기간
        #[arg(short, long, default_value = "max")]
        period: DataPeriod,
    },

    /// LSTM 모델과 확률 시뮬레이터로 가격 예측
    Forecast {
        /// OHLCV CSV 파일
        file: PathBuf,

        /// 종목 심볼 (기본: 파일 이름)
        #[arg(short, long)]
        symbol: Option<String>,

        /// 두 모델에 공통으로 쓸 난수 시드 (기본: 설정값)
        #[arg(long)]
        seed: Option<u64>,

        /// 분석 기간
        #[arg(short, long, default_value = "max")]
        period: DataPeriod,
    },

    /// 적립식 투자(SIP) 계산
    Sip {
        /// 초기 투자금
        #[arg(long, default_value = "0")]
        initial: Decimal,

        /// 월 납입금
        #[arg(short, long)]
        monthly: Decimal,

        /// 투자 기간 (년)
        #[arg(short, long)]
        years: u32,

        /// 기대 연 수익률 (%)
        #[arg(short, long)]
        rate: Decimal,

        /// 목표 금액 (필요 월 납입금 계산)
        #[arg(short, long)]
        target: Option<Decimal>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AnalyticsConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    init_logging(config.logging.to_log_config())?;

    info!(config = %cli.config.display(), format = %cli.format, "Starting advisor");
    let service = AnalysisService::new(config);

    let output = match run(&service, cli.command, cli.format) {
        Ok(output) => output,
        Err(e) => {
            error!("Command failed: {:#}", e);
            return Err(e);
        }
    };
    println!("{}", output);

    Ok(())
}

fn run(service: &AnalysisService, command: Commands, format: OutputFormat) -> Result<String> {
    match command {
        Commands::Analyze { file, symbol, period } => {
            let series = load_series(&file, symbol.as_deref())?.last_period(period);
            run_analyze(service, &series, format)
        }

        Commands::Optimize {
            files,
            objective,
            seed,
            amount,
            period,
        } => {
            let series = files
                .iter()
                .map(|f| load_series(f, None).map(|s| s.last_period(period)))
                .collect::<Result<Vec<_>>>()?;
            run_optimize(service, &series, objective, seed, amount, format)
        }

        Commands::Forecast {
            file,
            symbol,
            seed,
            period,
        } => {
            let series = load_series(&file, symbol.as_deref())?.last_period(period);
            run_forecast(service, &series, seed.map(ForecastSeeds::uniform), format)
        }

        Commands::Sip {
            initial,
            monthly,
            years,
            rate,
            target,
        } => run_sip(
            SipInput {
                initial,
                monthly,
                years,
                annual_rate_pct: rate,
                target,
            },
            format,
        ),
    }
}
