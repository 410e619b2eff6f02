mod config;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockanalyser_core::{Lookback, Portfolio, PriceProvider};
use stockanalyser_data::{CsvDataProvider, YahooProvider};
use stockanalyser_engine::{AnalysisError, PortfolioAnalyzer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use config::AppConfig;
use report::Format;

#[derive(Parser)]
#[command(name = "stockanalyser")]
#[command(about = "Portfolio price snapshots and technical indicators")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file
    #[arg(short, long, env = "STOCKANALYSER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Read `{SYMBOL}.csv` files from this directory instead of Yahoo
    #[arg(long, env = "STOCKANALYSER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Configured portfolio to use (default: the first one)
    #[arg(long, global = true, env = "STOCKANALYSER_PORTFOLIO")]
    portfolio: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Day-over-day snapshot of every portfolio symbol, plus a summary
    Analyze {
        /// History to request (1d, 2d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, max)
        #[arg(short, long)]
        period: Option<Lookback>,
    },

    /// Indicator readout and signals for one symbol
    Technical {
        /// Ticker symbol (e.g. "AAPL")
        #[arg(short, long)]
        symbol: String,

        /// History to request (default 1y)
        #[arg(short, long)]
        period: Option<Lookback>,
    },

    /// Relative performance of several symbols, rebased to 100
    Compare {
        /// Comma-separated ticker symbols (e.g. "AAPL,MSFT,NVDA")
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,

        /// History to request (default 1y)
        #[arg(short, long)]
        period: Option<Lookback>,
    },

    /// List the configured portfolio
    Symbols,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for reports
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut app = AppConfig::load(cli.config.as_deref())?;
    match &cli.config {
        Some(path) => info!(
            path = %path.display(),
            portfolios = app.portfolios.len(),
            "Loaded config"
        ),
        None => info!("No config file, using defaults"),
    }
    let portfolio = app.portfolio(cli.portfolio.as_deref())?.clone();
    let provider_name = if cli.data_dir.is_some() { "csv" } else { "yahoo" };

    match cli.command {
        Commands::Analyze { period } => {
            if let Some(period) = period {
                app.analysis.history_period = period;
            }
            info!(command = "analyze", provider = provider_name, portfolio = %portfolio.name, "Running");
            match &cli.data_dir {
                Some(dir) => analyze(CsvDataProvider::new(dir), &portfolio, &app, cli.format).await?,
                None => {
                    let provider = YahooProvider::new(app.provider.yahoo_config())?;
                    analyze(provider, &portfolio, &app, cli.format).await?
                }
            }
        }
        Commands::Technical { symbol, period } => {
            if let Some(period) = period {
                app.indicators.history_period = period;
            }
            let symbol = symbol.trim().to_uppercase();
            info!(command = "technical", provider = provider_name, %symbol, "Running");
            match &cli.data_dir {
                Some(dir) => {
                    technical(CsvDataProvider::new(dir), &symbol, &portfolio, &app, cli.format).await?
                }
                None => {
                    let provider = YahooProvider::new(app.provider.yahoo_config())?;
                    technical(provider, &symbol, &portfolio, &app, cli.format).await?
                }
            }
        }
        Commands::Compare { symbols, period } => {
            let lookback = period.unwrap_or(app.indicators.history_period);
            let symbols: Vec<String> = symbols
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            info!(command = "compare", provider = provider_name, symbols = symbols.len(), "Running");
            match &cli.data_dir {
                Some(dir) => {
                    compare(CsvDataProvider::new(dir), &symbols, lookback, &portfolio, &app, cli.format)
                        .await?
                }
                None => {
                    let provider = YahooProvider::new(app.provider.yahoo_config())?;
                    compare(provider, &symbols, lookback, &portfolio, &app, cli.format).await?
                }
            }
        }
        Commands::Symbols => list_symbols(&portfolio, cli.data_dir.as_deref())?,
    }

    Ok(())
}

/// Print the no-data notice and exit with status 1.
fn exit_no_data(format: Format) -> ! {
    warn!("No usable data, exiting");
    match format {
        Format::Text => println!("{}", report::NO_DATA),
        Format::Json => println!("{}", serde_json::json!({ "error": "no_data" })),
    }
    std::process::exit(1);
}

async fn analyze<P: PriceProvider + 'static>(
    provider: P,
    portfolio: &Portfolio,
    app: &AppConfig,
    format: Format,
) -> Result<()> {
    let analyzer = PortfolioAnalyzer::new(provider, app.analysis.clone());
    let run = match analyzer.run(portfolio).await {
        Ok(run) => run,
        Err(AnalysisError::NoData) => exit_no_data(format),
        Err(e) => return Err(e.into()),
    };

    match format {
        Format::Text => print!("{}", report::render_run(portfolio, &run, chrono::Local::now())?),
        Format::Json => println!("{}", report::to_json(&run)?),
    }
    Ok(())
}

async fn technical<P: PriceProvider + 'static>(
    provider: P,
    symbol: &str,
    portfolio: &Portfolio,
    app: &AppConfig,
    format: Format,
) -> Result<()> {
    let analyzer = PortfolioAnalyzer::new(provider, app.analysis.clone());
    let analysis = analyzer
        .technical(symbol, portfolio, &app.indicators)
        .await?;

    match format {
        Format::Text => print!("{}", report::render_technical(&analysis)?),
        Format::Json => println!("{}", report::to_json(&analysis)?),
    }
    Ok(())
}

async fn compare<P: PriceProvider + 'static>(
    provider: P,
    symbols: &[String],
    lookback: Lookback,
    portfolio: &Portfolio,
    app: &AppConfig,
    format: Format,
) -> Result<()> {
    let analyzer = PortfolioAnalyzer::new(provider, app.analysis.clone());
    let comparison = match analyzer.compare(symbols, portfolio, lookback).await {
        Ok(comparison) => comparison,
        Err(AnalysisError::NoData) => exit_no_data(format),
        Err(e) => return Err(e.into()),
    };

    match format {
        Format::Text => print!("{}", report::render_comparison(&comparison)?),
        Format::Json => println!("{}", report::to_json(&comparison)?),
    }
    Ok(())
}

fn list_symbols(portfolio: &Portfolio, data_dir: Option<&std::path::Path>) -> Result<()> {
    println!("Portfolio {} ({} symbols):", portfolio.name, portfolio.len());
    for holding in &portfolio.holdings {
        match holding.position() {
            Some((quantity, avg_price)) => println!(
                "  {:<8} {:<24} {} @ ${:.2}",
                holding.symbol,
                holding.name,
                quantity.normalize(),
                avg_price.round_dp(2)
            ),
            None => println!("  {:<8} {}", holding.symbol, holding.name),
        }
    }

    if let Some(dir) = data_dir {
        let available = CsvDataProvider::new(dir).available_symbols()?;
        println!();
        println!("CSV files in {}:", dir.display());
        for symbol in &available {
            let marker = if portfolio.symbols().any(|s| s == symbol) { "*" } else { " " };
            println!("  {} {}", marker, symbol);
        }
    }
    Ok(())
}
