use clap::{Parser, Subcommand, ValueEnum};
use consensusbot::models::{Candle, CandleSeries, TradeDecision};
use consensusbot::{ConsensusEngine, Result};
use std::path::{Path, PathBuf};
use tokio::time::{interval, Duration};

#[derive(Parser)]
#[command(name = "consensusbot")]
#[command(about = "Weighted analyst consensus for short-expiry CALL/PUT decisions", long_about = None)]
struct Cli {
    /// Config file (defaults to consensus.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a candle file once and print the decision as JSON
    Analyze {
        /// Candle series JSON ({"open":[..],...}) or an array of candles
        #[arg(long)]
        candles: PathBuf,
        /// Also write the decision here, for a later `settle`
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Feed a resolved trade back into the weights
    Settle {
        /// Decision JSON produced by `analyze`
        #[arg(long)]
        decision: PathBuf,
        #[arg(long, value_enum)]
        result: TradeResult,
    },
    /// Print the stored weight document
    Weights,
    /// Restore every analyst to weight 1.0
    Reset,
    /// Re-score a candle file on a fixed interval until Ctrl+C
    Watch {
        #[arg(long)]
        candles: PathBuf,
        /// Seconds between cycles
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TradeResult {
    Win,
    Loss,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let engine = ConsensusEngine::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { candles, out } => {
            let series = read_candles(&candles)?;
            let decision = engine.analyze(&series);
            let json = serde_json::to_string_pretty(&decision)?;

            if let Some(path) = out {
                std::fs::write(&path, &json)?;
                tracing::info!("Decision written to {}", path.display());
            }
            println!("{}", json);
        }
        Commands::Settle { decision, result } => {
            let raw = std::fs::read_to_string(&decision)?;
            let decision: TradeDecision = serde_json::from_str(&raw)?;

            let won = matches!(result, TradeResult::Win);
            let weights = engine.settle(&decision.outcome(won))?;
            println!("{}", serde_json::to_string_pretty(&weights)?);
        }
        Commands::Weights => {
            let document = engine.store().document()?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Commands::Reset => {
            engine.store().reset()?;
            println!("✅ Weights reset ({})", engine.store().describe());
        }
        Commands::Watch { candles, interval } => watch(&engine, &candles, interval).await,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "consensusbot=debug"
    } else {
        "consensusbot=info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Accept either the feed's column layout or a list of timestamped candles
fn read_candles(path: &Path) -> Result<CandleSeries> {
    let raw = std::fs::read_to_string(path)?;

    let column_error = match serde_json::from_str::<CandleSeries>(&raw) {
        Ok(series) => return Ok(series),
        Err(e) => e,
    };

    match serde_json::from_str::<Vec<Candle>>(&raw) {
        Ok(candles) => Ok(CandleSeries::from_candles(&candles)?),
        Err(list_error) => Err(format!(
            "{} is not a candle series ({}) nor a candle list ({})",
            path.display(),
            column_error,
            list_error
        )
        .into()),
    }
}

async fn watch(engine: &ConsensusEngine, candles: &Path, seconds: u64) {
    tracing::info!(
        "🔄 Watching {} every {}s (Ctrl+C to stop)",
        candles.display(),
        seconds
    );

    let mut ticker = interval(Duration::from_secs(seconds.max(1)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                break;
            }
            _ = ticker.tick() => {
                match read_candles(candles) {
                    Ok(series) => {
                        let decision = engine.analyze(&series);
                        match serde_json::to_string(&decision) {
                            Ok(json) => println!("{}", json),
                            Err(e) => tracing::error!("Failed to encode decision: {}", e),
                        }
                    }
                    Err(e) => tracing::error!("Failed to read candles: {}", e),
                }
            }
        }
    }

    tracing::info!("👋 consensusbot stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn candle_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    #[test]
    fn test_read_candles_column_layout() {
        let file = candle_file(r#"{"open":[1.0,2.0],"high":[2.0,3.0],"low":[0.5,1.5],"close":[1.5,2.5]}"#);
        let series = read_candles(file.path()).unwrap();

        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_read_candles_reports_column_validation_error() {
        let file = candle_file(r#"{"open":[1.0,2.0],"high":[2.0,3.0],"low":[0.5],"close":[1.5,2.5]}"#);
        let message = read_candles(file.path()).unwrap_err().to_string();

        assert!(message.contains("column `low` has 1 values, expected 2"), "{}", message);
    }
}
