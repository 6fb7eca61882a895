use consensusbot::backtest::{MarketScenario, ReplayMetrics, ReplayRunner, SyntheticDataGenerator};
use consensusbot::persistence::MemoryBackend;
use consensusbot::{ConsensusEngine, Result, Settings};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("consensusbot=info")
        .init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          CONSENSUSBOT REPLAY SUITE                    ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let settings = Settings::load(None)?;
    let runner = ReplayRunner::default();

    let scenarios = vec![
        (MarketScenario::Uptrend, "📈 Uptrend"),
        (MarketScenario::Downtrend, "📉 Downtrend"),
        (MarketScenario::Sideways, "↔️  Sideways (mean-reverting)"),
        (MarketScenario::Volatile, "⚡ Volatile (±3% swings)"),
        (MarketScenario::Squeeze, "🗜️  Squeeze then breakout"),
    ];

    let mut all_metrics = Vec::new();

    for (scenario, name) in scenarios {
        let mut generator = SyntheticDataGenerator::new(42);
        let candles = generator.generate(scenario, 800, 1);

        // Fresh weights per scenario so runs stay comparable
        let engine = ConsensusEngine::with_backend(&settings, MemoryBackend::new());

        match runner.run(&engine, &candles, name) {
            Ok(metrics) => {
                metrics.print_report();
                all_metrics.push(metrics);
            }
            Err(e) => {
                eprintln!("❌ Replay failed for {}: {}", name, e);
            }
        }
    }

    print_summary_comparison(&all_metrics);

    Ok(())
}

fn print_summary_comparison(results: &[ReplayMetrics]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<32} {:>8} {:>8} {:>8} {:>8}",
        "Scenario", "Trades", "Win%", "CALL", "PUT"
    );
    println!("{}", "─".repeat(70));

    for metrics in results {
        println!(
            "{:<32} {:>8} {:>8.1} {:>8} {:>8}",
            metrics.label,
            metrics.total_trades(),
            metrics.win_rate(),
            metrics.calls(),
            metrics.puts()
        );
    }

    let total_trades: usize = results.iter().map(ReplayMetrics::total_trades).sum();
    let total_wins: usize = results.iter().map(ReplayMetrics::wins).sum();

    println!("\n📊 Overall Statistics:");
    println!("   Total Trades Across All Scenarios: {}", total_trades);
    if total_trades > 0 {
        println!(
            "   Pooled Win Rate: {:.1}%",
            total_wins as f64 / total_trades as f64 * 100.0
        );
    }

    println!("\n═══════════════════════════════════════════════════════\n");
}
