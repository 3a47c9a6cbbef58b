use anyhow::Result;
use clap::{Parser, Subcommand};
use copysim_catalog::StaticStrategyCatalog;
use copysim_core::{AccountStore, ConfigLoader, StrategySource};
use copysim_receipt::{ReceiptClassifier, StubRecognizer};
use copysim_session::{SessionEvent, SessionRegistry};
use copysim_store::InMemoryAccountStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

const DEMO_HASH: &str = "0x4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f4a5b";

#[derive(Parser)]
#[command(name = "copysim")]
#[command(about = "Simulated copy-trading demo engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted demo session: verify a deposit, deploy onto
    /// strategies, and stream events until every position settles
    Demo {
        /// Config profile (merges config/Config.<profile>.toml)
        #[arg(short, long)]
        profile: Option<String>,
        /// Amount to deploy per strategy
        #[arg(short, long, default_value = "500")]
        amount: Decimal,
        /// Number of active strategies to deploy onto
        #[arg(short = 'n', long, default_value_t = 2)]
        positions: usize,
    },
    /// List the strategy catalog
    Strategies {
        /// Only strategies currently accepting deployments
        #[arg(long)]
        active_only: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Classify extracted receipt text the way an upload would be
    Classify {
        /// Path to a text file standing in for the OCR output
        #[arg(short, long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo {
            profile,
            amount,
            positions,
        } => run_demo(profile, amount, positions).await,
        Commands::Strategies { active_only, json } => run_strategies(active_only, json).await,
        Commands::Classify { text } => run_classify(&text).await,
    }
}

async fn run_demo(profile: Option<String>, amount: Decimal, positions: usize) -> Result<()> {
    let config = match profile {
        Some(profile) => ConfigLoader::load_with_profile(&profile)?,
        None => ConfigLoader::load()?,
    };

    let store: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
    let catalog: Arc<dyn StrategySource> = Arc::new(StaticStrategyCatalog::demo());

    // The stub recognizer stands in for OCR: every upload "contains" a
    // successful transfer covering the planned deployments.
    let deposit = amount * Decimal::from(positions.max(1) as u64);
    let receipt_text = format!("Payment Successful! Hash: {DEMO_HASH} Amount: ${deposit}");
    let classifier = Arc::new(ReceiptClassifier::new(Arc::new(StubRecognizer::new(
        receipt_text,
    ))));

    let registry = SessionRegistry::new(
        Arc::clone(&store),
        Arc::clone(&catalog),
        classifier,
        config.clone(),
    );
    let handle = registry.spawn_session(&config.session.account_id).await?;
    let mut events = handle.subscribe_events();

    handle
        .submit_receipt(b"demo screenshot".to_vec(), "image/png")
        .await?;

    let roster = catalog.list(true).await?;
    let mut expected = 0usize;
    for strategy in roster.iter().take(positions) {
        let deploy = amount.max(strategy.min_investment);
        match handle.open_position(&strategy.id, deploy).await {
            Ok(position_id) => {
                tracing::info!(
                    %position_id,
                    strategy = %strategy.name,
                    amount = %deploy,
                    duration_ms = strategy.duration_ms,
                    "position deployed"
                );
                expected += 1;
            }
            Err(err) => {
                tracing::warn!(strategy = %strategy.name, %err, "deployment refused");
            }
        }
    }

    tracing::info!(positions = expected, "waiting for positions to settle");
    let mut resolved = 0usize;
    while resolved < expected {
        match events.recv().await {
            Ok(SessionEvent::TradeResolved(result)) => {
                resolved += 1;
                tracing::info!(
                    strategy = %result.strategy_name,
                    outcome = ?result.outcome,
                    invested = %result.invested,
                    profit = %result.profit,
                    "trade settled"
                );
            }
            Ok(SessionEvent::DepositVerified { amount, .. }) => {
                tracing::info!(%amount, "deposit verified");
            }
            Ok(SessionEvent::DepositRejected { summary, .. }) => {
                tracing::warn!(summary, "deposit rejected");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "event stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    let status = handle.status().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    registry.shutdown_all().await?;
    Ok(())
}

async fn run_strategies(active_only: bool, json: bool) -> Result<()> {
    let catalog = StaticStrategyCatalog::demo();
    let roster = catalog.list(active_only).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&roster)?);
        return Ok(());
    }

    println!(
        "{:<20} {:<20} {:>10} {:>12} {:>10} {:>9}",
        "ID", "NAME", "DURATION", "RETURN", "MIN", "STATUS"
    );
    for strategy in roster {
        println!(
            "{:<20} {:<20} {:>8}ms {:>5}..{:<5} {:>10} {:>9}",
            strategy.id,
            strategy.name,
            strategy.duration_ms,
            format!("{}%", strategy.min_return_pct),
            format!("{}%", strategy.max_return_pct),
            strategy.min_investment,
            if strategy.is_active { "active" } else { "inactive" },
        );
    }
    Ok(())
}

async fn run_classify(path: &str) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let classifier = ReceiptClassifier::new(Arc::new(StubRecognizer::new(text)));
    let verdict = classifier.classify(&[], "text/plain").await;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
