use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info, warn};

use ordermetrics::cards::{LookupProvider, PokemonTcgClient};
use ordermetrics::config::Config;
use ordermetrics::imap_client::ImapClient;
use ordermetrics::output_writer::{ConsoleOutput, FileOutputWriter, OutputSink};
use ordermetrics::poll_cycle::{CycleReport, PollCycle};
use ordermetrics::state::{JsonFileRepository, ReadOnlyRepository, Repository};

#[derive(Parser)]
#[command(name = "ordermetrics")]
#[command(about = "Watches a mailbox for sold-item notifications and publishes the sold cards for an overlay")]
#[command(version = "0.1.0")]
struct Args {
    /// Run a single cycle and print the results without writing any file
    #[arg(short, long)]
    dry_run: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Check the configuration without connecting
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    let config = Config::new()?;

    if args.check_config {
        println!("✅ Configuration valid!");
        println!("📧 IMAP: {}@{}:{} folder '{}'",
                 config.imap.username, config.imap.server, config.imap.port, config.imap.folder);
        println!("🔎 Subject phrase: '{}'", config.poll.subject_phrase);
        println!("📅 Lookback: {} day(s), interval: {}s",
                 config.poll.lookback_days, config.poll.interval.as_secs());
        println!("🃏 Catalog: {} (API key {})",
                 config.lookup.base_url, if config.lookup.api_key.is_some() { "set" } else { "not set" });
        println!("💾 Cache: {}", config.output.cache_path.display());
        println!("📁 Outputs: {}, {}, {}, {}",
                 config.output.orders_path.display(), config.output.cards_path.display(),
                 config.output.all_cards_path.display(), config.output.summary_path.display());
        return Ok(());
    }

    let lookup = PokemonTcgClient::new(&config.lookup);
    let repository = JsonFileRepository::new(&config.output.cache_path);

    if args.dry_run {
        info!("🧪 Starting order monitor in DRY-RUN mode");
        let mut cycle = PollCycle::new(config.poll.clone(), lookup, ReadOnlyRepository(repository), ConsoleOutput)
            .context("Unable to load the cache")?;
        run_single_cycle(&config, &mut cycle).await;
        return Ok(());
    }

    info!("🚀 Starting order monitor");
    let output = FileOutputWriter::new(config.output.clone());
    let mut cycle = PollCycle::new(config.poll.clone(), lookup, repository, output)
        .with_context(|| format!("Unable to load the cache {}, fix or move it before restarting",
                                 config.output.cache_path.display()))?;

    if args.once {
        run_single_cycle(&config, &mut cycle).await;
        return Ok(());
    }

    tokio::select! {
        _ = run_daemon_mode(&config, &mut cycle) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Stopped by user");
        }
    }

    Ok(())
}

/// Connects, runs one cycle and logs out. A connection failure only skips
/// this cycle.
async fn run_single_cycle<L, R, O>(config: &Config, cycle: &mut PollCycle<L, R, O>) -> Option<CycleReport>
where
    L: LookupProvider,
    R: Repository,
    O: OutputSink,
{
    let mut client = match ImapClient::connect(&config.imap).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Mailbox connection failed: {:#}", e);
            return None;
        }
    };

    let report = cycle.run(&mut client, Local::now()).await;

    if let Err(e) = client.logout().await {
        warn!("⚠️  {:#}", e);
    }

    if !report.newest_batch.is_empty() {
        info!("🃏 Latest order has {} card(s)", report.newest_batch.len());
    }

    Some(report)
}

async fn run_daemon_mode<L, R, O>(config: &Config, cycle: &mut PollCycle<L, R, O>)
where
    L: LookupProvider,
    R: Repository,
    O: OutputSink,
{
    info!("🔄 Polling every {} seconds, press Ctrl+C to stop", config.poll.interval.as_secs());

    loop {
        info!("⏳ Checking for new orders...");
        run_single_cycle(config, cycle).await;

        info!("⏱  Next check in {} seconds", config.poll.interval.as_secs());
        tokio::time::sleep(config.poll.interval).await;
    }
}
