//! Fairdice CLI
//!
//! Recompute bet results, inspect odds and verify automated batch responses
//! against the revealed server seed.

use clap::{Parser, Subcommand};
use fairdice::{
    config::LoggingConfig,
    errors::ConfigurationError,
    fairness::{verify_one, VerificationJob},
    games::settings::random_client_seed,
    logging, parse_automated_bets_response, ConfigLoader, FairDiceConfig, FairDiceResult, FairnessOracle, GuessRange,
    PayoutModel, Satoshis, ServerSeed,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fairdice")]
#[command(about = "Provably fair dice verifier", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the results of consecutive bets for a seed pair
    Roll {
        /// Revealed server seed, 64 hex characters
        #[arg(long)]
        seed: String,

        #[arg(long, allow_hyphen_values = true)]
        client_seed: i32,

        /// Index of the first bet
        #[arg(long, default_value = "0")]
        index: u32,

        #[arg(long, default_value = "1")]
        count: u32,
    },

    /// Print chance, multiplier and payout for a guess range
    Odds {
        #[arg(long)]
        low: i64,

        #[arg(long)]
        high: i64,

        /// Stake in coins
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        stake: Satoshis,
    },

    /// Replay an automated batch response and check its totals
    Verify {
        /// JSON response saved from the service
        #[arg(long)]
        response: PathBuf,

        /// Client seed the batch was placed with (defaults to the configured one)
        #[arg(long, allow_hyphen_values = true)]
        client_seed: Option<i32>,

        /// Seed hash published before the batch was placed
        #[arg(long)]
        committed_hash: Option<String>,
    },

    /// Print the SHA-256 commitment of a server seed
    Commit {
        #[arg(long)]
        seed: String,
    },

    /// Draw a random client seed, optionally written into a settings file
    ClientSeed {
        /// Print the configured [settings] with the new seed as TOML
        #[arg(long)]
        settings: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            logging::init_tracing(&LoggingConfig::default());
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init_tracing(&config.logging);

    let result = match args.command {
        Command::Roll {
            seed,
            client_seed,
            index,
            count,
        } => roll(&seed, client_seed, index, count),
        Command::Odds { low, high, stake } => odds(low, high, stake),
        Command::Verify {
            response,
            client_seed,
            committed_hash,
        } => verify(&config, &response, client_seed, committed_hash),
        Command::Commit { seed } => commit(&seed),
        Command::ClientSeed { settings } => client_seed(&config, settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn roll(seed: &str, client_seed: i32, index: u32, count: u32) -> FairDiceResult<()> {
    let oracle = FairnessOracle::from_hex(seed, client_seed)?;
    for i in index..index.saturating_add(count) {
        println!("{:>8}  {:06}", i, oracle.bet_result(i));
    }
    Ok(())
}

fn odds(low: i64, high: i64, stake: Satoshis) -> FairDiceResult<()> {
    let range = GuessRange::new(low, high)?;
    let model = PayoutModel::default();

    println!("Range:       {}", range);
    println!("Chance:      {}", model.chance_to_win(range));
    println!("Multiplier:  {}", model.payout_multiplier(range));
    println!("Payout:      {}", model.win_payout(stake, range));
    println!("Profit:      {}", model.win_profit(stake, range));
    Ok(())
}

fn verify(
    config: &FairDiceConfig,
    response: &Path,
    client_seed: Option<i32>,
    committed_hash: Option<String>,
) -> FairDiceResult<()> {
    let mut settings = config.settings.clone().ok_or_else(|| {
        ConfigurationError::ValidationFailed("verify needs a [settings] section in --config".to_string())
    })?;
    if let Some(seed) = client_seed {
        settings.client_seed = seed;
    }

    let json = std::fs::read_to_string(response)?;
    let batch = parse_automated_bets_response(&json, settings.client_seed)?;

    let mut job = VerificationJob::new(settings, batch);
    if let Some(hash) = committed_hash {
        job = job.with_committed_hash(hash);
    }
    let replayed = verify_one(&job)?;

    println!("🔍 Batch {} ({} bets)", replayed.bet_id, replayed.bet_count());
    println!("{:>12} {:>8} {:>16} {:>16} {:>16}", "bet", "secret", "pay in", "pay out", "balance");
    for outcome in &replayed.outcomes {
        println!(
            "{:>12} {:>8} {:>16} {:>16} {:>16}{}",
            outcome.bet_id,
            outcome.secret,
            outcome.pay_in.to_string(),
            outcome.pay_out.to_string(),
            outcome.balance_after.to_string(),
            if outcome.won { "  win" } else { "" }
        );
    }
    println!();
    println!("Total pay in:   {}", replayed.total_pay_in);
    println!("Total pay out:  {}", replayed.total_pay_out);
    println!("Final balance:  {}", replayed.final_balance);
    println!("✅ Totals match the server response");
    Ok(())
}

fn commit(seed: &str) -> FairDiceResult<()> {
    let seed: ServerSeed = seed.parse()?;
    println!("{}", seed.commitment_hex());
    Ok(())
}

fn client_seed(config: &FairDiceConfig, with_settings: bool) -> FairDiceResult<()> {
    if !with_settings {
        println!("{}", random_client_seed());
        return Ok(());
    }
    let settings = config
        .settings
        .clone()
        .ok_or_else(|| ConfigurationError::ValidationFailed("--settings needs a [settings] section in --config".to_string()))?
        .with_random_client_seed();
    let invalid = |reason: String| ConfigurationError::InvalidValue {
        field: "settings".to_string(),
        value: settings.client_seed.to_string(),
        reason,
    };
    let mut document = toml::Table::new();
    document.insert(
        "settings".to_string(),
        toml::Value::try_from(&settings).map_err(|e| invalid(e.to_string()))?,
    );
    let rendered = toml::to_string(&document).map_err(|e| invalid(e.to_string()))?;
    print!("{}", rendered);
    Ok(())
}
