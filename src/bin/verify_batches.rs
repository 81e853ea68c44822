//! Verify many saved batch responses in parallel

use clap::Parser;
use fairdice::{
    errors::ConfigurationError, logging, parse_automated_bets_response, BatchVerifier, ConfigLoader,
    FairDiceResult, VerificationJob,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "verify-batches")]
#[command(about = "Replay saved automated batch responses", long_about = None)]
struct Args {
    /// Configuration file with a [settings] section
    #[arg(long)]
    config: PathBuf,

    /// Override verifier.max_concurrency
    #[arg(long)]
    concurrency: Option<usize>,

    /// JSON response files
    #[arg(required = true)]
    responses: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> FairDiceResult<bool> {
    let config = ConfigLoader::new().with_path(&args.config).load()?;
    logging::init_tracing(&config.logging);

    let settings = config.settings.clone().ok_or_else(|| {
        ConfigurationError::ValidationFailed(format!("{} has no [settings] section", args.config.display()))
    })?;

    let mut jobs = Vec::with_capacity(args.responses.len());
    for path in &args.responses {
        let json = std::fs::read_to_string(path)?;
        let batch = parse_automated_bets_response(&json, settings.client_seed)?;
        jobs.push(VerificationJob::new(settings.clone(), batch));
    }

    let concurrency = args.concurrency.unwrap_or(config.verifier.max_concurrency);
    let verifier = BatchVerifier::new(concurrency, config.verifier.event_buffer);

    println!("🔍 Verifying {} batches ({} at a time)", jobs.len(), verifier.max_concurrency());
    let results = verifier.verify_all(jobs).await;

    let mut failures = 0usize;
    for (path, result) in args.responses.iter().zip(&results) {
        match result {
            Ok(batch) => println!(
                "   ✅ {}: batch {} ({} bets, net {})",
                path.display(),
                batch.bet_id,
                batch.bet_count(),
                batch.net_profit()
            ),
            Err(e) => {
                failures += 1;
                println!("   ❌ {}: {}", path.display(), e);
            }
        }
    }

    println!("{} verified, {} failed", results.len() - failures, failures);
    Ok(failures == 0)
}
