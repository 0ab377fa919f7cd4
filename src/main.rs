//! dca-submitter
//!
//! Creates one DCA schedule on-chain:
//!
//! ```text
//!   .privateKey.txt ──▶ Credential ─────────────────────────┐
//!   DCAContract.json ─▶ ContractDescriptor ──┐              │ sign
//!   fresh key pair ──▶ <address>_key.txt     ├─▶ TxBuilder ─┴─▶ SignedEnvelope ─▶ RPC
//!   dca.toml + env ──▶ CallParameters ───────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use dca_submitter::blockchain::ConfirmationStatus;
use dca_submitter::config::{read_config, resolve_config};
use dca_submitter::dca::{generate_deposit_credential, DcaRun, RunOptions, RunReport};
use dca_submitter::observability::init_logging;
use dca_submitter::storage::FileKeyStore;

#[derive(Parser)]
#[command(name = "dca-submitter")]
#[command(about = "Create a DCA schedule with a freshly generated deposit address", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults plus environment overrides when omitted
    #[arg(short, long, env = "DCA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deposit key, then build, sign and send createDCA
    Create {
        /// Build and sign only; print the raw transaction instead of sending it
        #[arg(long)]
        dry_run: bool,
        /// Wait for the transaction to be confirmed
        #[arg(long)]
        wait: bool,
        /// Send even if the journal shows an earlier submission
        #[arg(long)]
        force: bool,
    },
    /// Generate and store a deposit key only
    Keygen,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Keygen => {
            let config = read_config(cli.config.as_deref())?;
            init_logging(&config.observability.log_level);

            let store = FileKeyStore::new(&config.secrets.deposit_key_dir);
            let (credential, location) = generate_deposit_credential(&store)?;
            println!("Generated depositAddress: {}", credential.address());
            println!("Private key saved to {}", location);
        }
        Commands::Create {
            dry_run,
            wait,
            force,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            init_logging(&config.observability.log_level);
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "dca-submitter starting");

            let store = FileKeyStore::new(&config.secrets.deposit_key_dir);
            let options = RunOptions {
                dry_run,
                wait_for_confirmation: wait,
                force,
            };
            let report = DcaRun::new(&config, &store, options).execute().await?;
            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    if report.resumed {
        println!(
            "Resumed run {} for depositAddress: {}",
            report.run_id, report.deposit_address
        );
    } else {
        println!("Generated depositAddress: {}", report.deposit_address);
        match &report.key_location {
            Some(location) => println!("Private key saved to {}", location),
            None => println!("Private key not saved (dry run)"),
        }
    }

    if !report.broadcast {
        println!("Signed transaction (not sent): {}", report.raw_tx);
        println!("Transaction hash: {}", report.tx_hash);
        return;
    }

    println!("Transaction sent! Hash: {}", report.tx_hash);
    match &report.confirmation {
        ConfirmationStatus::Pending => {}
        ConfirmationStatus::Confirmed { block_number } => {
            println!("Confirmed in block {}", block_number)
        }
        ConfirmationStatus::Failed(reason) => println!("Transaction failed: {}", reason),
    }
}
