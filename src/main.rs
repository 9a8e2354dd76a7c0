use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use utxo_ledger::{ChainConfig, Ledger, DEFAULT_DB_PATH, DEFAULT_DIFFICULTY};

#[derive(Parser, Debug)]
#[command(name = "utxo-ledger", version, about = "Single-node proof-of-work UTXO ledger")]
struct Cli {
    /// Chain store directory
    #[arg(long, env = "LEDGER_DB", default_value = DEFAULT_DB_PATH, global = true)]
    db: PathBuf,

    /// Leading zero bits required of new chains' block hashes
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY, global = true)]
    difficulty: u32,

    /// Search nonces on all cores
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a blockchain and send the genesis reward to ADDRESS
    #[command(name = "createblockchain")]
    CreateBlockchain {
        #[arg(long)]
        address: String,
    },
    /// Get the balance of ADDRESS
    #[command(name = "getbalance")]
    GetBalance {
        #[arg(long)]
        address: String,
    },
    /// Send AMOUNT from FROM to TO
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },
    /// Print all the blocks of the blockchain, newest first
    #[command(name = "printchain")]
    PrintChain {
        /// One JSON object per block
        #[arg(long)]
        json: bool,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ChainConfig::new(&cli.db)
        .difficulty(cli.difficulty)
        .parallel_mining(cli.parallel);
    let ledger = Ledger::new(config);

    match cli.command {
        Command::CreateBlockchain { address } => {
            ledger
                .create_chain(&address)
                .with_context(|| format!("creating blockchain at {}", cli.db.display()))?;
            println!("Done!");
        }
        Command::GetBalance { address } => {
            let balance = ledger
                .get_balance(&address)
                .with_context(|| format!("getting balance of '{}'", address))?;
            println!("Balance of '{}': {}", address, balance);
        }
        Command::Send { from, to, amount } => {
            ledger
                .send(&from, &to, amount)
                .with_context(|| format!("sending {} from '{}' to '{}'", amount, from, to))?;
            println!("Success!");
        }
        Command::PrintChain { json } => {
            for view in ledger.print_chain().context("opening blockchain")? {
                let view = view.context("reading block")?;
                if json {
                    println!("{}", serde_json::to_string(&view)?);
                } else {
                    println!("============ Block {} ============", view.hash);
                    println!("Prev. block: {}", view.prev_hash);
                    println!("Timestamp: {}", view.timestamp);
                    println!("Nonce: {}", view.nonce);
                    for txid in &view.transactions {
                        println!("Transaction: {}", txid);
                    }
                    println!("PoW: {}", view.pow_valid);
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
