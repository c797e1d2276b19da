use std::{ffi::OsString, path::PathBuf, process::exit, sync::atomic::AtomicBool};

use clap::{error::ErrorKind, Parser};
use miner::{
    build_info,
    config::{load_config_file, FileConfig, MinerConfig},
    hasher::Argon2Hasher,
    scheduler::RoundScheduler,
    sink::ResultSink,
    worker::MiningContext,
};
use shared::{
    errors::{MinerError, MinerResult},
    log::init_log,
    types::Address,
};
use tracing::*;

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "ADDRESS",
        help = "Wallet address receiving the coins, 20 bytes of hex with optional 0x prefix"
    )]
    address: Option<Address>,

    #[arg(
        short,
        long,
        value_name = "THREADS",
        help = "The number of worker threads, defaults to the number of CPU cores"
    )]
    threads: Option<usize>,

    #[arg(short, long, value_name = "PATH", help = "Append found solutions to this file [default: coins.txt]")]
    output: Option<PathBuf>,

    #[arg(short, long, value_name = "PATH", help = "JSON config file, command line flags take precedence")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "NONCES", help = "Nonces scanned by each thread per round")]
    chunk_size: Option<u32>,

    #[arg(long, value_name = "DIFFICULTY", help = "Largest leading 32-bit digest value accepted")]
    difficulty: Option<u32>,

    #[arg(long, value_name = "ROUNDS", help = "Stop after this many rounds instead of running forever")]
    rounds: Option<u64>,

    #[arg(long, help = "Do not pin worker threads to CPU cores")]
    no_pin: bool,
}

impl Args {
    fn into_config(self) -> MinerResult<MinerConfig> {
        let file = match &self.config {
            Some(path) => load_config_file(path).map_err(|err| MinerError::Config(format!("{err:#}")))?,
            None => FileConfig::default(),
        };

        let mut config = MinerConfig::from_file(file, self.address)?;
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if self.rounds.is_some() {
            config.max_rounds = self.rounds;
        }
        if self.no_pin {
            config.pin_cores = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// What the command line asks for.
enum Invocation {
    Mine(Args),
    /// `--help` or `--version`, printed by clap with a zero exit status
    Print(clap::Error),
}

/// Argument errors are configuration errors and exit with code 1.
fn parse_args<I, T>(argv: I) -> MinerResult<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone, {
    match Args::try_parse_from(argv) {
        Ok(args) => Ok(Invocation::Mine(args)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Ok(Invocation::Print(err))
        }
        Err(err) => Err(MinerError::Config(err.to_string())),
    }
}

fn main() {
    init_log("info");

    let result = parse_args(std::env::args_os()).and_then(|invocation| match invocation {
        Invocation::Mine(args) => run(args),
        Invocation::Print(info) => info.exit(),
    });

    if let Err(err) = result {
        error!("{err}");
        exit(err.exit_code());
    }
}

fn run(args: Args) -> MinerResult<()> {
    let config = args.into_config()?;
    let hasher = Argon2Hasher::new(&config.argon2)?;
    let sink = ResultSink::open(&config.output)?;

    info!(
        "Miner {} ({}) starting... Threads: {}, Address: {}, Output: {}",
        build_info::VERSION,
        build_info::PROFILE,
        config.threads,
        config.address,
        config.output.display()
    );

    let mut scheduler = RoundScheduler::new(MiningContext {
        config,
        hasher,
        sink,
    })?;

    // never set: the miner runs until killed, a fatal error, or the round limit
    let shutdown = AtomicBool::new(false);
    let rounds = scheduler.run(&shutdown)?;
    info!("stopped after {rounds} rounds");
    Ok(())
}
