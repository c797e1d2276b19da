use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared::{
    errors::{MinerError, MinerResult},
    types::Address,
};

use crate::hasher::Argon2Settings;

pub const DEFAULT_CHUNK_SIZE: u32 = 4096;
pub const DEFAULT_DIFFICULTY: u32 = 0x0000_0003;
pub const DEFAULT_OUTPUT: &str = "coins.txt";

/// Size of the 32-bit nonce space.
pub const NONCE_SPACE: u64 = 1 << 32;

/// Optional settings read from a JSON file. Anything left out falls back to
/// the built-in default, and command line flags win over both.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FileConfig {
    pub address: Option<Address>,
    pub threads: Option<usize>,
    pub chunk_size: Option<u32>,
    pub difficulty: Option<u32>,
    pub output: Option<PathBuf>,
    pub pin_cores: Option<bool>,
    pub rounds: Option<u64>,
    pub argon2: Option<Argon2Settings>,
}

pub fn load_config_file<P>(config_file: P) -> anyhow::Result<FileConfig>
where
    P: AsRef<Path>, {
    let path = config_file.as_ref();
    let file = File::open(path).with_context(|| format!("{} config file not found", path.display()))?;
    let config = serde_json::from_reader(file)
        .with_context(|| format!("fail to parse config file {}", path.display()))?;
    Ok(config)
}

/// Settings shared read-only by every worker for the whole process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerConfig {
    pub address: Address,
    pub threads: usize,
    pub chunk_size: u32,
    pub difficulty: u32,
    pub argon2: Argon2Settings,
    pub output: PathBuf,
    pub pin_cores: bool,
    pub max_rounds: Option<u64>,
}

impl MinerConfig {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            threads: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            difficulty: DEFAULT_DIFFICULTY,
            argon2: Argon2Settings::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            pin_cores: true,
            max_rounds: None,
        }
    }

    /// Build from a file layer; the address may still come from the command
    /// line through `address`.
    pub fn from_file(file: FileConfig, address: Option<Address>) -> MinerResult<Self> {
        let address = address
            .or(file.address)
            .ok_or_else(|| MinerError::Config("a wallet address is required".into()))?;

        let mut config = Self::new(address);
        if let Some(threads) = file.threads {
            config.threads = threads;
        }
        if let Some(chunk_size) = file.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(difficulty) = file.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(output) = file.output {
            config.output = output;
        }
        if let Some(pin_cores) = file.pin_cores {
            config.pin_cores = pin_cores;
        }
        if let Some(argon2) = file.argon2 {
            config.argon2 = argon2;
        }
        config.max_rounds = file.rounds;
        Ok(config)
    }

    /// Nonces scanned per round across all workers.
    pub fn hashes_per_round(&self) -> u64 {
        self.chunk_size as u64 * self.threads as u64
    }

    pub fn validate(&self) -> MinerResult<()> {
        if self.threads == 0 {
            return Err(MinerError::Config("at least one worker thread is required".into()));
        }
        if self.chunk_size == 0 {
            return Err(MinerError::Config("chunk size must be positive".into()));
        }
        if self.hashes_per_round() > NONCE_SPACE {
            return Err(MinerError::Config(format!(
                "{} threads x {} nonces exceeds the 32-bit nonce space",
                self.threads, self.chunk_size
            )));
        }
        if self.max_rounds == Some(0) {
            return Err(MinerError::Config("rounds must be positive".into()));
        }
        Ok(())
    }
}
