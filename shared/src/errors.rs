use std::io;

use thiserror::Error;

/// Process exit status for each fatal error class.
pub mod exit_code {
    pub const CONFIG: i32 = 1;
    pub const OPEN_SINK: i32 = 2;
    pub const SPAWN: i32 = 3;
    pub const JOIN: i32 = 4;
    pub const SINK: i32 = 5;
    pub const HASH: i32 = 6;
}

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("fail to open result file `{path}`: {source}")]
    OpenSink {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("fail to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },
    #[error("fail to join worker {worker}: {reason}")]
    Join { worker: usize, reason: String },
    #[error("fail to write solution: {0}")]
    Sink(String),
    #[error("hash primitive failed: {0}")]
    Hash(String),
}

impl MinerError {
    pub fn exit_code(&self) -> i32 {
        match self {
            MinerError::Config(_) => exit_code::CONFIG,
            MinerError::OpenSink { .. } => exit_code::OPEN_SINK,
            MinerError::Spawn { .. } => exit_code::SPAWN,
            MinerError::Join { .. } => exit_code::JOIN,
            MinerError::Sink(_) => exit_code::SINK,
            MinerError::Hash(_) => exit_code::HASH,
        }
    }
}

pub type MinerResult<T> = Result<T, MinerError>;
