use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::Mutex,
};

use colored::Colorize;
use shared::errors::{MinerError, MinerResult};
use tracing::*;

use crate::preimage::Preimage;

/// Append-only store of found solutions, one hex line per preimage.
///
/// All workers share one sink; the writer is only touched while the lock is
/// held, so every line lands whole.
pub struct ResultSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl ResultSink<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> MinerResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path).map_err(|source| {
            MinerError::OpenSink {
                path: path.display().to_string(),
                source,
            }
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> ResultSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn append(&self, preimage: &Preimage) -> MinerResult<()> {
        let line = format!("{preimage}\n");

        {
            let mut guard =
                self.writer.lock().map_err(|_| MinerError::Sink("writer lock poisoned".into()))?;
            guard.write_all(line.as_bytes()).map_err(|err| MinerError::Sink(err.to_string()))?;
            guard.flush().map_err(|err| MinerError::Sink(err.to_string()))?;
        }

        info!("{} nonce: {}", "Solution found!".bold().green(), preimage.nonce());
        Ok(())
    }

    pub fn into_inner(self) -> MinerResult<W> {
        self.writer.into_inner().map_err(|_| MinerError::Sink("writer lock poisoned".into()))
    }
}
