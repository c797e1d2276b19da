use argon2::{Algorithm, Argon2, Block, Params, Version};
use serde::{Deserialize, Serialize};
use shared::errors::{MinerError, MinerResult};

pub const HASH_LEN: usize = 32;
const MIN_SALT_LEN: usize = 8;

pub type Digest = [u8; HASH_LEN];

/// Memory-hard hash used as the proof-of-work function.
///
/// Every worker thread allocates its scratch memory once through
/// [`PowHash::memory`] and reuses it for every nonce it scans.
pub trait PowHash: Send + Sync {
    type Memory: Send;

    fn memory(&self) -> Self::Memory;

    fn hash_with_memory(&self, memory: &mut Self::Memory, input: &[u8]) -> MinerResult<Digest>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Argon2Settings {
    pub t_cost: u32,
    /// kibibytes
    pub m_cost: u32,
    pub parallelism: u32,
    pub salt: String,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            t_cost: 1,
            m_cost: 512,
            parallelism: 1,
            salt: "semux-pow-argon2".to_string(),
        }
    }
}

/// Argon2i v1.3 with a fixed salt and a 32 byte raw output.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    salt: Vec<u8>,
    blocks: usize,
}

impl Argon2Hasher {
    pub fn new(settings: &Argon2Settings) -> MinerResult<Self> {
        if settings.salt.len() < MIN_SALT_LEN {
            return Err(MinerError::Config(format!(
                "argon2 salt must be at least {MIN_SALT_LEN} bytes, got {}",
                settings.salt.len()
            )));
        }

        let params = Params::new(
            settings.m_cost,
            settings.t_cost,
            settings.parallelism,
            Some(HASH_LEN),
        )
        .map_err(|err| MinerError::Config(format!("invalid argon2 params: {err}")))?;

        let hasher = Self {
            blocks: params.block_count(),
            argon2: Argon2::new(Algorithm::Argon2i, Version::V0x13, params),
            salt: settings.salt.as_bytes().to_vec(),
        };

        // surface any parameter problem before the first round
        let mut memory = hasher.memory();
        hasher
            .hash_with_memory(&mut memory, &[0u8; 32])
            .map_err(|err| MinerError::Config(err.to_string()))?;

        Ok(hasher)
    }
}

impl PowHash for Argon2Hasher {
    type Memory = Vec<Block>;

    fn memory(&self) -> Self::Memory {
        vec![Block::default(); self.blocks]
    }

    fn hash_with_memory(&self, memory: &mut Self::Memory, input: &[u8]) -> MinerResult<Digest> {
        let mut digest = [0u8; HASH_LEN];
        self.argon2
            .hash_password_into_with_memory(input, &self.salt, &mut digest, memory.as_mut_slice())
            .map_err(|err| MinerError::Hash(err.to_string()))?;
        Ok(digest)
    }
}

/// Difficulty value of a digest: its first four bytes, big-endian.
pub fn difficulty_of(digest: &Digest) -> u32 {
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
