use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::errors::MinerError;

pub const ADDRESS_LEN: usize = 20;

/// Wallet address that receives the mined coins.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|err| MinerError::Config(format!("address `{s}` is not hex: {err}")))?;
        let bytes: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            MinerError::Config(format!(
                "address `{s}` is {} bytes, expected {ADDRESS_LEN}",
                bytes.len()
            ))
        })?;
        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = MinerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}
