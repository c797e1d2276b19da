//! Fixed layout of a candidate solution: `address || timestamp || nonce`,
//! integers big-endian. Persisted solutions are the hex form of this buffer,
//! so the layout must never change.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use shared::{
    errors::MinerError,
    types::{Address, ADDRESS_LEN},
};

pub const TIMESTAMP_LEN: usize = 8;
pub const NONCE_LEN: usize = 4;
pub const PREIMAGE_LEN: usize = ADDRESS_LEN + TIMESTAMP_LEN + NONCE_LEN;

const TIMESTAMP_OFFSET: usize = ADDRESS_LEN;
const NONCE_OFFSET: usize = ADDRESS_LEN + TIMESTAMP_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preimage([u8; PREIMAGE_LEN]);

impl Preimage {
    pub fn build(address: &Address, timestamp: u64, nonce: u32) -> Self {
        let mut data = [0u8; PREIMAGE_LEN];
        data[..ADDRESS_LEN].copy_from_slice(address.as_bytes());
        data[TIMESTAMP_OFFSET..NONCE_OFFSET].copy_from_slice(&timestamp.to_be_bytes());
        data[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
        Preimage(data)
    }

    /// Rewrite only the nonce field. Used by workers to walk a range without
    /// re-encoding the address and timestamp.
    pub fn set_nonce(&mut self, nonce: u32) {
        self.0[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
    }

    pub fn as_bytes(&self) -> &[u8; PREIMAGE_LEN] {
        &self.0
    }

    pub fn address(&self) -> Address {
        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&self.0[..ADDRESS_LEN]);
        Address(address)
    }

    pub fn timestamp(&self) -> u64 {
        let mut bytes = [0u8; TIMESTAMP_LEN];
        bytes.copy_from_slice(&self.0[TIMESTAMP_OFFSET..NONCE_OFFSET]);
        u64::from_be_bytes(bytes)
    }

    pub fn nonce(&self) -> u32 {
        let mut bytes = [0u8; NONCE_LEN];
        bytes.copy_from_slice(&self.0[NONCE_OFFSET..]);
        u32::from_be_bytes(bytes)
    }
}

impl Display for Preimage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Preimage {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut data = [0u8; PREIMAGE_LEN];
        hex::decode_to_slice(s.trim(), &mut data)
            .map_err(|err| MinerError::Config(format!("malformed solution line `{s}`: {err}")))?;
        Ok(Preimage(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address(core::array::from_fn(|i| i as u8 + 1))
    }

    #[test]
    fn layout_is_address_then_big_endian_fields() {
        let preimage = Preimage::build(&address(), 0x0102_0304_0506_0708, 0x0a0b_0c0d);
        let bytes = preimage.as_bytes();

        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..20], address().as_bytes());
        assert_eq!(&bytes[20..28], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[28..], &[0x0a, 0x0b, 0x0c, 0x0d]);
    }

    #[test]
    fn fields_decode_back() {
        let preimage = Preimage::build(&address(), 1_700_000_000_123, u32::MAX);
        assert_eq!(preimage.address(), address());
        assert_eq!(preimage.timestamp(), 1_700_000_000_123);
        assert_eq!(preimage.nonce(), u32::MAX);
    }

    #[test]
    fn set_nonce_only_touches_nonce() {
        let mut preimage = Preimage::build(&address(), 42, 0);
        preimage.set_nonce(7);
        assert_eq!(preimage, Preimage::build(&address(), 42, 7));
    }

    #[test]
    fn hex_line_is_lower_case_and_parses() {
        let preimage = Preimage::build(&address(), 0xffff, 0xabcdef01);
        let line = preimage.to_string();

        assert_eq!(line.len(), PREIMAGE_LEN * 2);
        assert!(line.ends_with("000000000000ffffabcdef01"));
        assert_eq!(line, line.to_lowercase());
        assert_eq!(format!("{line}\n").parse::<Preimage>().unwrap(), preimage);
    }

    #[test]
    fn reject_short_line() {
        assert!("0102".parse::<Preimage>().is_err());
        assert!("zz".repeat(PREIMAGE_LEN).parse::<Preimage>().is_err());
    }
}
