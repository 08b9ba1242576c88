//! Federation network parameters and genesis loading.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fedchain_core::wire::Reader;
use fedchain_core::{validate_genesis, BlockHeader, Decode};
use tracing::info;

/// Network id of the production network.
pub const MAINNET_NETWORK_ID: u32 = 1;

/// Network id of the public test network.
pub const TESTNET_NETWORK_ID: u32 = 1_939_510_133;

const MAGIC_BASE: u32 = 33_550_335;

/// P2P message start bytes for a network id.
pub fn network_magic(network_id: u32) -> [u8; 4] {
    MAGIC_BASE.wrapping_add(network_id).to_be_bytes()
}

/// `genesis.<network_id>` inside `data_dir`.
pub fn genesis_path(data_dir: &Path, network_id: u32) -> PathBuf {
    data_dir.join(format!("genesis.{}", network_id))
}

/// Parse a serialized genesis block given as hex.
///
/// Only the header is interpreted; the transactions that follow it are
/// ignored. The header must pass genesis validation.
pub fn parse_genesis_hex(genesis_hex: &str) -> Result<BlockHeader> {
    let bytes = hex::decode(genesis_hex.trim()).context("ReadGenesisBlock: invalid genesis file")?;
    if bytes.is_empty() {
        bail!("ReadGenesisBlock: genesis file is empty");
    }

    let mut r = Reader::new(&bytes);
    let genesis = BlockHeader::decode(&mut r).context("ReadGenesisBlock: invalid genesis block")?;
    validate_genesis(&genesis)?;
    Ok(genesis)
}

/// Read and validate the genesis block of `network_id` from `data_dir`.
pub fn load_genesis(data_dir: &Path, network_id: u32) -> Result<BlockHeader> {
    let path = genesis_path(data_dir, network_id);
    info!(path = %path.display(), "reading genesis block");

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("ReadGenesisBlock: unable to read genesis file {}", path.display()))?;
    parse_genesis_hex(&contents).with_context(|| format!("genesis file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_magic() {
        assert_eq!(network_magic(MAINNET_NETWORK_ID), [0x01, 0xff, 0xf0, 0x00]);
        assert_eq!(network_magic(TESTNET_NETWORK_ID), [0x75, 0x9a, 0x83, 0x74]);
    }

    #[test]
    fn test_genesis_path() {
        let path = genesis_path(Path::new("/data"), 1905960821);
        assert_eq!(path, PathBuf::from("/data/genesis.1905960821"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_genesis_hex("zz").is_err());
        assert!(parse_genesis_hex("").is_err());
        assert!(parse_genesis_hex("01000000").is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_genesis(dir.path(), 7).unwrap_err();
        assert!(format!("{:#}", err).contains("unable to read genesis file"));
    }
}
