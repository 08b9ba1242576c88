//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the consensus encoding and hashing so that every
//! implementation produces identical bytes, hashes and colour ids.

use serde::Serialize;

use fedchain_core::wire::Reader;
use fedchain_core::{
    validate_genesis, BlockHeader, ColorIdentifier, CoreError, Decode, Encode, Hash256, OutPoint, XField,
};

/// Testnet genesis block (network id 1939510133).
pub const TESTNET_GENESIS: &str = "01000000000000000000000000000000000000000000000000000000000000000000000044cc181bd0e95c5b999a13d1fc0d193fa8223af97511ad2098217555a841b3518f18ec2536f0bb9d6d4834fcc712e9563840fe9f089db9e8fe890bffb82165849f52ba5e01210366262690cbdf648132ce0c088962c6361112582364ede120f3780ab73438fc4b402b1ed9996920f57a425f6f9797557c0e73d0c9fbafdebcaa796b136e0946ffa98d928f8130b6a572f83da39530b13784eeb7007465b673aa95091619e7ee208501010000000100000000000000000000000000000000000000000000000000000000000000000000000000ffffffff0100f2052a010000002776a92231415132437447336a686f37385372457a4b6533766636647863456b4a74356e7a4188ac00000000";

/// Genesis block used by block-assembly benchmarks.
pub const BENCH_GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000002b5331139c6bc8646bb4e5737c51378133f70b9712b75548cb3c05f9188670e7440d295e7300c5640730c4634402a3e66fb5d921f76b48d8972a484cc0361e660f288661012103af80b90d25145da28c583359beb47b21796b2fe1a23c1511e443e7a64dfdb27d40214f99266b9f569fbff5fdd9fff78bbdf258fafd79f5df2578030914f58913a6ecaf0a1564223a3366be20da378aa3555bdc961b1a09ae966f21d3c0c8eaddc201010000000100000000000000000000000000000000000000000000000000000000000000000000000000ffffffff0100f2052a010000001976a91445d405b9ed450fec89044f9b7a99a4ef6fe2cd3f88ac00000000";

/// Header with an aggregate key xfield and a one-byte proof.
pub const KEY_HEADER: &str = "010000000000000000000000000000000000000000000000000000000000000000000000f007d2a56dbebbc2a04346e624f7dff2ee0605d6ffe9622569193fddbc9280dcf007d2a56dbebbc2a04346e624f7dff2ee0605d6ffe9622569193fddbc9280dc981a335c0121025700236c2890233592fcef262f4520d22af9160e3d9705855140eb2aa06c35d30147";

/// What a vector's input is and which output it pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorKind {
    /// Serialized xfield -> payload rendering.
    XFieldValue,
    /// Serialized header (or block) -> signing hash, display order.
    SigningHash,
    /// Serialized header (or block) -> block hash, display order.
    BlockHash,
    /// Serialized genesis block -> aggregate key, after genesis validation.
    GenesisKey,
    /// Script -> reissuable colour id.
    ColorFromScript,
    /// `txid:index` with txid in internal order -> non-reissuable colour id.
    ColorFromOutPoint,
}

/// A golden test vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub kind: VectorKind,
    /// Input, hex unless the kind says otherwise.
    pub input: &'static str,
    /// Expected output.
    pub expected: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "max block size xfield",
            kind: VectorKind::XFieldValue,
            input: "0220a10700",
            expected: "500000",
        },
        GoldenVector {
            name: "aggregate key xfield",
            kind: VectorKind::XFieldValue,
            input: "0121025700236c2890233592fcef262f4520d22af9160e3d9705855140eb2aa06c35d3",
            expected: "025700236c2890233592fcef262f4520d22af9160e3d9705855140eb2aa06c35d3",
        },
        GoldenVector {
            name: "empty xfield",
            kind: VectorKind::XFieldValue,
            input: "00",
            expected: "",
        },
        GoldenVector {
            name: "key header signing hash",
            kind: VectorKind::SigningHash,
            input: KEY_HEADER,
            expected: "1380cdf2310273eb455535e216d3021b4b5c0d627ae3dab09042c413871bc757",
        },
        GoldenVector {
            name: "key header block hash",
            kind: VectorKind::BlockHash,
            input: KEY_HEADER,
            expected: "a70d1ed990b5387c65cdcbc1661e0db39a0f0431b56a3a203198c3edbce69bd3",
        },
        GoldenVector {
            name: "testnet genesis signing hash",
            kind: VectorKind::SigningHash,
            input: TESTNET_GENESIS,
            expected: "5aa594a7ffdf7ed94a23cee2e0df78632c622ef6befc4beeea5655daf5c053e3",
        },
        GoldenVector {
            name: "testnet genesis block hash",
            kind: VectorKind::BlockHash,
            input: TESTNET_GENESIS,
            expected: "038b114875c2f78f5a2fd7d8549a905f38ea5faee6e29a3d79e547151d6bdd8a",
        },
        GoldenVector {
            name: "testnet genesis key",
            kind: VectorKind::GenesisKey,
            input: TESTNET_GENESIS,
            expected: "0366262690cbdf648132ce0c088962c6361112582364ede120f3780ab73438fc4b",
        },
        GoldenVector {
            name: "bench genesis signing hash",
            kind: VectorKind::SigningHash,
            input: BENCH_GENESIS,
            expected: "e473cc8a5dc543b5991bcad12517e246cfa9189513ec139bd248c87a0d96f62b",
        },
        GoldenVector {
            name: "bench genesis block hash",
            kind: VectorKind::BlockHash,
            input: BENCH_GENESIS,
            expected: "67ed7729ea3fcadce385d3718bec2882f5305518c4be8c90e21775797e7a2853",
        },
        GoldenVector {
            name: "bench genesis key",
            kind: VectorKind::GenesisKey,
            input: BENCH_GENESIS,
            expected: "03af80b90d25145da28c583359beb47b21796b2fe1a23c1511e443e7a64dfdb27d",
        },
        GoldenVector {
            name: "colour from key push script",
            kind: VectorKind::ColorFromScript,
            input: "21038282263212c609d9ea2a6e3e172de238d8c39cabd5ac1ca10646e23fd5f51508",
            expected: "c1f55efb77e5a0e37c16d8f3484024558241c215a57aa991533152813f111482f6",
        },
        GoldenVector {
            name: "colour from 32-byte push script",
            kind: VectorKind::ColorFromScript,
            input: "208282263212c609d9ea2a6e3e172de238d8c39cabd5ac1ca10646e23fd5f51508",
            expected: "c1fbe3ee97afc4c33b99f7c8c012b886d7987980b588aa71780e736eb02a2b25a7",
        },
        GoldenVector {
            name: "colour from outpoint",
            kind: VectorKind::ColorFromOutPoint,
            input: "485273f6703f038a234400edadb543eb44b4af5372e8b207990beebc386e7954:0",
            expected: "c29608951ee23595caa227e7668e39f9d3525a39e9dc30d7391f138576c07be84d",
        },
    ]
}

fn decode_hex(s: &str) -> Result<Vec<u8>, CoreError> {
    hex::decode(s).map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Decode a header that may be followed by block transactions.
fn header_prefix(bytes: &[u8]) -> Result<BlockHeader, CoreError> {
    BlockHeader::decode(&mut Reader::new(bytes))
}

/// Compute the output a vector pins.
pub fn compute_vector(vector: &GoldenVector) -> Result<String, CoreError> {
    match vector.kind {
        VectorKind::XFieldValue => {
            let xfield = XField::from_bytes(&decode_hex(vector.input)?)?;
            Ok(xfield.value_string())
        }
        VectorKind::SigningHash => Ok(header_prefix(&decode_hex(vector.input)?)?.signing_hash().to_string()),
        VectorKind::BlockHash => Ok(header_prefix(&decode_hex(vector.input)?)?.block_hash().to_string()),
        VectorKind::GenesisKey => {
            let genesis = header_prefix(&decode_hex(vector.input)?)?;
            let key = validate_genesis(&genesis).map_err(|e| CoreError::DecodingError(e.to_string()))?;
            Ok(key.to_hex())
        }
        VectorKind::ColorFromScript => {
            Ok(ColorIdentifier::from_script(&decode_hex(vector.input)?).to_hex_string())
        }
        VectorKind::ColorFromOutPoint => {
            let (txid, index) = vector
                .input
                .split_once(':')
                .ok_or_else(|| CoreError::DecodingError("expected txid:index".into()))?;
            let txid = Hash256::from_hex(txid).map_err(|e| CoreError::DecodingError(e.to_string()))?;
            let index = index
                .parse::<u32>()
                .map_err(|e| CoreError::DecodingError(e.to_string()))?;
            Ok(hex::encode(ColorIdentifier::from_outpoint(&OutPoint::new(txid, index)).encode()))
        }
    }
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, computed)` per vector; `computed` holds the
/// error message when the input fails to decode.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match compute_vector(v) {
            Ok(out) => (v.name.to_string(), out == v.expected, out),
            Err(e) => (v.name.to_string(), false, e.to_string()),
        })
        .collect()
}

/// All vectors as pretty JSON, for other implementations to consume.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, computed) in verify_all_vectors() {
            assert!(matches, "vector '{}' computed {}", name, computed);
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_corrupted_vector_reports_mismatch() {
        let mut v = all_vectors().remove(0);
        v.input = "0320a10700";
        assert!(compute_vector(&v).is_err());
    }

    #[test]
    fn test_vectors_json() {
        let json = vectors_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), all_vectors().len());
        assert_eq!(parsed[0]["kind"], "x_field_value");
    }
}
