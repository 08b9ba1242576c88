//! JSON views used by RPC handlers.

use serde::Serialize;
use serde_json::{json, Map, Value};

use fedchain_core::{BlockHeader, XField, XFieldHistory, XFieldType};

/// Summary of every recorded change, keyed by the RPC name of its type.
///
/// Keys map hex to activation height; sizes map the decimal size to it:
///
/// ```json
/// {
///   "aggregatePubkeys": [{"0257...35d3": 0}],
///   "blockSizeChanges": [{"1000000": 0}]
/// }
/// ```
pub fn xfield_changes_json(history: &XFieldHistory) -> Value {
    let mut out = Map::new();
    for ty in XFieldType::TRACKED {
        let entries: Vec<Value> = history
            .changes(ty)
            .iter()
            .map(|change| json!({ change.value.value_string(): change.height }))
            .collect();
        out.insert(ty.rpc_name().to_string(), Value::Array(entries));
    }
    Value::Object(out)
}

/// Header fields as reported by `getblockheader`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeaderView {
    pub hash: String,
    pub features: i32,
    pub features_hex: String,
    pub previousblockhash: Option<String>,
    pub merkleroot: String,
    pub immerkleroot: String,
    pub time: u32,
    pub xfield_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xfield: Option<String>,
    pub proof: String,
}

impl From<&BlockHeader> for BlockHeaderView {
    fn from(header: &BlockHeader) -> Self {
        let inner = header.header();
        let xfield = match &inner.xfield {
            XField::None => None,
            other => Some(other.value_string()),
        };
        Self {
            hash: header.block_hash().to_string(),
            features: inner.features,
            features_hex: format!("{:08x}", inner.features),
            previousblockhash: (!inner.prev_block.is_zero()).then(|| inner.prev_block.to_string()),
            merkleroot: inner.merkle_root.to_string(),
            immerkleroot: inner.im_merkle_root.to_string(),
            time: inner.time,
            xfield_type: inner.xfield.xfield_type().as_u8(),
            xfield,
            proof: hex::encode(header.proof()),
        }
    }
}
