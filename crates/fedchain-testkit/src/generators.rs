//! Proptest generators for property-based testing.

use proptest::prelude::*;

use fedchain_core::wire::write_var_bytes;
use fedchain_core::{
    BlockHeader, BlockHeaderBuilder, BlockHeaderWithoutProof, ColorIdentifier, Decode, Encode, Hash256,
    Keypair, OutPoint, TokenType, XField,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_filter_map("secret key out of range", |seed| {
        Keypair::from_secret_bytes(&seed).ok()
    })
}

/// Generate a random Hash256.
pub fn hash256() -> impl Strategy<Value = Hash256> {
    any::<[u8; 32]>().prop_map(Hash256::from_bytes)
}

/// Generate a random OutPoint.
pub fn outpoint() -> impl Strategy<Value = OutPoint> {
    (hash256(), any::<u32>()).prop_map(|(txid, index)| OutPoint::new(txid, index))
}

/// Generate an xfield of any type, including invalid payloads.
pub fn xfield() -> impl Strategy<Value = XField> {
    prop_oneof![
        Just(XField::None),
        keypair().prop_map(|kp| XField::agg_pubkey(kp.public_key())),
        any::<u32>().prop_map(XField::MaxBlockSize),
    ]
}

/// Generate a token type.
pub fn token_type() -> impl Strategy<Value = TokenType> {
    prop_oneof![
        Just(TokenType::None),
        Just(TokenType::Reissuable),
        Just(TokenType::NonReissuable),
        Just(TokenType::Nft),
    ]
}

/// Generate a colour identifier of any type.
pub fn color_identifier() -> impl Strategy<Value = ColorIdentifier> {
    (token_type(), any::<[u8; 32]>()).prop_map(|(ty, payload)| ColorIdentifier::from_parts(ty, payload))
}

/// Generate proof bytes of at most `max_len` bytes.
pub fn proof(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Parameters for generating a header.
#[derive(Debug, Clone)]
pub struct HeaderParams {
    pub features: i32,
    pub prev_block: Hash256,
    pub merkle_root: Hash256,
    pub im_merkle_root: Hash256,
    pub time: u32,
    pub xfield: XField,
}

impl Arbitrary for HeaderParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<i32>(),
            hash256(),
            hash256(),
            hash256(),
            any::<u32>(),
            xfield(),
        )
            .prop_map(|(features, prev_block, merkle_root, im_merkle_root, time, xfield)| HeaderParams {
                features,
                prev_block,
                merkle_root,
                im_merkle_root,
                time,
                xfield,
            })
            .boxed()
    }
}

fn builder_from_params(params: &HeaderParams) -> BlockHeaderBuilder {
    BlockHeaderBuilder::new(params.prev_block)
        .features(params.features)
        .merkle_root(params.merkle_root)
        .im_merkle_root(params.im_merkle_root)
        .time(params.time)
        .xfield(params.xfield.clone())
}

/// Generate an unsigned header from parameters.
pub fn header_from_params(params: &HeaderParams) -> BlockHeader {
    builder_from_params(params).build()
}

/// Attach arbitrary proof bytes without verifying them.
///
/// Goes through the wire encoding, the only path that accepts an
/// unverified proof.
pub fn header_with_proof(unsigned: &BlockHeaderWithoutProof, proof: &[u8]) -> BlockHeader {
    let mut bytes = unsigned.encode();
    write_var_bytes(proof, &mut bytes);
    BlockHeader::from_bytes(&bytes).expect("encoded header decodes")
}

/// Generate a header signed by `keypair`.
pub fn signed_header_from_params(params: &HeaderParams, keypair: &Keypair) -> BlockHeader {
    builder_from_params(params).sign(keypair)
}
