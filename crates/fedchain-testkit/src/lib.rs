//! # Fedchain Testkit
//!
//! Testing utilities for fedchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known inputs with expected hashes, keys and colour ids
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A federation with seeded keys, signed genesis and child headers
//!
//! ## Golden Vectors
//!
//! Golden vectors pin consensus encoding across implementations:
//!
//! ```rust
//! use fedchain_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, computed) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, computed);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use fedchain_testkit::generators::{HeaderParams, header_from_params};
//!
//! proptest! {
//!     #[test]
//!     fn block_hash_is_deterministic(params: HeaderParams) {
//!         let h1 = header_from_params(&params);
//!         let h2 = header_from_params(&params);
//!         prop_assert_eq!(h1.block_hash(), h2.block_hash());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use fedchain_testkit::fixtures::FederationFixture;
//!
//! let fixture = FederationFixture::new();
//! let headers = fixture.make_chain(10, 0);
//! assert_eq!(headers[0].header().prev_block, fixture.genesis_hash());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{seeded_keypair, FederationFixture};
pub use generators::{header_from_params, signed_header_from_params, HeaderParams};
pub use vectors::{all_vectors, compute_vector, verify_all_vectors, GoldenVector, VectorKind};
