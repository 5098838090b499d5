//! # pqlab -- post-quantum cryptography lab
//!
//! Runs classical and post-quantum algorithms through one uniform harness,
//! records the timing and outcome of every operation, and turns the
//! records into performance, security and comparison reports.
//!
//! ## Security Properties
//!
//! - **`#![forbid(unsafe_code)]`**: No `unsafe` blocks anywhere in pqlab.
//! - **No panics on bad input**: primitive failures become failed records;
//!   caller errors are typed ([`errors::LabError`]).
//! - **Key hygiene**: private key bytes are zeroized on drop and never
//!   logged or serialized.
//! - **Bounded file input**: config and store files are symlink-checked
//!   and size-bounded via [`fs_guard::read_validated`].
//! - **Honest naming**: Kyber, Dilithium and Falcon are size-faithful
//!   stand-ins and are labelled as such in their descriptors. RSA, ECC and
//!   AES use the `RustCrypto` crates (pure Rust, no FFI).
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`crypto`] | Descriptors, catalog, capability traits, providers |
//! | [`records`] | Test and report records |
//! | [`store`] | Owner-scoped record persistence |
//! | [`harness`] | Timed execution of one operation |
//! | [`comparison`] | Key generation, encryption, decryption triad across algorithms |
//! | [`report`] | Performance, security and comparison reports |
//! | [`analytics`] | Statistics, trends and export |
//! | [`lab`] | Facade wiring catalog, store and engines |
//! | [`config`] | Config loading and defaults |
//! | [`logging`] | `tracing` subscriber setup |

/// Algorithm abstraction: descriptors and families, the catalog, the
/// `CryptoAlgorithm` / `Encryptor` / `Signer` traits, envelopes, and the
/// RSA, ECC, AES, Kyber, Dilithium and Falcon providers.
pub mod crypto;

/// Test records, report records and the enums naming their kinds.
pub mod records;

/// Record store contract with in-memory and JSON-file backends. Every read
/// and delete is scoped to an owner.
pub mod store;

/// Times exactly one primitive call and folds the result, success or
/// failure, into a test record.
pub mod harness;

/// Runs the key generation, encryption, decryption triad over several
/// algorithms with identical input.
pub mod comparison;

/// Aggregates an owner's records into performance, security and comparison
/// reports.
pub mod report;

/// Test statistics, per-algorithm performance trends and JSON export.
pub mod analytics;

/// `Lab` facade used by the binary and by embedders.
pub mod lab;

/// Caller-level error taxonomy.
pub mod errors;

/// `pqlab.json` config with secure defaults.
pub mod config;

/// Structured logging setup.
pub mod logging;

/// Symlink-safe, size-bounded file reads and atomic writes. Single source of
/// truth for file I/O in pqlab.
pub mod fs_guard;
