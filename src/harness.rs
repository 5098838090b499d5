//! Test harness: executes one operation against one algorithm instance,
//! times the primitive, and folds the outcome into a [`TestRecord`].
//!
//! The harness is total. Every call ends in a well-formed record; primitive
//! failures become `succeeded = false` with the error text as the reason.
//!
//! Dispatch rules:
//!
//! - `encryption` against a signature-only family is remapped to `signing`
//!   and the record carries the executed kind.
//! - `decryption` first encrypts the input with the same instance, then
//!   decrypts that envelope. Only the decryption is timed.
//! - `verification` first signs the input, then verifies that signature.
//!   Only the verification is timed.
//! - Lazy key generation inside a timed encrypt or sign is part of the
//!   measurement.

use std::time::Instant;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::crypto::{CipherEnvelope, CryptoAlgorithm, CryptoError, KeySizes, SignatureEnvelope};
use crate::records::{OperationKind, TestContext, TestRecord};

/// Failure reason recorded when a verification returns `false`.
pub const VERIFICATION_FAILED: &str = "signature verification failed";

/// What a successful primitive call produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    /// Key generation: artifact lengths only.
    KeySizes(KeySizes),
    /// Encryption envelope.
    Cipher(CipherEnvelope),
    /// Recovered plaintext (lossy UTF-8).
    Plaintext(String),
    /// Signature envelope.
    Signature(SignatureEnvelope),
    /// Verification verdict.
    Verified(bool),
}

impl OperationOutput {
    /// The string persisted as the record's output payload.
    pub fn to_payload(&self) -> Result<String, CryptoError> {
        match self {
            Self::KeySizes(sizes) => Ok(serde_json::json!(sizes).to_string()),
            Self::Cipher(env) => env.to_json(),
            Self::Plaintext(text) => Ok(text.clone()),
            Self::Signature(env) => env.to_json(),
            Self::Verified(v) => Ok(serde_json::json!({ "verified": v }).to_string()),
        }
    }
}

/// A timed primitive call.
pub(crate) struct Measured<T> {
    pub(crate) elapsed_millis: f64,
    pub(crate) value: T,
}

/// Runs `f`, measuring wall-clock time in fractional milliseconds.
pub(crate) fn measure<T>(f: impl FnOnce() -> T) -> Measured<T> {
    let start = Instant::now();
    let value = f();
    Measured {
        elapsed_millis: start.elapsed().as_secs_f64() * 1000.0,
        value,
    }
}

/// A record plus the typed result it was folded from.
#[derive(Debug)]
pub struct TestOutcome {
    /// The record, as persisted.
    pub record: TestRecord,
    /// The primitive's result.
    pub result: Result<OperationOutput, CryptoError>,
}

/// Invocation surface: `{algorithm, operation, input}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRequest {
    /// Catalog name.
    pub algorithm: String,
    /// Requested operation (may be remapped).
    pub operation: OperationKind,
    /// Input payload.
    pub input: String,
}

/// Stateless executor.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestHarness;

impl TestHarness {
    /// Creates a harness.
    pub fn new() -> Self {
        Self
    }

    /// Executes `requested` and returns the record.
    pub fn run(
        &self,
        algorithm: &mut dyn CryptoAlgorithm,
        owner_id: &str,
        requested: OperationKind,
        input: &str,
    ) -> TestRecord {
        self.execute(algorithm, owner_id, requested, input).record
    }

    /// Executes `requested` and returns the record with the typed result.
    pub fn execute(
        &self,
        algorithm: &mut dyn CryptoAlgorithm,
        owner_id: &str,
        requested: OperationKind,
        input: &str,
    ) -> TestOutcome {
        let descriptor = algorithm.descriptor().clone();
        let operation = effective_operation(algorithm, requested);
        if operation != requested {
            info!(
                algorithm = %descriptor.name,
                requested = %requested,
                executed = %operation,
                "signature-only family: encryption remapped to signing"
            );
        }

        let measured = dispatch(algorithm, operation, input.as_bytes()).unwrap_or_else(|e| {
            Measured {
                elapsed_millis: 0.0,
                value: Err(e),
            }
        });

        let (succeeded, output_payload, failure_reason) = match &measured.value {
            Ok(out @ OperationOutput::Verified(false)) => (
                false,
                out.to_payload().ok(),
                Some(VERIFICATION_FAILED.to_string()),
            ),
            Ok(out) => match out.to_payload() {
                Ok(payload) => (true, Some(payload), None),
                Err(e) => (false, None, Some(e.to_string())),
            },
            Err(e) => (false, None, Some(e.to_string())),
        };

        debug!(
            algorithm = %descriptor.name,
            operation = %operation,
            elapsed_ms = measured.elapsed_millis,
            succeeded,
            "harness run finished"
        );

        TestOutcome {
            record: TestRecord {
                id: Uuid::new_v4(),
                owner_id: owner_id.to_string(),
                algorithm_name: descriptor.name.clone(),
                operation,
                input_payload: input.to_string(),
                output_payload,
                elapsed_millis: measured.elapsed_millis,
                succeeded,
                failure_reason,
                context: TestContext::from(&descriptor),
                timestamp: OffsetDateTime::now_utc(),
            },
            result: measured.value,
        }
    }
}

fn effective_operation(algorithm: &dyn CryptoAlgorithm, requested: OperationKind) -> OperationKind {
    let family = algorithm.descriptor().family;
    if requested == OperationKind::Encryption && family.is_signature_only() {
        OperationKind::Signing
    } else {
        requested
    }
}

/// Preparatory failures (capability lookup, the untimed encrypt or sign)
/// surface as `Err`; failures of the timed primitive live inside `Measured`.
fn dispatch(
    algorithm: &mut dyn CryptoAlgorithm,
    operation: OperationKind,
    input: &[u8],
) -> Result<Measured<Result<OperationOutput, CryptoError>>, CryptoError> {
    Ok(match operation {
        OperationKind::KeyGeneration => measure(|| {
            algorithm
                .generate_keys()
                .map(|keys| OperationOutput::KeySizes(keys.sizes()))
        }),
        OperationKind::Encryption => {
            let enc = algorithm.encryptor()?;
            measure(|| enc.encrypt(input).map(OperationOutput::Cipher))
        }
        OperationKind::Decryption => {
            let enc = algorithm.encryptor()?;
            let envelope = enc.encrypt(input)?;
            measure(|| {
                enc.decrypt(&envelope)
                    .map(|plain| OperationOutput::Plaintext(String::from_utf8_lossy(&plain).into_owned()))
            })
        }
        OperationKind::Signing => {
            let signer = algorithm.signer()?;
            measure(|| signer.sign(input).map(OperationOutput::Signature))
        }
        OperationKind::Verification => {
            let signer = algorithm.signer()?;
            let envelope = signer.sign(input)?;
            measure(|| signer.verify(input, &envelope).map(OperationOutput::Verified))
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::crypto::registry::default_catalog;
    use crate::crypto::{AlgorithmDescriptor, Family};
    use crate::crypto::providers::instantiate;

    fn alg(name: &str) -> Box<dyn CryptoAlgorithm> {
        default_catalog().instantiate(name).unwrap()
    }

    #[test]
    fn aes_encryption_record_decrypts_back() {
        let mut aes = alg("AES-256");
        let outcome = TestHarness::new().execute(
            aes.as_mut(),
            "alice",
            OperationKind::Encryption,
            "Hello, Quantum World!",
        );
        let record = &outcome.record;
        assert!(record.succeeded, "{:?}", record.failure_reason);
        assert_eq!(record.operation, OperationKind::Encryption);
        assert!(record.elapsed_millis > 0.0);
        assert_eq!(record.context.security_parameter, 256);

        let env = CipherEnvelope::from_json(record.output_payload.as_deref().unwrap()).unwrap();
        let plain = aes.encryptor().unwrap().decrypt(&env).unwrap();
        assert_eq!(plain, b"Hello, Quantum World!");
    }

    #[test]
    fn encryption_on_signature_family_is_remapped() {
        let mut dilithium = alg("Dilithium-2");
        let record =
            TestHarness::new().run(dilithium.as_mut(), "alice", OperationKind::Encryption, "m");
        assert_eq!(record.operation, OperationKind::Signing);
        assert!(record.succeeded);
        let env = SignatureEnvelope::from_json(record.output_payload.as_deref().unwrap()).unwrap();
        assert_eq!(env.algorithm, "Dilithium");
    }

    #[test]
    fn capability_mismatch_becomes_failed_record() {
        let mut aes = alg("AES-128");
        let record = TestHarness::new().run(aes.as_mut(), "alice", OperationKind::Signing, "m");
        assert!(!record.succeeded);
        assert_eq!(record.output_payload, None);
        assert_eq!(record.elapsed_millis, 0.0);
        assert!(record.failure_reason.unwrap().contains("signing"));

        let mut falcon = alg("Falcon-512");
        let record =
            TestHarness::new().run(falcon.as_mut(), "alice", OperationKind::Decryption, "m");
        assert!(!record.succeeded);
        assert_eq!(record.operation, OperationKind::Decryption);
    }

    #[test]
    fn key_generation_records_sizes_only() {
        let mut kyber = alg("Kyber-768");
        let record =
            TestHarness::new().run(kyber.as_mut(), "alice", OperationKind::KeyGeneration, "");
        assert!(record.succeeded);
        let payload: serde_json::Value =
            serde_json::from_str(record.output_payload.as_deref().unwrap()).unwrap();
        assert_eq!(payload["public_key_size"], 1184);
        assert_eq!(payload["private_key_size"], 2400);
    }

    #[test]
    fn decryption_round_trips_through_same_instance() {
        let mut ecc = alg("ECC-P256");
        let outcome =
            TestHarness::new().execute(ecc.as_mut(), "alice", OperationKind::Decryption, "hello ");
        assert!(outcome.record.succeeded);
        // Space padding is stripped on decrypt.
        assert_eq!(outcome.record.output_payload.as_deref(), Some("hello"));
        match outcome.result {
            Ok(OperationOutput::Plaintext(text)) => assert_eq!(text, "hello"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn verification_of_fresh_signature_succeeds() {
        let mut falcon = alg("Falcon-1024");
        let record =
            TestHarness::new().run(falcon.as_mut(), "alice", OperationKind::Verification, "m");
        assert!(record.succeeded);
        assert_eq!(record.output_payload.as_deref(), Some(r#"{"verified":true}"#));
    }

    #[test]
    fn harness_is_total_for_every_family_and_operation() {
        let small_rsa = AlgorithmDescriptor::new("RSA-1024", Family::Rsa, 1024, false, "test");
        let mut algorithms: Vec<Box<dyn CryptoAlgorithm>> = vec![instantiate(&small_rsa).unwrap()];
        for name in ["ECC-P384", "AES-128", "Kyber-512", "Dilithium-3", "Falcon-512"] {
            algorithms.push(alg(name));
        }
        for algorithm in &mut algorithms {
            for kind in OperationKind::ALL {
                let record = TestHarness::new().run(algorithm.as_mut(), "alice", kind, "input");
                assert_eq!(record.succeeded, record.failure_reason.is_none());
                assert_eq!(record.algorithm_name, algorithm.descriptor().name);
            }
        }
    }
}
