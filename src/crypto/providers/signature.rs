//! Dilithium- and Falcon-style signature stand-ins.
//!
//! Both families emit random artifacts of the sizes the real schemes use.
//! A signature is random bytes of the level's signature length plus the
//! SHA-256 digest of the message. Verification is structural: the envelope
//! must name this scheme, carry a signature of the right length, and bind
//! the digest of the message being verified. Nothing here is unforgeable.

use crate::crypto::algorithm::{AlgorithmDescriptor, Family};
use crate::crypto::envelope::SignatureEnvelope;
use crate::crypto::errors::CryptoError;
use crate::crypto::{random_bytes, unb64, CryptoAlgorithm, KeyMaterial, Signer};

/// Artifact lengths for one parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureSizes {
    /// Public key bytes.
    pub public_key: usize,
    /// Private key bytes.
    pub private_key: usize,
    /// Signature bytes.
    pub signature: usize,
}

const fn sizes(public_key: usize, private_key: usize, signature: usize) -> SignatureSizes {
    SignatureSizes {
        public_key,
        private_key,
        signature,
    }
}

/// Size table lookup. `None` for a family without signatures or an unknown
/// level.
pub fn signature_sizes(family: Family, level: u32) -> Option<SignatureSizes> {
    match (family, level) {
        (Family::Dilithium, 2) => Some(sizes(1312, 2528, 2420)),
        (Family::Dilithium, 3) => Some(sizes(1952, 4000, 3293)),
        (Family::Dilithium, 5) => Some(sizes(2592, 4864, 4595)),
        (Family::Falcon, 512) => Some(sizes(897, 1281, 690)),
        (Family::Falcon, 1024) => Some(sizes(1793, 2305, 1330)),
        _ => None,
    }
}

/// Signature stand-in instance for either lattice family.
pub struct LatticeSignatureStandIn {
    descriptor: AlgorithmDescriptor,
    sizes: SignatureSizes,
    keys: Option<KeyMaterial>,
}

impl LatticeSignatureStandIn {
    /// Accepts Dilithium levels 2/3/5 and Falcon 512/1024.
    pub fn new(descriptor: AlgorithmDescriptor) -> Result<Self, CryptoError> {
        let sizes = signature_sizes(descriptor.family, descriptor.security_parameter).ok_or(
            CryptoError::InvalidParameter {
                family: descriptor.family,
                parameter: descriptor.security_parameter,
            },
        )?;
        Ok(Self {
            descriptor,
            sizes,
            keys: None,
        })
    }

    /// Scheme label written into envelopes.
    pub fn label(&self) -> &'static str {
        match self.descriptor.family {
            Family::Falcon => "Falcon",
            _ => "Dilithium",
        }
    }
}

impl CryptoAlgorithm for LatticeSignatureStandIn {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn generate_keys(&mut self) -> Result<&KeyMaterial, CryptoError> {
        let rng_err = |e: rand_core::Error| CryptoError::KeyGeneration(format!("RNG failure: {e}"));
        let public = random_bytes(self.sizes.public_key).map_err(rng_err)?;
        let private = random_bytes(self.sizes.private_key).map_err(rng_err)?;
        Ok(self.keys.insert(KeyMaterial::new(public, private)))
    }

    fn key_material(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref()
    }

    fn as_signer(&mut self) -> Option<&mut dyn Signer> {
        Some(self)
    }
}

impl Signer for LatticeSignatureStandIn {
    fn sign(&mut self, message: &[u8]) -> Result<SignatureEnvelope, CryptoError> {
        if self.keys.is_none() {
            self.generate_keys()?;
        }
        let signature = random_bytes(self.sizes.signature)
            .map_err(|e| CryptoError::Signing(format!("RNG failure: {e}")))?;
        Ok(SignatureEnvelope::new(self.label(), &signature, message))
    }

    fn verify(&self, message: &[u8], signature: &SignatureEnvelope) -> Result<bool, CryptoError> {
        signature.require_fields()?;
        if self.keys.is_none() {
            return Err(CryptoError::MissingKey {
                family: self.descriptor.family,
                operation: "verify",
            });
        }
        let raw = unb64("signature", &signature.signature)?;
        Ok(signature.algorithm == self.label()
            && raw.len() == self.sizes.signature
            && signature.binds(message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::b64;

    fn stand_in(family: Family, level: u32) -> LatticeSignatureStandIn {
        LatticeSignatureStandIn::new(AlgorithmDescriptor::new(
            format!("{family}-{level}"),
            family,
            level,
            true,
            "test",
        ))
        .unwrap()
    }

    #[test]
    fn sizes_follow_tables() {
        for (family, level, sig_len) in [
            (Family::Dilithium, 2, 2420),
            (Family::Dilithium, 3, 3293),
            (Family::Dilithium, 5, 4595),
            (Family::Falcon, 512, 690),
            (Family::Falcon, 1024, 1330),
        ] {
            let mut alg = stand_in(family, level);
            let env = alg.sign(b"m").unwrap();
            assert_eq!(unb64("signature", &env.signature).unwrap().len(), sig_len);
            let expected = signature_sizes(family, level).unwrap();
            let keys = alg.key_material().unwrap().sizes();
            assert_eq!(keys.public_key_size, expected.public_key);
            assert_eq!(keys.private_key_size, expected.private_key);
        }
    }

    #[test]
    fn verify_accepts_own_signature() {
        let mut alg = stand_in(Family::Dilithium, 2);
        let env = alg.sign(b"Hello, Quantum World!").unwrap();
        assert_eq!(env.algorithm, "Dilithium");
        assert!(alg.verify(b"Hello, Quantum World!", &env).unwrap());
    }

    #[test]
    fn tampered_envelopes_return_false() {
        let mut alg = stand_in(Family::Falcon, 512);
        let env = alg.sign(b"payload").unwrap();

        assert!(!alg.verify(b"payload?", &env).unwrap());

        let mut short = env.clone();
        short.signature = b64(&[0u8; 10]);
        assert!(!alg.verify(b"payload", &short).unwrap());

        let mut relabeled = env.clone();
        relabeled.algorithm = "Dilithium".into();
        assert!(!alg.verify(b"payload", &relabeled).unwrap());

        let mut rehashed = env;
        rehashed.message_hash = b64(&[0u8; 32]);
        assert!(!alg.verify(b"payload", &rehashed).unwrap());
    }

    #[test]
    fn missing_fields_are_an_envelope_error() {
        let mut alg = stand_in(Family::Falcon, 1024);
        let mut env = alg.sign(b"m").unwrap();
        env.message_hash.clear();
        assert!(matches!(
            alg.verify(b"m", &env),
            Err(CryptoError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn encryption_is_a_capability_mismatch() {
        let mut alg = stand_in(Family::Dilithium, 3);
        let err = alg.encryptor().err().unwrap();
        assert_eq!(err.kind(), "capability_mismatch");
        assert!(err.to_string().contains("signature-only"));
    }

    #[test]
    fn unknown_level_rejected() {
        let d = AlgorithmDescriptor::new("Dilithium-4", Family::Dilithium, 4, true, "");
        assert!(LatticeSignatureStandIn::new(d).is_err());
        assert!(signature_sizes(Family::Aes, 256).is_none());
    }
}
