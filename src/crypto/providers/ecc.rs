//! Elliptic-curve family: ECDSA signing and ECDH hybrid encryption over
//! NIST P-256 or P-384.
//!
//! Hybrid encryption generates an ephemeral key pair, agrees a secret with the
//! recipient's static key, takes SHA-256 of the shared secret as an AES-256
//! key, and encrypts under CBC with a random IV. The plaintext is padded with
//! ASCII spaces to the block boundary (a full block of spaces when already
//! aligned) and decryption strips all trailing spaces, so a plaintext that
//! ends in spaces does not round-trip exactly.
//!
//! Signatures are ECDSA over the SHA-256 digest of the message on both curves,
//! stored in fixed-size `r || s` form.

use crate::crypto::algorithm::{AlgorithmDescriptor, Family};
use crate::crypto::envelope::{CipherEnvelope, HybridEnvelope, SignatureEnvelope};
use crate::crypto::errors::CryptoError;
use crate::crypto::providers::aes::{cbc_decrypt, cbc_encrypt, NoPadding, IV_LEN};
use crate::crypto::{
    b64, random_bytes, sha256, unb64, CryptoAlgorithm, Encryptor, KeyMaterial, Signer,
};

const PAD_BYTE: u8 = b' ';
const BLOCK_LEN: usize = 16;

/// Supported curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256.
    P256,
    /// NIST P-384.
    P384,
}

impl Curve {
    fn signature_label(self) -> &'static str {
        match self {
            Self::P256 => "ECDSA-P256",
            Self::P384 => "ECDSA-P384",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-curve primitives
// ---------------------------------------------------------------------------

macro_rules! impl_curve_ops {
    ($module:ident, $curve:ident) => {
        mod $module {
            use $curve::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use $curve::ecdsa::{Signature, SigningKey, VerifyingKey};
            use $curve::{ecdh, PublicKey, SecretKey};
            use rand_core::OsRng;

            use crate::crypto::errors::CryptoError;

            /// Returns the secret key with its SEC1 public point and scalar bytes.
            pub(super) fn generate() -> (SecretKey, Vec<u8>, Vec<u8>) {
                let secret = SecretKey::random(&mut OsRng);
                let public = secret.public_key().to_sec1_bytes().to_vec();
                let private = secret.to_bytes().to_vec();
                (secret, public, private)
            }

            /// Ephemeral-static agreement. Returns (shared secret, ephemeral public key).
            pub(super) fn agree_ephemeral(recipient: &SecretKey) -> (Vec<u8>, Vec<u8>) {
                let ephemeral = ecdh::EphemeralSecret::random(&mut OsRng);
                let ephemeral_public = ephemeral.public_key().to_sec1_bytes().to_vec();
                let shared = ephemeral.diffie_hellman(&recipient.public_key());
                (shared.raw_secret_bytes().to_vec(), ephemeral_public)
            }

            /// Static-ephemeral agreement on the recipient side.
            pub(super) fn agree_static(
                secret: &SecretKey,
                peer_sec1: &[u8],
            ) -> Result<Vec<u8>, CryptoError> {
                let peer = PublicKey::from_sec1_bytes(peer_sec1).map_err(|_| {
                    CryptoError::Decryption("ephemeral public key is not a valid curve point".into())
                })?;
                let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
                Ok(shared.raw_secret_bytes().to_vec())
            }

            pub(super) fn sign(secret: &SecretKey, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
                let signature: Signature = SigningKey::from(secret)
                    .sign_prehash(digest)
                    .map_err(|e| CryptoError::Signing(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn verify(secret: &SecretKey, digest: &[u8], signature: &[u8]) -> bool {
                let Ok(signature) = Signature::from_slice(signature) else {
                    return false;
                };
                VerifyingKey::from(&secret.public_key())
                    .verify_prehash(digest, &signature)
                    .is_ok()
            }
        }
    };
}

impl_curve_ops!(p256_ops, p256);
impl_curve_ops!(p384_ops, p384);

enum CurveSecret {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
}

struct EccKeys {
    secret: CurveSecret,
    material: KeyMaterial,
}

// ---------------------------------------------------------------------------
// ECC family
// ---------------------------------------------------------------------------

/// ECC instance supporting both capabilities.
pub struct EccCipher {
    descriptor: AlgorithmDescriptor,
    curve: Curve,
    keys: Option<EccKeys>,
}

impl EccCipher {
    /// Accepts 256 (P-256) and 384 (P-384).
    pub fn new(descriptor: AlgorithmDescriptor) -> Result<Self, CryptoError> {
        let curve = match descriptor.security_parameter {
            256 => Curve::P256,
            384 => Curve::P384,
            parameter => {
                return Err(CryptoError::InvalidParameter {
                    family: Family::Ecc,
                    parameter,
                })
            }
        };
        Ok(Self {
            descriptor,
            curve,
            keys: None,
        })
    }

    /// Curve selected by the security parameter.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    fn ensure_keys(&mut self) -> Result<&EccKeys, CryptoError> {
        if self.keys.is_none() {
            self.generate_keys()?;
        }
        self.keys_for("use")
    }

    fn keys_for(&self, operation: &'static str) -> Result<&EccKeys, CryptoError> {
        self.keys.as_ref().ok_or(CryptoError::MissingKey {
            family: Family::Ecc,
            operation,
        })
    }
}

/// Appends 16 - (len % 16) spaces, always at least one.
fn space_pad(plaintext: &[u8]) -> Vec<u8> {
    let pad = BLOCK_LEN - plaintext.len() % BLOCK_LEN;
    let mut padded = Vec::with_capacity(plaintext.len() + pad);
    padded.extend_from_slice(plaintext);
    padded.resize(plaintext.len() + pad, PAD_BYTE);
    padded
}

fn strip_space_pad(mut data: Vec<u8>) -> Vec<u8> {
    while data.last() == Some(&PAD_BYTE) {
        data.pop();
    }
    data
}

impl CryptoAlgorithm for EccCipher {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn generate_keys(&mut self) -> Result<&KeyMaterial, CryptoError> {
        let (secret, public, private) = match self.curve {
            Curve::P256 => {
                let (sk, public, private) = p256_ops::generate();
                (CurveSecret::P256(sk), public, private)
            }
            Curve::P384 => {
                let (sk, public, private) = p384_ops::generate();
                (CurveSecret::P384(sk), public, private)
            }
        };
        let keys = self.keys.insert(EccKeys {
            secret,
            material: KeyMaterial::new(public, private),
        });
        Ok(&keys.material)
    }

    fn key_material(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref().map(|k| &k.material)
    }

    fn as_encryptor(&mut self) -> Option<&mut dyn Encryptor> {
        Some(self)
    }

    fn as_signer(&mut self) -> Option<&mut dyn Signer> {
        Some(self)
    }
}

impl Encryptor for EccCipher {
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<CipherEnvelope, CryptoError> {
        let keys = self.ensure_keys()?;
        let (shared, ephemeral_public) = match &keys.secret {
            CurveSecret::P256(sk) => p256_ops::agree_ephemeral(sk),
            CurveSecret::P384(sk) => p384_ops::agree_ephemeral(sk),
        };
        let key = zeroize::Zeroizing::new(sha256(&shared));
        let iv = random_bytes(IV_LEN)
            .map_err(|e| CryptoError::Encryption(format!("RNG failure: {e}")))?;
        let ciphertext = cbc_encrypt::<NoPadding>(key.as_slice(), &iv, &space_pad(plaintext))?;
        Ok(CipherEnvelope::EcdhAesCbc(HybridEnvelope {
            ciphertext: b64(&ciphertext),
            iv: b64(&iv),
            ephemeral_public_key: b64(&ephemeral_public),
        }))
    }

    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<Vec<u8>, CryptoError> {
        let keys = self.keys_for("decrypt")?;
        let CipherEnvelope::EcdhAesCbc(env) = envelope else {
            return Err(envelope.unexpected("ecdh-aes-cbc"));
        };
        let ephemeral_public = unb64("ephemeral_public_key", &env.ephemeral_public_key)?;
        let iv = unb64("iv", &env.iv)?;
        let ciphertext = unb64("ciphertext", &env.ciphertext)?;
        let shared = match &keys.secret {
            CurveSecret::P256(sk) => p256_ops::agree_static(sk, &ephemeral_public)?,
            CurveSecret::P384(sk) => p384_ops::agree_static(sk, &ephemeral_public)?,
        };
        let key = zeroize::Zeroizing::new(sha256(&shared));
        let padded = cbc_decrypt::<NoPadding>(key.as_slice(), &iv, &ciphertext)?;
        Ok(strip_space_pad(padded))
    }
}

impl Signer for EccCipher {
    fn sign(&mut self, message: &[u8]) -> Result<SignatureEnvelope, CryptoError> {
        let label = self.curve.signature_label();
        let keys = self.ensure_keys()?;
        let digest = sha256(message);
        let signature = match &keys.secret {
            CurveSecret::P256(sk) => p256_ops::sign(sk, &digest)?,
            CurveSecret::P384(sk) => p384_ops::sign(sk, &digest)?,
        };
        Ok(SignatureEnvelope::new(label, &signature, message))
    }

    fn verify(&self, message: &[u8], signature: &SignatureEnvelope) -> Result<bool, CryptoError> {
        signature.require_fields()?;
        let keys = self.keys_for("verify")?;
        let raw = unb64("signature", &signature.signature)?;
        if signature.algorithm != self.curve.signature_label() {
            return Ok(false);
        }
        let digest = sha256(message);
        Ok(match &keys.secret {
            CurveSecret::P256(sk) => p256_ops::verify(sk, &digest, &raw),
            CurveSecret::P384(sk) => p384_ops::verify(sk, &digest, &raw),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ecc(bits: u32) -> EccCipher {
        EccCipher::new(AlgorithmDescriptor::new(
            format!("ECC-P{bits}"),
            Family::Ecc,
            bits,
            false,
            "test",
        ))
        .unwrap()
    }

    #[test]
    fn hybrid_roundtrip_on_both_curves() {
        for bits in [256, 384] {
            let mut cipher = ecc(bits);
            let env = cipher.encrypt(b"Hello, Quantum World!").unwrap();
            assert_eq!(cipher.decrypt(&env).unwrap(), b"Hello, Quantum World!");
        }
    }

    #[test]
    fn trailing_spaces_are_stripped() {
        let mut cipher = ecc(256);
        let env = cipher.encrypt(b"hello ").unwrap();
        assert_eq!(cipher.decrypt(&env).unwrap(), b"hello");
    }

    #[test]
    fn space_padding_always_adds_at_least_one_byte() {
        assert_eq!(space_pad(b"").len(), 16);
        assert_eq!(space_pad(b"0123456789abcde").len(), 16);
        assert_eq!(space_pad(b"0123456789abcdef").len(), 32);
        assert_eq!(strip_space_pad(space_pad(b"abc")), b"abc");
    }

    #[test]
    fn key_sizes_match_curve() {
        let mut p256 = ecc(256);
        let sizes = p256.generate_keys().unwrap().sizes();
        assert_eq!((sizes.public_key_size, sizes.private_key_size), (65, 32));

        let mut p384 = ecc(384);
        let sizes = p384.generate_keys().unwrap().sizes();
        assert_eq!((sizes.public_key_size, sizes.private_key_size), (97, 48));
    }

    #[test]
    fn ecdsa_sign_verify_and_tamper() {
        for bits in [256, 384] {
            let mut cipher = ecc(bits);
            let sig = cipher.sign(b"message").unwrap();
            assert!(cipher.verify(b"message", &sig).unwrap());
            assert!(!cipher.verify(b"other message", &sig).unwrap());

            let mut relabeled = sig.clone();
            relabeled.algorithm = "ECDSA-P521".into();
            assert!(!cipher.verify(b"message", &relabeled).unwrap());

            let mut truncated = sig;
            truncated.signature = b64(&[1, 2, 3]);
            assert!(!cipher.verify(b"message", &truncated).unwrap());
        }
    }

    #[test]
    fn signature_from_other_key_does_not_verify() {
        let mut a = ecc(256);
        let mut b = ecc(256);
        b.generate_keys().unwrap();
        let sig = a.sign(b"message").unwrap();
        assert!(!b.verify(b"message", &sig).unwrap());
    }

    #[test]
    fn decrypt_and_verify_need_keys() {
        let cipher = ecc(256);
        let env = CipherEnvelope::EcdhAesCbc(HybridEnvelope {
            ciphertext: b64(&[0; 16]),
            iv: b64(&[0; 16]),
            ephemeral_public_key: b64(&[4; 65]),
        });
        assert!(matches!(
            cipher.decrypt(&env),
            Err(CryptoError::MissingKey { .. })
        ));
        let sig = SignatureEnvelope::new("ECDSA-P256", &[0; 64], b"m");
        assert!(matches!(
            cipher.verify(b"m", &sig),
            Err(CryptoError::MissingKey { .. })
        ));
    }

    #[test]
    fn unsupported_curve_size_rejected() {
        let d = AlgorithmDescriptor::new("ECC-P521", Family::Ecc, 521, false, "");
        assert!(matches!(
            EccCipher::new(d),
            Err(CryptoError::InvalidParameter { parameter: 521, .. })
        ));
    }
}
