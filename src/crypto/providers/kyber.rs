//! Kyber-style KEM stand-in.
//!
//! Key artifacts are random bytes of the sizes ML-KEM uses at each tier.
//! Encryption draws a random 32-byte shared secret, encrypts the payload
//! under it with AES-256-CBC, and ships a random 64-byte value as the
//! encapsulated secret. Decryption cannot recover that secret: it draws a
//! fresh one, so decrypting a stand-in envelope fails (or yields garbage).

use tracing::debug;

use crate::crypto::algorithm::{AlgorithmDescriptor, Family};
use crate::crypto::envelope::{CipherEnvelope, KemEnvelope, SymmetricEnvelope};
use crate::crypto::errors::CryptoError;
use crate::crypto::providers::aes::{cbc_decrypt, cbc_encrypt, Pkcs7, IV_LEN};
use crate::crypto::{b64, random_bytes, unb64, CryptoAlgorithm, Encryptor, KeyMaterial};

const SHARED_SECRET_LEN: usize = 32;
const ENCAPSULATED_SECRET_LEN: usize = 64;
const SCHEME_LABEL: &str = "Kyber";

/// (public, private) key lengths per tier.
pub fn key_sizes(tier: u32) -> Option<(usize, usize)> {
    match tier {
        512 => Some((800, 1632)),
        768 => Some((1184, 2400)),
        1024 => Some((1568, 3168)),
        _ => None,
    }
}

/// KEM stand-in instance.
pub struct KyberStandIn {
    descriptor: AlgorithmDescriptor,
    sizes: (usize, usize),
    keys: Option<KeyMaterial>,
}

impl KyberStandIn {
    /// Accepts tiers 512, 768 and 1024.
    pub fn new(descriptor: AlgorithmDescriptor) -> Result<Self, CryptoError> {
        let parameter = descriptor.security_parameter;
        let sizes = key_sizes(parameter).ok_or(CryptoError::InvalidParameter {
            family: Family::Kyber,
            parameter,
        })?;
        Ok(Self {
            descriptor,
            sizes,
            keys: None,
        })
    }

    fn random(len: usize, map: fn(String) -> CryptoError) -> Result<Vec<u8>, CryptoError> {
        random_bytes(len).map_err(|e| map(format!("RNG failure: {e}")))
    }
}

impl CryptoAlgorithm for KyberStandIn {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn generate_keys(&mut self) -> Result<&KeyMaterial, CryptoError> {
        let (public_len, private_len) = self.sizes;
        let public = Self::random(public_len, CryptoError::KeyGeneration)?;
        let private = Self::random(private_len, CryptoError::KeyGeneration)?;
        Ok(self.keys.insert(KeyMaterial::new(public, private)))
    }

    fn key_material(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref()
    }

    fn as_encryptor(&mut self) -> Option<&mut dyn Encryptor> {
        Some(self)
    }
}

impl Encryptor for KyberStandIn {
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<CipherEnvelope, CryptoError> {
        if self.keys.is_none() {
            self.generate_keys()?;
        }
        let shared_secret = zeroize::Zeroizing::new(Self::random(
            SHARED_SECRET_LEN,
            CryptoError::Encryption,
        )?);
        let iv = Self::random(IV_LEN, CryptoError::Encryption)?;
        let ciphertext = cbc_encrypt::<Pkcs7>(&shared_secret, &iv, plaintext)?;
        let encapsulated = Self::random(ENCAPSULATED_SECRET_LEN, CryptoError::Encryption)?;
        Ok(CipherEnvelope::KemAesCbc(KemEnvelope {
            encapsulated_secret: b64(&encapsulated),
            encrypted_message: SymmetricEnvelope {
                ciphertext: b64(&ciphertext),
                iv: b64(&iv),
            },
            algorithm: SCHEME_LABEL.to_string(),
        }))
    }

    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<Vec<u8>, CryptoError> {
        if self.keys.is_none() {
            return Err(CryptoError::MissingKey {
                family: Family::Kyber,
                operation: "decrypt",
            });
        }
        let CipherEnvelope::KemAesCbc(env) = envelope else {
            return Err(envelope.unexpected("kem-aes-cbc"));
        };
        let encapsulated = unb64("encapsulated_secret", &env.encapsulated_secret)?;
        if encapsulated.len() != ENCAPSULATED_SECRET_LEN {
            return Err(CryptoError::InvalidEnvelope(format!(
                "encapsulated secret is {} bytes, expected {ENCAPSULATED_SECRET_LEN}",
                encapsulated.len()
            )));
        }
        let iv = unb64("iv", &env.encrypted_message.iv)?;
        let ciphertext = unb64("ciphertext", &env.encrypted_message.ciphertext)?;
        // Stand-in decapsulation: the secret is not derived from `encapsulated`.
        debug!(algorithm = %self.descriptor.name, "stand-in decapsulation draws an unrelated secret");
        let shared_secret = zeroize::Zeroizing::new(Self::random(
            SHARED_SECRET_LEN,
            CryptoError::Decryption,
        )?);
        cbc_decrypt::<Pkcs7>(&shared_secret, &iv, &ciphertext)
    }
}
