//! RSA public-key encryption with OAEP padding (SHA-256 digest and MGF1).

use rand_core::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::crypto::algorithm::{AlgorithmDescriptor, Family};
use crate::crypto::envelope::CipherEnvelope;
use crate::crypto::errors::CryptoError;
use crate::crypto::{b64, unb64, CryptoAlgorithm, Encryptor, KeyMaterial};

const MIN_BITS: u32 = 1024;
const MAX_BITS: u32 = 8192;

struct RsaKeys {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    material: KeyMaterial,
}

/// RSA-OAEP instance. Key material is SPKI / PKCS#8 DER.
pub struct RsaCipher {
    descriptor: AlgorithmDescriptor,
    bits: usize,
    keys: Option<RsaKeys>,
}

impl RsaCipher {
    /// Accepts modulus sizes from 1024 to 8192 bits, in whole bytes.
    pub fn new(descriptor: AlgorithmDescriptor) -> Result<Self, CryptoError> {
        let parameter = descriptor.security_parameter;
        if !(MIN_BITS..=MAX_BITS).contains(&parameter) || parameter % 8 != 0 {
            return Err(CryptoError::InvalidParameter {
                family: Family::Rsa,
                parameter,
            });
        }
        Ok(Self {
            descriptor,
            bits: parameter as usize,
            keys: None,
        })
    }
}

impl CryptoAlgorithm for RsaCipher {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn generate_keys(&mut self) -> Result<&KeyMaterial, CryptoError> {
        let private = RsaPrivateKey::new(&mut OsRng, self.bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = private.to_public_key();
        let public_der = public
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyGeneration(format!("public key encoding: {e}")))?;
        let private_der = private
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyGeneration(format!("private key encoding: {e}")))?;
        let material = KeyMaterial::new(
            public_der.as_bytes().to_vec(),
            private_der.as_bytes().to_vec(),
        );
        let keys = self.keys.insert(RsaKeys {
            private,
            public,
            material,
        });
        Ok(&keys.material)
    }

    fn key_material(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref().map(|k| &k.material)
    }

    fn as_encryptor(&mut self) -> Option<&mut dyn Encryptor> {
        Some(self)
    }
}

impl Encryptor for RsaCipher {
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<CipherEnvelope, CryptoError> {
        if self.keys.is_none() {
            self.generate_keys()?;
        }
        let keys = self.keys.as_ref().ok_or(CryptoError::MissingKey {
            family: Family::Rsa,
            operation: "encrypt",
        })?;
        let ciphertext = keys
            .public
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;
        Ok(CipherEnvelope::RsaOaep {
            ciphertext: b64(&ciphertext),
        })
    }

    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<Vec<u8>, CryptoError> {
        let keys = self.keys.as_ref().ok_or(CryptoError::MissingKey {
            family: Family::Rsa,
            operation: "decrypt",
        })?;
        let CipherEnvelope::RsaOaep { ciphertext } = envelope else {
            return Err(envelope.unexpected("rsa-oaep"));
        };
        let ciphertext = unb64("ciphertext", ciphertext)?;
        keys.private
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .map_err(|e| CryptoError::Decryption(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rsa_1024() -> RsaCipher {
        RsaCipher::new(AlgorithmDescriptor::new(
            "RSA-1024",
            Family::Rsa,
            1024,
            false,
            "test",
        ))
        .unwrap()
    }

    #[test]
    fn oaep_roundtrip_with_lazy_keys() {
        let mut rsa = rsa_1024();
        assert!(rsa.key_material().is_none());
        let env = rsa.encrypt(b"Hello, Quantum World!").unwrap();
        assert!(rsa.key_material().is_some());
        assert_eq!(rsa.decrypt(&env).unwrap(), b"Hello, Quantum World!");
    }

    #[test]
    fn oaep_is_randomized() {
        let mut rsa = rsa_1024();
        let a = rsa.encrypt(b"m").unwrap();
        let b = rsa.encrypt(b"m").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn message_over_oaep_bound_is_encryption_error() {
        // 1024-bit OAEP-SHA256 carries at most 128 - 2*32 - 2 = 62 bytes.
        let mut rsa = rsa_1024();
        assert!(rsa.encrypt(&[0u8; 62]).is_ok());
        let err = rsa.encrypt(&[0u8; 63]).unwrap_err();
        assert!(matches!(err, CryptoError::Encryption(_)));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let mut rsa = rsa_1024();
        let CipherEnvelope::RsaOaep { ciphertext } = rsa.encrypt(b"payload").unwrap() else {
            unreachable!()
        };
        let mut bytes = unb64("ciphertext", &ciphertext).unwrap();
        if let Some(b) = bytes.get_mut(10) {
            *b ^= 0xFF;
        }
        let err = rsa
            .decrypt(&CipherEnvelope::RsaOaep {
                ciphertext: b64(&bytes),
            })
            .unwrap_err();
        assert!(err.is_decryption_failure());
    }

    #[test]
    fn decrypt_before_keygen_is_missing_key() {
        let rsa = rsa_1024();
        let err = rsa
            .decrypt(&CipherEnvelope::RsaOaep {
                ciphertext: "AA==".into(),
            })
            .unwrap_err();
        assert!(matches!(err, CryptoError::MissingKey { .. }));
    }

    #[test]
    fn parameter_bounds() {
        for bad in [512, 1000, 16384] {
            let d = AlgorithmDescriptor::new("RSA-x", Family::Rsa, bad, false, "");
            assert!(RsaCipher::new(d).is_err(), "{bad}");
        }
    }

    #[test]
    fn key_sizes_are_der_lengths() {
        let mut rsa = rsa_1024();
        let sizes = rsa.generate_keys().unwrap().sizes();
        // SPKI for a 1024-bit modulus is 162 bytes; PKCS#8 is larger.
        assert_eq!(sizes.public_key_size, 162);
        assert!(sizes.private_key_size > sizes.public_key_size);
    }
}
