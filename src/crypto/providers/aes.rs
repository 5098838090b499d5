//! AES-CBC symmetric family, plus the CBC helpers the hybrid ECC and KEM
//! stand-in families reuse.

use aes::cipher::block_padding::{PadType, Padding};
use aes::cipher::consts::U16;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::crypto::algorithm::{AlgorithmDescriptor, Family};
use crate::crypto::envelope::{CipherEnvelope, SymmetricEnvelope};
use crate::crypto::errors::CryptoError;
use crate::crypto::{b64, random_bytes, unb64, CryptoAlgorithm, Encryptor, KeyMaterial};

pub use aes::cipher::block_padding::{NoPadding, Pkcs7};

/// CBC initialization vector length.
pub const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

// ---------------------------------------------------------------------------
// CBC helpers
// ---------------------------------------------------------------------------

macro_rules! with_aes_cbc {
    ($mode:ident, $key:expr, $iv:expr, $err:expr, |$c:ident| $body:expr) => {
        match $key.len() {
            16 => cbc::$mode::<aes::Aes128>::new_from_slices($key, $iv)
                .map(|$c| $body)
                .map_err(|e| $err(format!("AES-CBC setup: {e}"))),
            24 => cbc::$mode::<aes::Aes192>::new_from_slices($key, $iv)
                .map(|$c| $body)
                .map_err(|e| $err(format!("AES-CBC setup: {e}"))),
            32 => cbc::$mode::<aes::Aes256>::new_from_slices($key, $iv)
                .map(|$c| $body)
                .map_err(|e| $err(format!("AES-CBC setup: {e}"))),
            n => Err($err(format!("unsupported AES key length {n} bytes"))),
        }
    };
}

/// Encrypts `data` under AES-CBC with padding `P`. With [`NoPadding`] the
/// input must already be block aligned.
pub(crate) fn cbc_encrypt<P: Padding<U16>>(
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if matches!(P::TYPE, PadType::NoPadding) && data.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::Encryption(
            "unpadded input is not block aligned".into(),
        ));
    }
    with_aes_cbc!(Encryptor, key, iv, CryptoError::Encryption, |c| c
        .encrypt_padded_vec_mut::<P>(data))
}

/// Decrypts AES-CBC `data` and removes padding `P`.
pub(crate) fn cbc_decrypt<P: Padding<U16>>(
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if data.is_empty() || data.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::Decryption(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
            data.len()
        )));
    }
    with_aes_cbc!(Decryptor, key, iv, CryptoError::Decryption, |c| c
        .decrypt_padded_vec_mut::<P>(data))?
    .map_err(|_| CryptoError::Decryption("invalid padding".into()))
}

// ---------------------------------------------------------------------------
// AES family
// ---------------------------------------------------------------------------

/// AES in CBC mode with PKCS#7 padding and a random IV per call.
pub struct AesCipher {
    descriptor: AlgorithmDescriptor,
    key_len: usize,
    keys: Option<KeyMaterial>,
}

impl AesCipher {
    /// Accepts 128, 192 or 256-bit descriptors.
    pub fn new(descriptor: AlgorithmDescriptor) -> Result<Self, CryptoError> {
        let key_len = match descriptor.security_parameter {
            128 => 16,
            192 => 24,
            256 => 32,
            parameter => {
                return Err(CryptoError::InvalidParameter {
                    family: Family::Aes,
                    parameter,
                })
            }
        };
        Ok(Self {
            descriptor,
            key_len,
            keys: None,
        })
    }

    fn ensure_keys(&mut self) -> Result<(), CryptoError> {
        if self.keys.is_none() {
            self.generate_keys()?;
        }
        Ok(())
    }
}

impl CryptoAlgorithm for AesCipher {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn generate_keys(&mut self) -> Result<&KeyMaterial, CryptoError> {
        let key = random_bytes(self.key_len)
            .map_err(|e| CryptoError::KeyGeneration(format!("RNG failure: {e}")))?;
        Ok(self.keys.insert(KeyMaterial::new(Vec::new(), key)))
    }

    fn key_material(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref()
    }

    fn as_encryptor(&mut self) -> Option<&mut dyn Encryptor> {
        Some(self)
    }
}

impl Encryptor for AesCipher {
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<CipherEnvelope, CryptoError> {
        self.ensure_keys()?;
        let keys = self.keys.as_ref().ok_or(CryptoError::MissingKey {
            family: Family::Aes,
            operation: "encrypt",
        })?;
        let iv = random_bytes(IV_LEN)
            .map_err(|e| CryptoError::Encryption(format!("RNG failure: {e}")))?;
        let ciphertext = cbc_encrypt::<Pkcs7>(keys.private(), &iv, plaintext)?;
        Ok(CipherEnvelope::AesCbc(SymmetricEnvelope {
            ciphertext: b64(&ciphertext),
            iv: b64(&iv),
        }))
    }

    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<Vec<u8>, CryptoError> {
        let keys = self.keys.as_ref().ok_or(CryptoError::MissingKey {
            family: Family::Aes,
            operation: "decrypt",
        })?;
        let CipherEnvelope::AesCbc(env) = envelope else {
            return Err(envelope.unexpected("aes-cbc"));
        };
        let iv = unb64("iv", &env.iv)?;
        let ciphertext = unb64("ciphertext", &env.ciphertext)?;
        cbc_decrypt::<Pkcs7>(keys.private(), &iv, &ciphertext)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn cipher_of(bits: u32) -> AesCipher {
        AesCipher::new(AlgorithmDescriptor::new(
            format!("AES-{bits}"),
            Family::Aes,
            bits,
            false,
            "test",
        ))
        .unwrap()
    }

    #[test]
    fn roundtrip_each_key_size() {
        for bits in [128, 192, 256] {
            let mut cipher = cipher_of(bits);
            let msgs: [&[u8]; 4] = [b"", b"x", b"exactly sixteen!", b"Hello, Quantum World!"];
            for msg in msgs {
                let env = cipher.encrypt(msg).unwrap();
                assert_eq!(cipher.decrypt(&env).unwrap(), msg);
            }
            assert_eq!(
                cipher.key_material().unwrap().sizes().private_key_size,
                bits as usize / 8
            );
        }
    }

    #[test]
    fn fresh_iv_per_call() {
        let mut cipher = cipher_of(256);
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn pkcs7_pads_aligned_input_with_full_block() {
        let mut cipher = cipher_of(128);
        let CipherEnvelope::AesCbc(env) = cipher.encrypt(b"exactly sixteen!").unwrap() else {
            panic!("wrong envelope");
        };
        assert_eq!(unb64("ciphertext", &env.ciphertext).unwrap().len(), 32);
    }

    #[test]
    fn decrypt_without_key_is_missing_key() {
        let cipher = cipher_of(128);
        let env = CipherEnvelope::AesCbc(SymmetricEnvelope {
            ciphertext: b64(&[0; 16]),
            iv: b64(&[0; 16]),
        });
        let err = cipher.decrypt(&env).unwrap_err();
        assert!(matches!(err, CryptoError::MissingKey { .. }));
        assert!(err.is_decryption_failure());
    }

    #[test]
    fn wrong_key_fails_or_differs() {
        let mut a = cipher_of(256);
        let mut b = cipher_of(256);
        b.generate_keys().unwrap();
        let env = a.encrypt(b"attack at dawn").unwrap();
        match b.decrypt(&env) {
            Ok(pt) => assert_ne!(pt, b"attack at dawn"),
            Err(e) => assert!(e.is_decryption_failure()),
        }
    }

    #[test]
    fn rejects_foreign_envelope_and_bad_parameters() {
        let mut cipher = cipher_of(128);
        cipher.generate_keys().unwrap();
        let err = cipher
            .decrypt(&CipherEnvelope::RsaOaep {
                ciphertext: "AA==".into(),
            })
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidEnvelope(_)));

        let bad = AesCipher::new(AlgorithmDescriptor::new("AES-100", Family::Aes, 100, false, ""));
        assert!(matches!(bad, Err(CryptoError::InvalidParameter { .. })));
    }

    #[test]
    fn signing_is_a_capability_mismatch() {
        let mut cipher = cipher_of(256);
        let err = cipher.signer().err().unwrap();
        assert!(matches!(err, CryptoError::CapabilityMismatch { .. }));
    }

    #[test]
    fn no_padding_requires_alignment() {
        let key = [7u8; 16];
        let iv = [0u8; 16];
        assert!(cbc_encrypt::<NoPadding>(&key, &iv, b"short").is_err());
        let ct = cbc_encrypt::<NoPadding>(&key, &iv, b"0123456789abcdef").unwrap();
        assert_eq!(
            cbc_decrypt::<NoPadding>(&key, &iv, &ct).unwrap(),
            b"0123456789abcdef"
        );
    }
}
