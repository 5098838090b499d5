//! Concrete family implementations.
//!
//! | Module | Family | Capabilities |
//! |--------|--------|--------------|
//! | [`rsa`] | RSA | encryption (OAEP-SHA256) |
//! | [`ecc`] | ECC | encryption (ECDH + AES-CBC), signing (ECDSA) |
//! | [`aes`] | AES | encryption (CBC, PKCS#7) |
//! | [`kyber`] | KEM-Kyber | encryption (stand-in) |
//! | [`signature`] | Sig-Dilithium, Sig-Falcon | signing (stand-in) |

pub mod aes;
pub mod ecc;
pub mod kyber;
pub mod rsa;
pub mod signature;

use super::algorithm::{AlgorithmDescriptor, Family};
use super::errors::CryptoError;
use super::CryptoAlgorithm;

/// Builds a fresh instance for `descriptor`, validating its security
/// parameter. Keys are generated lazily.
pub fn instantiate(
    descriptor: &AlgorithmDescriptor,
) -> Result<Box<dyn CryptoAlgorithm>, CryptoError> {
    let descriptor = descriptor.clone();
    let algorithm: Box<dyn CryptoAlgorithm> = match descriptor.family {
        Family::Rsa => Box::new(rsa::RsaCipher::new(descriptor)?),
        Family::Ecc => Box::new(ecc::EccCipher::new(descriptor)?),
        Family::Aes => Box::new(aes::AesCipher::new(descriptor)?),
        Family::Kyber => Box::new(kyber::KyberStandIn::new(descriptor)?),
        Family::Dilithium | Family::Falcon => {
            Box::new(signature::LatticeSignatureStandIn::new(descriptor)?)
        }
    };
    Ok(algorithm)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::algorithm::standard_seed;

    #[test]
    fn every_seed_descriptor_instantiates() {
        for d in standard_seed() {
            let alg = instantiate(&d).unwrap();
            assert_eq!(alg.descriptor().name, d.name);
            assert!(alg.key_material().is_none(), "keys must be lazy");
        }
    }

    #[test]
    fn capabilities_match_family() {
        for d in standard_seed() {
            let mut alg = instantiate(&d).unwrap();
            assert_eq!(alg.as_encryptor().is_some(), d.family.supports_encryption());
            assert_eq!(alg.as_signer().is_some(), d.family.supports_signing());
        }
    }
}
