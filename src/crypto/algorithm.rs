//! Algorithm taxonomy: families, descriptors, and the standard seed list.
//!
//! A [`Family`] decides which capabilities an instance exposes and how its
//! security parameter is read (RSA/AES bit length, ECC curve size, PQC
//! tier or level). An [`AlgorithmDescriptor`] is the immutable catalog entry
//! for one parameterization of a family.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Algorithm category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    /// RSA public-key encryption (OAEP, SHA-256).
    #[serde(rename = "RSA")]
    Rsa,
    /// Elliptic curve: ECDSA signing plus ECDH hybrid encryption.
    #[serde(rename = "ECC")]
    Ecc,
    /// AES-CBC symmetric encryption.
    #[serde(rename = "AES")]
    Aes,
    /// Kyber-style KEM stand-in.
    #[serde(rename = "KEM-Kyber")]
    Kyber,
    /// Dilithium-style signature stand-in.
    #[serde(rename = "Sig-Dilithium")]
    Dilithium,
    /// Falcon-style signature stand-in.
    #[serde(rename = "Sig-Falcon")]
    Falcon,
}

impl Family {
    /// Every family, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Rsa,
        Self::Ecc,
        Self::Aes,
        Self::Kyber,
        Self::Dilithium,
        Self::Falcon,
    ];

    /// Canonical identifier (same as the serialized form).
    pub fn id(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ecc => "ECC",
            Self::Aes => "AES",
            Self::Kyber => "KEM-Kyber",
            Self::Dilithium => "Sig-Dilithium",
            Self::Falcon => "Sig-Falcon",
        }
    }

    /// Parses a family identifier. Accepts the canonical form and the bare
    /// scheme name (`"Kyber"`, `"Dilithium"`, `"Falcon"`), case-insensitively.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        match id.as_str() {
            "rsa" => Some(Self::Rsa),
            "ecc" => Some(Self::Ecc),
            "aes" => Some(Self::Aes),
            "kem-kyber" | "kyber" => Some(Self::Kyber),
            "sig-dilithium" | "dilithium" => Some(Self::Dilithium),
            "sig-falcon" | "falcon" => Some(Self::Falcon),
            _ => None,
        }
    }

    /// Whether instances of this family can encrypt and decrypt.
    pub fn supports_encryption(self) -> bool {
        matches!(self, Self::Rsa | Self::Ecc | Self::Aes | Self::Kyber)
    }

    /// Whether instances of this family can sign and verify.
    pub fn supports_signing(self) -> bool {
        matches!(self, Self::Ecc | Self::Dilithium | Self::Falcon)
    }

    /// Families with no encryption capability at all.
    pub fn is_signature_only(self) -> bool {
        self.supports_signing() && !self.supports_encryption()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Classical vs post-quantum split used by the catalog summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// Vulnerable to Shor's algorithm.
    Classical,
    /// Designated quantum-safe.
    PostQuantum,
}

/// Immutable catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmDescriptor {
    /// Unique name, e.g. `"AES-256"`.
    pub name: String,
    /// Algorithm category.
    pub family: Family,
    /// Key size or security level; meaning depends on [`Family`].
    pub security_parameter: u32,
    /// Designated resistant to quantum cryptanalysis.
    pub quantum_safe: bool,
    /// Human description.
    pub description: String,
}

impl AlgorithmDescriptor {
    /// Builds a descriptor.
    pub fn new(
        name: impl Into<String>,
        family: Family,
        security_parameter: u32,
        quantum_safe: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            security_parameter,
            quantum_safe,
            description: description.into(),
        }
    }

    /// Classical or post-quantum.
    pub fn kind(&self) -> AlgorithmKind {
        if self.quantum_safe {
            AlgorithmKind::PostQuantum
        } else {
            AlgorithmKind::Classical
        }
    }
}

// ---------------------------------------------------------------------------
// Standard seed list
// ---------------------------------------------------------------------------

/// The 13 descriptors the catalog is seeded with at startup.
pub fn standard_seed() -> Vec<AlgorithmDescriptor> {
    use Family::{Aes, Dilithium, Ecc, Falcon, Kyber, Rsa};
    vec![
        AlgorithmDescriptor::new(
            "RSA-2048",
            Rsa,
            2048,
            false,
            "RSA with 2048-bit key, OAEP padding with SHA-256",
        ),
        AlgorithmDescriptor::new(
            "RSA-4096",
            Rsa,
            4096,
            false,
            "RSA with 4096-bit key, OAEP padding with SHA-256",
        ),
        AlgorithmDescriptor::new(
            "ECC-P256",
            Ecc,
            256,
            false,
            "Elliptic curve P-256: ECDSA signatures and ECDH hybrid encryption",
        ),
        AlgorithmDescriptor::new(
            "ECC-P384",
            Ecc,
            384,
            false,
            "Elliptic curve P-384: ECDSA signatures and ECDH hybrid encryption",
        ),
        AlgorithmDescriptor::new("AES-128", Aes, 128, false, "AES with 128-bit key in CBC mode"),
        AlgorithmDescriptor::new("AES-256", Aes, 256, false, "AES with 256-bit key in CBC mode"),
        AlgorithmDescriptor::new(
            "Kyber-512",
            Kyber,
            512,
            true,
            "Lattice-based KEM stand-in, security comparable to AES-128",
        ),
        AlgorithmDescriptor::new(
            "Kyber-768",
            Kyber,
            768,
            true,
            "Lattice-based KEM stand-in, security comparable to AES-192",
        ),
        AlgorithmDescriptor::new(
            "Kyber-1024",
            Kyber,
            1024,
            true,
            "Lattice-based KEM stand-in, security comparable to AES-256",
        ),
        AlgorithmDescriptor::new(
            "Dilithium-2",
            Dilithium,
            2,
            true,
            "Lattice-based signature stand-in, NIST level 2",
        ),
        AlgorithmDescriptor::new(
            "Dilithium-3",
            Dilithium,
            3,
            true,
            "Lattice-based signature stand-in, NIST level 3",
        ),
        AlgorithmDescriptor::new(
            "Falcon-512",
            Falcon,
            512,
            true,
            "NTRU lattice signature stand-in, NIST level 1",
        ),
        AlgorithmDescriptor::new(
            "Falcon-1024",
            Falcon,
            1024,
            true,
            "NTRU lattice signature stand-in, NIST level 5",
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn family_id_roundtrip() {
        for family in Family::ALL {
            assert_eq!(Family::from_id(family.id()), Some(family));
        }
        assert_eq!(Family::from_id("dilithium"), Some(Family::Dilithium));
        assert_eq!(Family::from_id("DES"), None);
    }

    #[test]
    fn family_serializes_to_canonical_id() {
        let json = serde_json::to_string(&Family::Kyber).unwrap();
        assert_eq!(json, "\"KEM-Kyber\"");
    }

    #[test]
    fn capability_matrix() {
        assert!(Family::Ecc.supports_encryption() && Family::Ecc.supports_signing());
        assert!(!Family::Aes.supports_signing());
        assert!(Family::Falcon.is_signature_only());
        assert!(!Family::Kyber.is_signature_only());
    }

    #[test]
    fn standard_seed_has_unique_names_and_pqc_flags() {
        let seed = standard_seed();
        assert_eq!(seed.len(), 13);
        let mut names: Vec<&str> = seed.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 13);
        for d in &seed {
            let pq = matches!(d.family, Family::Kyber | Family::Dilithium | Family::Falcon);
            assert_eq!(d.quantum_safe, pq, "{}", d.name);
        }
    }
}
