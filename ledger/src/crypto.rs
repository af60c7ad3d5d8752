// Copyright (c) 2019-2025 Provable Inc.
// This file is part of the meridian library.

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:

// http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use sha2::{Digest, Sha256};
use std::fmt;

/// The length of a content hash, in bytes.
pub const HASH_LENGTH: usize = 32;
/// The length of an account address, in bytes.
pub const ADDRESS_LENGTH: usize = 20;
/// The length of an ed25519 public key, in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// The length of an ed25519 signature, in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// A 32-byte content hash.
pub type Hash = [u8; HASH_LENGTH];

/// The all-zero hash, used as the previous hash of the genesis block.
pub const EMPTY_HASH: Hash = [0u8; HASH_LENGTH];

/// Returns the SHA-256 digest of the given bytes.
pub fn sha256(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

/// Returns the 160-bit address hash of the given bytes,
/// defined as the first 20 bytes of their SHA-256 digest.
pub fn h160(bytes: &[u8]) -> [u8; ADDRESS_LENGTH] {
    let digest = sha256(bytes);
    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&digest[..ADDRESS_LENGTH]);
    address
}

/// A 20-byte account address, derived from the hash of an ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address, used as the coinbase of the genesis block.
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    /// Initializes an address from its raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derives the address of the given ed25519 public key.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(h160(public_key))
    }

    /// Returns the raw bytes of the address.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A detached ed25519 signature, carrying the public key that produced it.
///
/// Carrying the key allows the verifier to recover the signer's address
/// without an out-of-band lookup, which is how precommit votes are
/// attributed to validators.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    public_key: [u8; PUBLIC_KEY_LENGTH],
    signature: [u8; SIGNATURE_LENGTH],
}

/// The encoded length of a [`Signature`]: public key followed by signature.
pub const FULL_SIGNATURE_LENGTH: usize = PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH;

// Serde cannot derive for the 64-byte signature array, so signatures travel
// as one 96-byte string: public key first, signature after.
impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut bytes = [0u8; FULL_SIGNATURE_LENGTH];
        bytes[..PUBLIC_KEY_LENGTH].copy_from_slice(&self.public_key);
        bytes[PUBLIC_KEY_LENGTH..].copy_from_slice(&self.signature);
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SignatureVisitor;

        impl<'de> Visitor<'de> for SignatureVisitor {
            type Value = Signature;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{FULL_SIGNATURE_LENGTH} signature bytes")
            }

            fn visit_bytes<E: de::Error>(self, bytes: &[u8]) -> Result<Self::Value, E> {
                if bytes.len() != FULL_SIGNATURE_LENGTH {
                    return Err(E::invalid_length(bytes.len(), &self));
                }
                let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
                public_key.copy_from_slice(&bytes[..PUBLIC_KEY_LENGTH]);
                let mut signature = [0u8; SIGNATURE_LENGTH];
                signature.copy_from_slice(&bytes[PUBLIC_KEY_LENGTH..]);
                Ok(Signature { public_key, signature })
            }

            // Human-readable formats hand the bytes over one by one.
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut bytes = [0u8; FULL_SIGNATURE_LENGTH];
                for (index, byte) in bytes.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(index, &self))?;
                }
                if seq.next_element::<u8>()?.is_some() {
                    return Err(de::Error::invalid_length(FULL_SIGNATURE_LENGTH + 1, &self));
                }
                self.visit_bytes(&bytes)
            }
        }

        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

impl Signature {
    /// Initializes a signature from its raw parts.
    pub const fn new(public_key: [u8; PUBLIC_KEY_LENGTH], signature: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { public_key, signature }
    }

    /// Returns the public key that produced this signature.
    pub const fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    /// Returns the address of the signer.
    pub fn signer_address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.signer_address())
    }
}

/// Verifies the given message against the signature and its embedded public key.
pub fn verify(message: &[u8], signature: &Signature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&signature.public_key) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&signature.signature);
    verifying_key.verify(message, &signature).is_ok()
}

/// An ed25519 keypair used by validators to sign votes.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Initializes a keypair from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(&seed) }
    }

    /// Returns the public key of this keypair.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Returns the address of this keypair.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Signs the given message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let signature = self.signing_key.sign(message);
        Signature::new(self.public_key(), signature.to_bytes())
    }
}
