// src/core/keys.rs

//! RSA key material for proof signing.
//!
//! Private keys are PKCS#8 DER, public keys are SPKI DER; both are carried as
//! lowercase hex strings at module boundaries. Signatures are
//! RSASSA-PKCS1-v1_5 over SHA256 and are hex-encoded.

use std::fmt;

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{JournalError, Result};

/// The private half of an agent identity. Held by the state machine for the
/// lifetime of a session; it never crosses the sink boundary.
#[derive(Clone)]
pub struct SigningIdentity {
    key: RsaPrivateKey,
    signer: SigningKey<Sha256>,
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material is deliberately not printed.
        f.debug_struct("SigningIdentity").finish_non_exhaustive()
    }
}

impl SigningIdentity {
    /// Generates a fresh RSA identity with the given modulus size.
    pub fn generate(bits: usize) -> Result<Self> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| JournalError::CryptoKey(format!("key generation failed: {}", e)))?;
        Ok(Self::from_private_key(key))
    }

    /// Wraps an existing RSA private key.
    pub fn from_private_key(key: RsaPrivateKey) -> Self {
        let signer = SigningKey::<Sha256>::new(key.clone());
        Self { key, signer }
    }

    /// Parses a PKCS#8 DER private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| JournalError::CryptoKey(format!("invalid PKCS#8 private key: {}", e)))?;
        Ok(Self::from_private_key(key))
    }

    /// Parses a hex-encoded PKCS#8 DER private key.
    pub fn from_hex(hex_der: &str) -> Result<Self> {
        let der = hex::decode(hex_der.trim())
            .map_err(|e| JournalError::CryptoKey(format!("private key is not valid hex: {}", e)))?;
        Self::from_pkcs8_der(&der)
    }

    /// Encodes the private key as hex over PKCS#8 DER.
    pub fn to_hex(&self) -> Result<String> {
        let doc = self
            .key
            .to_pkcs8_der()
            .map_err(|e| JournalError::CryptoKey(format!("PKCS#8 encoding failed: {}", e)))?;
        Ok(hex::encode(doc.as_bytes()))
    }

    /// Returns the matching public verifier key.
    pub fn verifier(&self) -> VerifierKey {
        VerifierKey::from_public_key(RsaPublicKey::from(&self.key))
    }

    /// Signs a text commitment, returning the signature as lowercase hex.
    ///
    /// The signature covers the UTF-8 bytes of `text` as given. State hashes
    /// are signed in their hex form, not as raw digest bytes; this is a
    /// deliberate contract for cross-compatibility and is what
    /// [`VerifierKey::verify_text`] expects.
    pub fn sign_text(&self, text: &str) -> Result<String> {
        let signature = self
            .signer
            .try_sign(text.as_bytes())
            .map_err(|e| JournalError::CryptoOp(format!("signing failed: {}", e)))?;
        Ok(hex::encode(signature.to_bytes()))
    }
}

/// The public half of an agent identity, used by auditors.
#[derive(Clone)]
pub struct VerifierKey {
    key: RsaPublicKey,
    verifier: VerifyingKey<Sha256>,
}

impl fmt::Debug for VerifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierKey").finish_non_exhaustive()
    }
}

impl VerifierKey {
    /// Wraps an existing RSA public key.
    pub fn from_public_key(key: RsaPublicKey) -> Self {
        let verifier = VerifyingKey::<Sha256>::new(key.clone());
        Self { key, verifier }
    }

    /// Parses an SPKI DER public key.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| JournalError::CryptoKey(format!("invalid SPKI public key: {}", e)))?;
        Ok(Self::from_public_key(key))
    }

    /// Parses a hex-encoded SPKI DER public key.
    pub fn from_hex(hex_der: &str) -> Result<Self> {
        let der = hex::decode(hex_der.trim())
            .map_err(|e| JournalError::CryptoKey(format!("public key is not valid hex: {}", e)))?;
        Self::from_spki_der(&der)
    }

    /// Encodes the public key as hex over SPKI DER.
    pub fn to_hex(&self) -> Result<String> {
        let doc = self
            .key
            .to_public_key_der()
            .map_err(|e| JournalError::CryptoKey(format!("SPKI encoding failed: {}", e)))?;
        Ok(hex::encode(doc.as_bytes()))
    }

    /// Verifies a hex signature over the UTF-8 bytes of `text`.
    ///
    /// Malformed signature encodings verify as `false` rather than erroring;
    /// an auditor feeding in a tampered chain gets a verdict, not a crash.
    pub fn verify_text(&self, text: &str, signature_hex: &str) -> bool {
        let Ok(raw) = hex::decode(signature_hex.trim()) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(raw.as_slice()) else {
            return false;
        };
        self.verifier.verify(text.as_bytes(), &signature).is_ok()
    }
}
