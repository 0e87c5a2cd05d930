//! Session key generation and string-to-key derivation.

use crate::core::cipher::new_cipher;
use crate::core::messages::EncryptionKey;
use crate::core::KerberosPrincipal;
use crate::error::{CryptoError, Result};
use kerberos_constants::etypes;
use log::debug;
use rand::{CryptoRng, RngCore};

/// Length in bytes of the keys of an etype.
pub fn key_length(etype: i32) -> Result<usize> {
    match etype {
        etypes::AES256_CTS_HMAC_SHA1_96 => return Ok(32),
        etypes::AES128_CTS_HMAC_SHA1_96 => return Ok(16),
        etypes::RC4_HMAC => return Ok(16),
        _ => return Err(CryptoError::UnsupportedEtype(etype))?,
    }
}

/// Fresh random key of the etype, drawn from the given generator.
pub fn random_key<R: RngCore + CryptoRng>(
    rng: &mut R,
    etype: i32,
) -> Result<EncryptionKey> {
    let mut keyvalue = vec![0u8; key_length(etype)?];
    rng.try_fill_bytes(&mut keyvalue).map_err(|err| {
        debug!("Random generator failed: {}", err);
        CryptoError::RandomGeneration
    })?;
    return Ok(EncryptionKey::new(etype, keyvalue));
}

/// Derives the long term key of a principal from its secret, salted with
/// the realm and the principal name as the protocol defines.
pub fn derive_key(
    principal: &KerberosPrincipal,
    secret: &str,
    etype: i32,
) -> Result<EncryptionKey> {
    let cipher = new_cipher(etype)?;
    let salt = cipher.generate_salt(&principal.realm, &principal.salt_name());
    let keyvalue = cipher.generate_key_from_string(secret, &salt);
    return Ok(EncryptionKey::new(etype, keyvalue));
}

/// Checks that a key fits its etype.
pub fn check_key(key: &EncryptionKey) -> Result<()> {
    let expected = key_length(key.keytype)?;
    if key.keyvalue.len() != expected {
        return Err(CryptoError::InvalidKeyLength {
            etype: key.keytype,
            actual: key.keyvalue.len(),
        })?;
    }
    return Ok(());
}
