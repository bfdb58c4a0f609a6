use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING,
};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{LedgerError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Tag byte ring puts in front of an uncompressed SEC1 point.
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;
/// Length of a P-256 public key stored as X || Y.
pub const PUBLIC_KEY_LEN: usize = 64;

/// Unix time in whole seconds.
pub fn current_timestamp() -> Result<i64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LedgerError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    i64::try_from(secs).map_err(|_| LedgerError::Crypto("Timestamp overflow".to_string()))
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| LedgerError::InvalidAddress(format!("Invalid base58 encoding: {e}")))
}

pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| LedgerError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    Ok(pkcs8)
}

/// Returns the X || Y coordinates of the public key held in `pkcs8`.
pub fn public_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| LedgerError::Crypto(format!("Failed to create key pair from PKCS8: {e}")))?;
    let point = key_pair.public_key().as_ref();
    match point.split_first() {
        Some((&UNCOMPRESSED_POINT_TAG, coords)) if coords.len() == PUBLIC_KEY_LEN => {
            Ok(coords.to_vec())
        }
        _ => Err(LedgerError::Crypto(
            "Unexpected public key encoding".to_string(),
        )),
    }
}

pub fn ecdsa_p256_sha256_sign_digest(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| LedgerError::Crypto(format!("Failed to create key pair from PKCS8: {e}")))?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| LedgerError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

/// Verifies a fixed-width (r || s) signature. `public_key` is X || Y; malformed
/// keys or signatures simply fail verification.
pub fn ecdsa_p256_sha256_sign_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    if public_key.len() != PUBLIC_KEY_LEN {
        return false;
    }
    let mut point = Vec::with_capacity(PUBLIC_KEY_LEN + 1);
    point.push(UNCOMPRESSED_POINT_TAG);
    point.extend_from_slice(public_key);

    let peer_public_key = ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, point);
    peer_public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let pkcs8 = new_key_pair().unwrap();
        let public_key = public_key_from_pkcs8(&pkcs8).unwrap();
        assert_eq!(public_key.len(), PUBLIC_KEY_LEN);

        let message = sha256_digest(b"trade body");
        let signature = ecdsa_p256_sha256_sign_digest(&pkcs8, &message).unwrap();
        assert!(ecdsa_p256_sha256_sign_verify(
            &public_key,
            &signature,
            &message
        ));
        assert!(!ecdsa_p256_sha256_sign_verify(
            &public_key,
            &signature,
            b"another message"
        ));
    }

    #[test]
    fn test_malformed_inputs_fail_closed() {
        let pkcs8 = new_key_pair().unwrap();
        let public_key = public_key_from_pkcs8(&pkcs8).unwrap();
        let message = sha256_digest(b"payload");

        assert!(!ecdsa_p256_sha256_sign_verify(&public_key, &[], &message));
        assert!(!ecdsa_p256_sha256_sign_verify(
            &public_key,
            &[0xFF; 7],
            &message
        ));
        assert!(!ecdsa_p256_sha256_sign_verify(&[1, 2, 3], &[0; 64], &message));
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(sha256_digest(b"abc").len(), 32);
        assert_eq!(ripemd160_digest(b"abc").len(), 20);
    }

    #[test]
    fn test_base58_round_trip_and_rejection() {
        let data = vec![0u8, 1, 2, 250];
        let encoded = base58_encode(&data);
        assert_eq!(base58_decode(&encoded).unwrap(), data);
        assert!(base58_decode("0OIl").is_err());
    }
}
