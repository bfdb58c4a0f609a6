use crate::error::{LedgerError, Result};
use crate::utils::{
    base58_decode, base58_encode, ecdsa_p256_sha256_sign_digest, new_key_pair,
    public_key_from_pkcs8, ripemd160_digest, sha256_digest,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;
const PUB_KEY_HASH_LEN: usize = 20;

/// Signing capability handed to the ledger by whoever holds the keys.
pub trait TradeSigner {
    /// P-256 public key as X || Y.
    fn public_key(&self) -> &[u8];

    /// ECDSA P-256 / SHA-256 signature over `message`, fixed r || s encoding.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Clone, Zeroize, ZeroizeOnDrop, bincode::Encode, bincode::Decode)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        Self::from_pkcs8(pkcs8)
    }

    pub fn from_pkcs8(pkcs8: Vec<u8>) -> Result<Wallet> {
        let public_key = public_key_from_pkcs8(&pkcs8)?;
        Ok(Wallet { pkcs8, public_key })
    }

    pub fn get_address(&self) -> String {
        convert_address(&self.get_pub_key_hash())
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_pub_key_hash(&self) -> Vec<u8> {
        hash_pub_key(&self.public_key)
    }
}

impl TradeSigner for Wallet {
    fn public_key(&self) -> &[u8] {
        self.get_public_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign_digest(&self.pkcs8, message)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.get_address())
            .finish_non_exhaustive()
    }
}

/// RIPEMD160(SHA-256(pub_key))
pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = sha256_digest(pub_key);
    ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = sha256_digest(payload);
    let second_sha = sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

pub fn validate_address(address: &str) -> bool {
    address_to_pub_key_hash(address).is_ok()
}

/// Decodes an address into its public-key hash, checking version and checksum.
pub fn address_to_pub_key_hash(address: &str) -> Result<Vec<u8>> {
    let payload = base58_decode(address)?;
    if payload.len() != 1 + PUB_KEY_HASH_LEN + ADDRESS_CHECK_SUM_LEN {
        return Err(LedgerError::InvalidAddress(format!(
            "{address}: unexpected length {}",
            payload.len()
        )));
    }
    if payload[0] != VERSION {
        return Err(LedgerError::InvalidAddress(format!(
            "{address}: unknown version byte {}",
            payload[0]
        )));
    }

    let (versioned, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    if checksum(versioned) != actual_checksum {
        return Err(LedgerError::InvalidAddress(format!(
            "{address}: checksum mismatch"
        )));
    }
    Ok(versioned[1..].to_vec())
}

pub fn convert_address(pub_key_hash: &[u8]) -> String {
    let mut payload: Vec<u8> = vec![VERSION];
    payload.extend(pub_key_hash);
    let checksum = checksum(payload.as_slice());
    // version + pub_key_hash + checksum
    payload.extend(checksum.as_slice());
    base58_encode(payload.as_slice())
}
