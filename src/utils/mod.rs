//! Utility functions and helpers
//!
//! Hashing, signing and encoding primitives plus the versioned storage codec.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, public_key_from_pkcs8, ripemd160_digest,
    sha256_digest, PUBLIC_KEY_LEN,
};

pub use serialization::{deserialize, encode_canonical, serialize, SCHEMA_VERSION};
