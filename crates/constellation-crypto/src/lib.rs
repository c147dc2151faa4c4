//! Constellation identity hashing.
//!
//! Raw client addresses and secret codes never reach the database; only the
//! hex-encoded SHA-256 digests produced here do.

pub mod identity;

pub use identity::{hash_identity, hash_ip, hash_secret_code, normalize_secret_code};
