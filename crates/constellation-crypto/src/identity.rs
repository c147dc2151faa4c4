use sha2::{Digest, Sha256};

/// One-way, fixed-length digest of an arbitrary string (64 hex chars).
pub fn hash_identity(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Hash a client IP exactly as it was observed.
pub fn hash_ip(ip: &str) -> String {
    hash_identity(ip)
}

/// Canonical form of a secret code: uppercased initials, a dash, and the
/// birth month left-padded with zeros to two characters ("da", "7" -> "DA-07").
/// Malformed input is normalized the same way, never rejected.
pub fn normalize_secret_code(initials: &str, birth_month: &str) -> String {
    format!("{}-{:0>2}", initials.to_uppercase(), birth_month)
}

/// Hash a secret code after normalization, so that semantically equal codes
/// typed differently collide.
pub fn hash_secret_code(initials: &str, birth_month: &str) -> String {
    hash_identity(&normalize_secret_code(initials, birth_month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let h = hash_identity("abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(hash_identity("").len(), 64);
    }

    #[test]
    fn ip_hash_is_deterministic_and_distinct() {
        assert_eq!(hash_ip("203.0.113.7"), hash_ip("203.0.113.7"));
        assert_ne!(hash_ip("203.0.113.7"), hash_ip("203.0.113.8"));
        assert_ne!(hash_ip("203.0.113.7"), "203.0.113.7");
    }

    #[test]
    fn secret_code_normalization() {
        assert_eq!(normalize_secret_code("da", "7"), "DA-07");
        assert_eq!(normalize_secret_code("DA", "07"), "DA-07");
        assert_eq!(normalize_secret_code("abc", "12"), "ABC-12");
        assert_eq!(normalize_secret_code("x", ""), "X-00");
        assert_eq!(normalize_secret_code("x", "123"), "X-123");
    }

    #[test]
    fn equal_codes_collide() {
        assert_eq!(hash_secret_code("da", "7"), hash_secret_code("DA", "07"));
        assert_ne!(hash_secret_code("da", "7"), hash_secret_code("da", "8"));
        assert_eq!(hash_secret_code("DA", "07"), hash_identity("DA-07"));
    }
}
