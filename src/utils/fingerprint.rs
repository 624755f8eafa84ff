//! Client fingerprinting
//!
//! Derives a stable identifier from the caller's IP address and User-Agent

use sha2::{Digest, Sha256};

/// Number of fingerprint characters echoed back in debug headers
pub const FINGERPRINT_ECHO_LEN: usize = 8;

/// Compute the fingerprint for an IP / User-Agent pair
///
/// Returns the lowercase hex SHA-256 of `"{ip}:{user_agent}"`. The same
/// pair always produces the same value.
pub fn client_fingerprint(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b":");
    hasher.update(user_agent.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Short prefix of a fingerprint, safe to expose to clients
pub fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(FINGERPRINT_ECHO_LEN)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = client_fingerprint("203.0.113.7", "Mozilla/5.0");
        let b = client_fingerprint("203.0.113.7", "Mozilla/5.0");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let base = client_fingerprint("203.0.113.7", "Mozilla/5.0");
        assert_ne!(base, client_fingerprint("203.0.113.8", "Mozilla/5.0"));
        assert_ne!(base, client_fingerprint("203.0.113.7", "curl/8.0"));
    }

    #[test]
    fn test_fingerprint_is_lowercase_hex() {
        let fp = client_fingerprint("::1", "test-agent");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_short_prefix() {
        let fp = client_fingerprint("10.0.0.1", "test");
        assert_eq!(short(&fp).len(), FINGERPRINT_ECHO_LEN);
        assert!(fp.starts_with(short(&fp)));
    }
}
