//! Camera address validation.
use std::net::Ipv4Addr;

/// Returns `true` for a dotted-quad IPv4 address such as `192.168.1.2`.
///
/// Submissions are checked with this predicate before any handshake starts.
pub fn is_valid_address(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    !trimmed.is_empty() && trimmed == candidate && trimmed.parse::<Ipv4Addr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_quads() {
        assert!(is_valid_address("192.168.1.2"));
        assert!(is_valid_address("10.0.0.1"));
    }

    #[test]
    fn rejects_everything_else() {
        for candidate in ["", "192.168.1", "192.168.1.256", "camera.local", " 10.0.0.1", "::1"] {
            assert!(!is_valid_address(candidate), "{candidate:?} should be rejected");
        }
    }
}
