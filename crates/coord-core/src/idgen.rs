//! Prefix-tagged ID generation.
//!
//! IDs are `{prefix}-{time}{random}`, base36-encoded: a time component for
//! rough chronological ordering plus a short random suffix for collision
//! resistance. Collisions are not detected here -- the store's primary key
//! constraint is the backstop, and a collision surfaces as a storage error
//! rather than silently overwriting a row.

use rand::Rng;

const RANDOM_SUFFIX_LEN: usize = 6;
const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn encode_base36(mut value: u64, min_len: usize) -> String {
    if value == 0 {
        return "0".repeat(min_len.max(1));
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    while digits.len() < min_len {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 alphabet is ASCII")
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36_ALPHABET[rng.random_range(0..36)] as char)
        .collect()
}

/// Generates an ID of the form `{prefix}-{time}{random}` for the given unix
/// timestamp (seconds).
pub fn generate_id(prefix: &str, now_unix_secs: i64) -> String {
    let time_part = encode_base36(now_unix_secs.max(0) as u64, 7);
    let random_part = random_suffix(RANDOM_SUFFIX_LEN);
    format!("{prefix}-{time_part}{random_part}")
}

/// Prefixes used for each entity kind's generated IDs.
pub mod prefix {
    pub const PROJECT: &str = "proj";
    pub const ISSUE: &str = "iss";
    pub const OUTCOME: &str = "out";
    pub const AGENT: &str = "agent";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_prefixed_id() {
        let id = generate_id(prefix::ISSUE, 1_700_000_000);
        assert!(id.starts_with("iss-"));
        assert_eq!(id.len(), "iss-".len() + 7 + RANDOM_SUFFIX_LEN);
    }

    #[test]
    fn ids_are_not_trivially_equal() {
        let a = generate_id(prefix::ISSUE, 1_700_000_000);
        let b = generate_id(prefix::ISSUE, 1_700_000_000);
        assert_ne!(a, b, "random suffix should differ across calls");
    }

    #[test]
    fn base36_roundtrip_zero() {
        assert_eq!(encode_base36(0, 3), "000");
    }

    #[test]
    fn base36_monotonic_for_increasing_input() {
        let a = encode_base36(100, 1);
        let b = encode_base36(200, 1);
        assert!(b > a);
    }
}
