use rand::Rng;

const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SHORT_CODE_LEN: usize = 6;

/// A building-scoped, human-readable substitute for the QR payload: six
/// uppercase alphanumeric characters. Collision handling (retry against the
/// store) is the caller's responsibility; this only generates candidates.
pub fn generate_short_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SHORT_CODE_ALPHABET.len());
            SHORT_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// The raw, single-use QR payload handed to the visitor. Callers persist
/// only a hash of this value; the plaintext is returned once, at creation
/// time, and never stored.
pub fn generate_qr_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_short_code_has_expected_length_and_alphabet() {
        let code = generate_short_code();
        assert_eq!(code.len(), SHORT_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_short_codes_are_not_trivially_repeated() {
        let codes: HashSet<String> = (0..50).map(|_| generate_short_code()).collect();
        assert!(codes.len() > 40);
    }

    #[test]
    fn test_qr_token_is_64_hex_chars() {
        let token = generate_qr_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
