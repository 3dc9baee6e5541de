use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

/// Generates a high-entropy opaque token. Returns `(plaintext, hash)`;
/// only the hash may ever be persisted, the plaintext is shown to the
/// recipient exactly once.
pub fn generate_token() -> (String, String) {
    let token = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect::<String>();
    let hash = hash_token(&token);
    (token, hash)
}

pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let (plain, hash) = generate_token();
        assert_eq!(hash, hash_token(&plain));
        assert_ne!(plain, hash);
    }

    #[test]
    fn tokens_are_unique() {
        let (a, _) = generate_token();
        let (b, _) = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 48);
    }
}
