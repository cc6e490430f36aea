//! API key generation for the SDK surface.

/// Generate an SDK API key: the configured namespace prefix followed by
/// 32 random bytes (256 bits) hex-encoded.
pub fn generate_api_key(prefix: &str) -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
    format!("{}{}", prefix, hex::encode(random_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key("sk-sdk-");
        assert!(key.starts_with("sk-sdk-"));
        assert_eq!(key.len(), "sk-sdk-".len() + 64); // 32 bytes hex-encoded
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_api_key("sk-sdk-"), generate_api_key("sk-sdk-"));
    }

    #[test]
    fn test_prefix_is_configurable() {
        let key = generate_api_key("lic_test_");
        assert!(key.starts_with("lic_test_"));
    }
}
