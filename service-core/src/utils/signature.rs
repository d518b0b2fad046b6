use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the request proof for a platform-signed request.
///
/// Format: hex(HMAC-SHA256(shared_secret, email))
pub fn email_signature(secret: &str, email: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    mac.update(email.as_bytes());
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Verify a presented email signature using a constant-time comparison.
///
/// Hex digests compare case-insensitively.
pub fn verify_email_signature(
    secret: &str,
    email: &str,
    presented: &str,
) -> Result<bool, anyhow::Error> {
    let expected = email_signature(secret, email)?;
    let presented = presented.to_ascii_lowercase();

    let expected_bytes = expected.as_bytes();
    let presented_bytes = presented.as_bytes();

    if expected_bytes.len() != presented_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(presented_bytes).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_generation_and_verification() {
        let secret = "my_secret_key";
        let email = "user@example.com";

        let signature = email_signature(secret, email).unwrap();
        assert!(!signature.is_empty());

        let is_valid = verify_email_signature(secret, email, &signature).unwrap();
        assert!(is_valid);
    }

    #[test]
    fn test_case_insensitive_digest() {
        let secret = "my_secret_key";
        let email = "user@example.com";

        let signature = email_signature(secret, email).unwrap().to_uppercase();
        let is_valid = verify_email_signature(secret, email, &signature).unwrap();
        assert!(is_valid);
    }

    #[test]
    fn test_tampered_email() {
        let secret = "my_secret_key";

        let signature = email_signature(secret, "user@example.com").unwrap();
        let is_valid =
            verify_email_signature(secret, "other@example.com", &signature).unwrap();
        assert!(!is_valid);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let secret = "my_secret_key";
        let is_valid = verify_email_signature(secret, "user@example.com", "deadbeef").unwrap();
        assert!(!is_valid);
    }
}
