pub mod extractor;
pub mod jwt;

use subtle::ConstantTimeEq;

/// Constant-time comparison of the presented admin secret.
pub fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_secret_only() {
        assert!(secret_matches("hunter2", "hunter2"));
        assert!(!secret_matches("hunter", "hunter2"));
        assert!(!secret_matches("hunter3", "hunter2"));
        assert!(!secret_matches("", "hunter2"));
    }
}
