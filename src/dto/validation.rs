//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects empty and whitespace-only credentials.
///
/// ```ignore
/// validate_not_blank("abc") // Ok
/// validate_not_blank("  ")  // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t").is_err());
        assert!(validate_not_blank("token").is_ok());
    }
}
