//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 64;

/// Validates that a display name is non-blank and at most 64 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("display name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_CHARS {
        let mut err = ValidationError::new("name_length");
        err.message =
            Some(format!("display name must be at most {MAX_NAME_CHARS} characters").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_display_name("Alice").is_ok());
        assert!(validate_display_name("B").is_ok());
    }

    #[test]
    fn rejects_blank_names() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn rejects_oversized_names() {
        let long = "x".repeat(65);
        assert!(validate_display_name(&long).is_err());
        let max = "x".repeat(64);
        assert!(validate_display_name(&max).is_ok());
    }
}
