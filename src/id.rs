//! Identifier normalization.
//!
//! Externally supplied identifiers arrive in many shapes (upper case, without
//! hyphens, wrapped in braces or as a `urn:uuid:` URN). Everything stored by
//! this crate uses the lowercase hyphenated form.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Parses a loosely formatted identifier into a [`Uuid`].
pub fn parse(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| Error::InvalidIdentifier(id.to_string()))
}

/// Validates `id` and returns its canonical lowercase hyphenated form.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] when `id` is not a UUID in any of the
/// accepted formats.
pub fn validate_and_convert(id: &str) -> Result<String> {
    parse(id).map(|uuid| uuid.hyphenated().to_string())
}

/// Returns `true` when `id` can be normalized.
pub fn is_valid(id: &str) -> bool {
    parse(id).is_ok()
}

/// Generates a fresh random identifier.
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e";

    #[test]
    fn accepts_common_formats() {
        for input in [
            CANONICAL,
            "6F1C2A4E-8B0D-4F3A-9C5E-1D2B3A4C5D6E",
            "6f1c2a4e8b0d4f3a9c5e1d2b3a4c5d6e",
            "{6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e}",
            "urn:uuid:6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e",
            "  6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6e\n",
        ] {
            assert_eq!(validate_and_convert(input).unwrap(), CANONICAL, "{input}");
        }
    }

    #[test]
    fn rejects_malformed() {
        for input in ["", "not-a-uuid", "6f1c2a4e-8b0d-4f3a-9c5e", "6f1c2a4e-8b0d-4f3a-9c5e-1d2b3a4c5d6z"] {
            let err = validate_and_convert(input).unwrap_err();
            assert!(matches!(err, Error::InvalidIdentifier(ref s) if s == input));
            assert!(!is_valid(input));
        }
    }
}
