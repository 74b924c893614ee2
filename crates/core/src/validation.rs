//! Constraint predicates shared by the `validator` schemas of every form payload.

use validator::ValidationError;

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Phone numbers: 7 to 15 digits, optionally with a leading `+` and
/// spaces/dashes/parentheses as separators.
pub fn phone(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
    {
        return Err(ValidationError::new("phone_charset"));
    }
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::new("phone_length"));
    }
    Ok(())
}

/// Identity/tax document numbers: 5 to 20 alphanumerics once separators are removed.
pub fn document_number(value: &str) -> Result<(), ValidationError> {
    let normalized = crate::text::normalize_document(value);
    if normalized.len() < 5 || normalized.len() > 20 {
        return Err(ValidationError::new("document_length"));
    }
    if value
        .chars()
        .any(|c| !(c.is_alphanumeric() || matches!(c, ' ' | '-' | '.')))
    {
        return Err(ValidationError::new("document_charset"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank("Venta").is_ok());
    }

    #[test]
    fn phone_accepts_common_formats() {
        assert!(phone("+593 99 123 4567").is_ok());
        assert!(phone("(02) 234-5678").is_ok());
        assert!(phone("12345").is_err());
        assert!(phone("09x1234567").is_err());
    }

    #[test]
    fn document_number_bounds() {
        assert!(document_number("0102030405").is_ok());
        assert!(document_number("1790012345001").is_ok());
        assert!(document_number("12-3").is_err());
        assert!(document_number("0102/030405").is_err());
    }
}
