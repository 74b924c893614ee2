//! Normalization used by directory uniqueness checks.

/// Normalize a person/company name for comparison.
///
/// Trims, lowercases, folds Latin diacritics and collapses internal whitespace,
/// so `"  Juan   PÉREZ "` and `"juan perez"` compare equal.
pub fn normalize_name(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| word.chars().flat_map(char::to_lowercase).map(fold_diacritic).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize an identity document number: alphanumerics only, uppercased.
pub fn normalize_document(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalize an email address for comparison.
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
