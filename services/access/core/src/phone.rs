/// Normalizes a phone number to E.164 for storage and ban matching: strips
/// spaces, hyphens, and parentheses, and requires a leading `+` followed by
/// digits only.
pub fn normalize_e164(raw: &str) -> Result<String, String> {
    let stripped: String =
        raw.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.')).collect();

    let Some(rest) = stripped.strip_prefix('+') else {
        return Err("phone number must start with a country code ('+')".to_string());
    };

    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err("phone number must contain only digits after the '+'".to_string());
    }

    if rest.len() < 7 || rest.len() > 15 {
        return Err("phone number length is out of range".to_string());
    }

    Ok(format!("+{}", rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_punctuation_and_whitespace() {
        assert_eq!(normalize_e164("+1 (415) 555-0132").unwrap(), "+14155550132");
    }

    #[test]
    fn test_rejects_missing_country_code() {
        assert!(normalize_e164("4155550132").is_err());
    }

    #[test]
    fn test_rejects_non_digit_characters() {
        assert!(normalize_e164("+1415abc0132").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_length() {
        assert!(normalize_e164("+123").is_err());
    }
}
