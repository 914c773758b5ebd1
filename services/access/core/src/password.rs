/// Enforces the password-complexity rule from the registration flow: at
/// least 8 characters, with at least one uppercase letter, one lowercase
/// letter, one digit, and one symbol.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if !has_upper {
        return Err("password must contain an uppercase letter".to_string());
    }
    if !has_lower {
        return Err("password must contain a lowercase letter".to_string());
    }
    if !has_digit {
        return Err("password must contain a digit".to_string());
    }
    if !has_symbol {
        return Err("password must contain a symbol".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_compliant_password() {
        assert!(validate_password_strength("Str0ng!Pass").is_ok());
    }

    #[test]
    fn test_rejects_short_password() {
        assert!(validate_password_strength("Sh0rt!").is_err());
    }

    #[test]
    fn test_rejects_missing_symbol() {
        assert!(validate_password_strength("Str0ngPass").is_err());
    }

    #[test]
    fn test_rejects_missing_digit() {
        assert!(validate_password_strength("Strong!Pass").is_err());
    }

    #[test]
    fn test_rejects_all_lowercase() {
        assert!(validate_password_strength("weak!1pass").is_err());
    }
}
