use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]{3,80}$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Расчётный период: месяц 1..=12, год в разумных пределах
pub fn validate_period(month: u32, year: i32) -> bool {
    (1..=12).contains(&month) && (2000..=2100).contains(&year)
}

pub fn validate_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("operator1"));
        assert!(validate_username("ivan.petrov"));
        assert!(!validate_username("ab"));
        assert!(!validate_username("имя"));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com"));
        assert!(validate_email("user.name@domain.co.kz"));
        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn test_validate_period() {
        assert!(validate_period(3, 2024));
        assert!(validate_period(12, 2024));
        assert!(!validate_period(0, 2024));
        assert!(!validate_period(13, 2024));
        assert!(!validate_period(3, 1999));
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::new(50000, 2)));
        assert!(!validate_amount(Decimal::ZERO));
        assert!(!validate_amount(Decimal::from(-10)));
    }
}
