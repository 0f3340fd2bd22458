use std::sync::OnceLock;

use regex::Regex;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?\d{10,15}$").unwrap())
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

/// A structural check only. Deliverability is not verified.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Strips spaces, dashes and brackets from a phone number and checks that what remains is 10 to 15 digits, optionally
/// preceded by `+`.
pub fn clean_phone_number(phone: &str) -> Result<String, String> {
    let cleaned = phone.chars().filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')'))).collect::<String>();
    if phone_regex().is_match(&cleaned) {
        Ok(cleaned)
    } else {
        Err(format!("'{phone}' is not a valid phone number"))
    }
}

/// Returns the trimmed value, or an error naming the field if it is missing or blank.
pub fn require_text(field: &str, value: Option<&str>) -> Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{field} is required")),
    }
}
