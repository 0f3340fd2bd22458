use chrono::{DateTime, Duration, Utc};

/// Daraja timestamps are expressed in East Africa Time (UTC+3) with no separators.
pub fn daraja_timestamp(now: DateTime<Utc>) -> String {
    (now + Duration::hours(3)).format("%Y%m%d%H%M%S").to_string()
}

/// The STK push password: base64(shortcode + passkey + timestamp).
pub fn generate_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    base64::encode(format!("{shortcode}{passkey}{timestamp}"))
}

/// Normalises a Kenyan phone number into the `2547XXXXXXXX` form Daraja expects.
///
/// Spaces, dashes and brackets are stripped, a leading `+` is dropped, a leading `0` is replaced with the `254` country
/// code, and numbers without a country code get one prepended.
pub fn normalize_phone(phone: &str) -> String {
    let digits = phone.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '\t')).collect::<String>();
    let digits = digits.strip_prefix('+').unwrap_or(&digits);
    if let Some(local) = digits.strip_prefix('0') {
        format!("254{local}")
    } else if digits.starts_with("254") {
        digits.to_string()
    } else {
        format!("254{digits}")
    }
}
