//! Canonicalization of free-text comparison fields
//!
//! Normalization is pure and total: identical raw values always normalize
//! identically, and malformed input falls back to an empty canonical value
//! instead of failing.

/// Normalize a phone number into a comparable `+<digits>` form.
///
/// Strips everything but digits, converts a leading `00` to `+`, and
/// prefixes `default_country` when the number carries no international
/// prefix at all. Input with no digits normalizes to the empty string.
pub fn normalize_phone(raw: &str, default_country: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        if !raw.trim().is_empty() {
            log::warn!("phone '{}' has no digits, normalizing to empty", raw.trim());
        }
        return String::new();
    }

    if raw.trim_start().starts_with('+') {
        return format!("+{}", digits);
    }
    if let Some(rest) = digits.strip_prefix("00") {
        if rest.is_empty() {
            return String::new();
        }
        return format!("+{}", rest);
    }
    format!("+{}{}", default_country, digits)
}

/// Lower-cased domain part of an email address (after the last `@`),
/// or the empty string when no `@` is present.
pub fn extract_email_domain(raw: &str) -> String {
    match raw.rfind('@') {
        Some(pos) => raw[pos + 1..].trim().to_lowercase(),
        None => String::new(),
    }
}

/// Lower-cased local part of an email address (before the last `@`),
/// or the empty string when no `@` is present.
pub fn email_local_part(raw: &str) -> String {
    match raw.rfind('@') {
        Some(pos) => raw[..pos].trim().to_lowercase(),
        None => String::new(),
    }
}

/// Whether two email domains should be treated as the same mail provider.
///
/// True when equal (case-insensitive) or when the pair appears in `table`
/// in either order.
pub fn domains_related(a: &str, b: &str, table: &[(String, String)]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    table.iter().any(|(x, y)| {
        (x.eq_ignore_ascii_case(a) && y.eq_ignore_ascii_case(b))
            || (x.eq_ignore_ascii_case(b) && y.eq_ignore_ascii_case(a))
    })
}
