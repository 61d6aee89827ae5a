//! Text utilities shared across the workspace.

use std::sync::OnceLock;

use regex::Regex;

/// Returns `true` if `name` is a valid field or table identifier:
/// non-empty and consisting only of `[0-9A-Za-z_]`.
///
/// # Examples
///
/// ```
/// use schemaform_core::utils::is_valid_identifier;
///
/// assert!(is_valid_identifier("first_name"));
/// assert!(is_valid_identifier("a1"));
/// assert!(!is_valid_identifier("first-name"));
/// assert!(!is_valid_identifier(""));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| Regex::new(r"^[0-9A-Za-z_]+$").unwrap());
    ident.is_match(name)
}

/// Derives a display label from a field name: splits on underscores and
/// capitalizes each word.
///
/// # Examples
///
/// ```
/// use schemaform_core::utils::label_from_name;
///
/// assert_eq!(label_from_name("first_name"), "First Name");
/// assert_eq!(label_from_name("age"), "Age");
/// ```
pub fn label_from_name(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(capfirst)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalizes the first character of a string, lowercasing the rest.
///
/// # Examples
///
/// ```
/// use schemaform_core::utils::capfirst;
///
/// assert_eq!(capfirst("hello"), "Hello");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("name"));
        assert!(is_valid_identifier("field_2"));
        assert!(is_valid_identifier("_private"));
        assert!(!is_valid_identifier("with space"));
        assert!(!is_valid_identifier("dotted.name"));
        assert!(!is_valid_identifier("dash-ed"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_label_from_name() {
        assert_eq!(label_from_name("first_name"), "First Name");
        assert_eq!(label_from_name("name"), "Name");
        assert_eq!(label_from_name("a__b"), "A B");
        assert_eq!(label_from_name("mysex"), "Mysex");
    }

    #[test]
    fn test_capfirst() {
        assert_eq!(capfirst("hello"), "Hello");
        assert_eq!(capfirst("HELLO"), "Hello");
        assert_eq!(capfirst("h"), "H");
    }
}
