//! `document.cookie` parsing.

/// Value of cookie `name` in a `document.cookie`-style string.
///
/// Segments are `;`-separated and trimmed. The first segment that starts
/// with exactly `name=` wins; its value is percent-decoded, falling back to
/// the raw text when it does not decode to UTF-8.
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    let prefix = format!("{}=", name);
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store() {
        assert_eq!(get_cookie("", "csrftoken"), None);
    }

    #[test]
    fn finds_exact_name() {
        assert_eq!(
            get_cookie("foo=bar; csrftoken=abc123", "csrftoken"),
            Some("abc123".into())
        );
    }

    #[test]
    fn longer_name_is_not_a_match() {
        assert_eq!(get_cookie("csrftokenX=zzz", "csrftoken"), None);
        assert_eq!(
            get_cookie("csrftokenX=zzz; csrftoken=ok", "csrftoken"),
            Some("ok".into())
        );
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(get_cookie("a=1; a=2", "a"), Some("1".into()));
    }

    #[test]
    fn values_are_percent_decoded() {
        assert_eq!(
            get_cookie("next=%2Fadmin%2F%3Fq%3D1", "next"),
            Some("/admin/?q=1".into())
        );
    }

    #[test]
    fn undecodable_value_is_returned_raw() {
        assert_eq!(get_cookie("bad=%FF", "bad"), Some("%FF".into()));
    }

    #[test]
    fn empty_value() {
        assert_eq!(get_cookie("flag=", "flag"), Some(String::new()));
    }
}
