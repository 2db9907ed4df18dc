//! Positional `%s` substitution.
//!
//! There is no catalogue lookup: the key is the message. Each `%s` takes the
//! next argument; missing arguments leave nothing behind and extra ones are
//! dropped.

use std::fmt;

use serde_json::Value;

/// Replace each `%s` in `key` with the next argument.
pub fn translate(key: &str, args: &[&dyn fmt::Display]) -> String {
    if args.is_empty() {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut args = args.iter();
    let mut pieces = key.split("%s");
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        if let Some(arg) = args.next() {
            out.push_str(&arg.to_string());
        }
        out.push_str(piece);
    }
    out
}

/// [`translate`] over JSON arguments, as they arrive from script callers.
///
/// Strings are used unquoted; any other value is written as JSON.
pub fn translate_values(key: &str, args: &[Value]) -> String {
    let args: Vec<String> = args
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let args: Vec<&dyn fmt::Display> = args.iter().map(|a| a as &dyn fmt::Display).collect();
    translate(key, &args)
}

/// `translate!("Hello %s, you have %s items", name, count)`
#[macro_export]
macro_rules! translate {
    ($key:expr $(,)?) => {
        $crate::translate::translate($key, &[])
    };
    ($key:expr, $($arg:expr),+ $(,)?) => {
        $crate::translate::translate($key, &[$(&$arg as &dyn ::std::fmt::Display),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn key_only_is_returned_unchanged() {
        assert_eq!(translate("Save %s", &[]), "Save %s");
        assert_eq!(translate("", &[]), "");
    }

    #[test]
    fn substitutes_in_order() {
        assert_eq!(
            crate::translate!("Hello %s, you have %s items", "Ann", 3),
            "Hello Ann, you have 3 items"
        );
    }

    #[test]
    fn missing_args_become_empty() {
        assert_eq!(crate::translate!("Hi %s %s", "Ann"), "Hi Ann ");
    }

    #[test]
    fn extra_args_are_ignored() {
        assert_eq!(crate::translate!("%s!", "a", "b", "c"), "a!");
    }

    #[test]
    fn adjacent_tokens() {
        assert_eq!(crate::translate!("%s%s", 1, 2), "12");
    }

    #[test]
    fn json_arguments_keep_strings_unquoted() {
        let args = [json!("Ann"), json!(3), json!(true), json!(null)];
        assert_eq!(
            translate_values("%s has %s items (%s, %s)", &args),
            "Ann has 3 items (true, null)"
        );
        assert_eq!(translate_values("Hi %s", &[]), "Hi %s");
    }

    #[test]
    fn no_tokens_with_args() {
        assert_eq!(crate::translate!("plain", "x"), "plain");
    }
}
