//! Named markup templates with `#KEY#` placeholders.
//!
//! Templates are captured from the inner markup of page elements (usually a
//! `<script type="text/template">` block) and expanded in two passes:
//! `<!--#KEY#-->` first, then bare `#KEY#`. Keys are looked up lowercased.
//! Unknown keys keep their placeholder text.

use std::sync::OnceLock;

use dashmap::DashMap;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::dom::Document;

fn comment_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<!--#([^#]+)#-->").expect("valid comment placeholder regex"))
}

fn bare_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([^#]+)#").expect("valid bare placeholder regex"))
}

/// Text a data value contributes to an expanded template.
///
/// Follows browser string coercion: arrays join their items with `,` (null
/// items render empty) and objects render as `[object Object]`.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => render_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

fn substitute(re: &Regex, input: &str, data: &Map<String, Value>) -> String {
    re.replace_all(input, |caps: &Captures| {
        let key = caps[1].to_lowercase();
        match data.get(&key) {
            Some(value) => render_value(value),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// Expand `template` against `data`.
///
/// Only the placeholder key is lowercased; data keys are matched as given,
/// so a mixed-case data key never matches.
pub fn expand(template: &str, data: &Map<String, Value>) -> String {
    let html = substitute(comment_placeholder(), template, data);
    substitute(bare_placeholder(), &html, data)
}

// ---------------------------------------------------------------------------
// TemplateRegistry
// ---------------------------------------------------------------------------

/// Template name → raw markup. Last write wins.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: DashMap<String, String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, markup: impl Into<String>) {
        self.templates.insert(name.to_string(), markup.into());
    }

    /// Capture the inner markup of the element matching `selector`.
    /// A missing element registers an empty template.
    pub fn add_from<D: Document>(&self, doc: &D, name: &str, selector: &str) {
        let markup = doc
            .query_selector(selector)
            .map(|el| doc.inner_html(&el))
            .unwrap_or_default();
        self.insert(name, markup);
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.templates.get(name).map(|r| r.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Expand a registered template. Unregistered names expand to `""`.
    pub fn expand(&self, name: &str, data: &Map<String, Value>) -> String {
        let template = self.get(name).unwrap_or_default();
        expand(&template, data)
    }
}
