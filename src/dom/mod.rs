//! DOM capability interface.
//!
//! The kit never touches a live document directly. Everything it needs from
//! the page (element lookup, attribute writes, cookies, location, alerts)
//! goes through [`Document`], so the loader and template logic run the same
//! against a browser binding or the in-memory [`memory::MemoryDocument`].

pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::PageError;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The subset of a page document the kit relies on.
///
/// Methods take `&self`: handles are expected to be cheap references into a
/// document that manages its own mutation, the way browser bindings work.
pub trait Document {
    /// Handle to one element of the document.
    type Element: Clone + fmt::Debug;

    /// All elements matching `selector`, in document order.
    ///
    /// Implementations must support `#id`, `.class` and bare tag selectors.
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;

    /// First element matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<Self::Element> {
        self.query_selector_all(selector).into_iter().next()
    }

    fn head(&self) -> Self::Element;

    fn body(&self) -> Self::Element;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Self::Element;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

    fn get_attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    fn append_child(&self, parent: &Self::Element, child: &Self::Element);

    /// Serialized markup of the element's children.
    fn inner_html(&self, element: &Self::Element) -> String;

    fn add_class(&self, element: &Self::Element, class: &str);

    fn remove_class(&self, element: &Self::Element, class: &str);

    /// The raw `document.cookie` string (`a=1; b=2`).
    fn cookie(&self) -> String;

    /// Where the page was loaded from.
    fn location(&self) -> Location;

    /// Blocking, user-facing message.
    fn alert(&self, message: &str);
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Protocol and host of the page, as `window.location` reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Scheme with its trailing colon, e.g. `https:`.
    pub protocol: String,
    /// Host name plus port when the port is not the scheme default.
    pub host: String,
}

impl Location {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
        }
    }

    /// Derive the location from an absolute page URL.
    pub fn parse(page_url: &str) -> Result<Self, PageError> {
        let url =
            Url::parse(page_url).map_err(|_| PageError::InvalidLocation(page_url.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| PageError::InvalidLocation(page_url.to_string()))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::new(format!("{}:", url.scheme()), host))
    }

    /// `protocol//host`
    pub fn origin(&self) -> String {
        format!("{}//{}", self.protocol, self.host)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_host() {
        let loc = Location::parse("http://example.com/admin/").unwrap();
        assert_eq!(loc.protocol, "http:");
        assert_eq!(loc.host, "example.com");
        assert_eq!(loc.origin(), "http://example.com");
    }

    #[test]
    fn parse_keeps_non_default_port() {
        let loc = Location::parse("https://admin.local:8443/x").unwrap();
        assert_eq!(loc.host, "admin.local:8443");
        assert_eq!(loc.origin(), "https://admin.local:8443");
    }

    #[test]
    fn parse_drops_default_port() {
        let loc = Location::parse("https://example.com:443/").unwrap();
        assert_eq!(loc.host, "example.com");
    }

    #[test]
    fn parse_rejects_relative() {
        let err = Location::parse("/admin/").unwrap_err();
        assert!(matches!(err, PageError::InvalidLocation(_)));
    }
}
