//! CSRF header injection for same-origin requests.
//!
//! Unsafe methods sent to the page's own origin carry the `csrftoken` cookie
//! back in `X-CSRFToken`. Safe methods and cross-origin URLs are untouched.

use http::header::{HeaderName, HeaderValue};
use log::{debug, warn};

use crate::cookie::get_cookie;
use crate::dom::{Document, Location};
use crate::http::{Request, RequestInterceptor};
use crate::{PageError, PageOptions};

/// Methods that never carry the CSRF header. Case-sensitive.
pub fn csrf_safe_method(method: &str) -> bool {
    matches!(method, "GET" | "HEAD" | "OPTIONS" | "TRACE")
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// The page origin in both absolute and scheme-relative form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// `protocol//host`
    absolute: String,
    /// `//host`
    scheme_relative: String,
}

impl Origin {
    pub fn new(location: &Location) -> Self {
        let scheme_relative = format!("//{}", location.host);
        Self {
            absolute: format!("{}{}", location.protocol, scheme_relative),
            scheme_relative,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.absolute
    }

    /// Whether a request to `url` stays on this origin.
    ///
    /// Absolute and scheme-relative URLs must be the origin itself or the
    /// origin followed by `/`. Anything else that doesn't start with `//`,
    /// `http:` or `https:` is relative and therefore same-origin.
    pub fn same_origin(&self, url: &str) -> bool {
        let under = |base: &str| {
            url == base
                || url
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with('/'))
        };
        under(&self.absolute)
            || under(&self.scheme_relative)
            || !(url.starts_with("//") || url.starts_with("http:") || url.starts_with("https:"))
    }
}

// ---------------------------------------------------------------------------
// CsrfInterceptor
// ---------------------------------------------------------------------------

/// Adds the CSRF header to unsafe, same-origin requests.
///
/// Location and cookie are read from the document on every request, so a
/// token rotated after construction is still picked up.
#[derive(Debug, Clone)]
pub struct CsrfInterceptor<D> {
    doc: D,
    cookie_name: String,
    header_name: HeaderName,
}

impl<D: Document> CsrfInterceptor<D> {
    /// Fails when the configured header name is not a valid HTTP header name.
    pub fn new(doc: D, options: &PageOptions) -> Result<Self, PageError> {
        let header_name = HeaderName::from_bytes(options.csrf_header_name.as_bytes())
            .map_err(|_| PageError::InvalidHeader(options.csrf_header_name.clone()))?;
        Ok(Self {
            doc,
            cookie_name: options.csrf_cookie_name.clone(),
            header_name,
        })
    }
}

impl<D: Document + Send + Sync> RequestInterceptor for CsrfInterceptor<D> {
    fn before_send(&self, request: &mut Request) {
        if csrf_safe_method(request.method.as_str()) {
            return;
        }
        if !Origin::new(&self.doc.location()).same_origin(&request.url) {
            return;
        }
        let Some(token) = get_cookie(&self.doc.cookie(), &self.cookie_name) else {
            debug!(
                "no {} cookie, sending {} {} without {}",
                self.cookie_name, request.method, request.url, self.header_name
            );
            return;
        };
        match HeaderValue::from_str(&token) {
            Ok(value) => request.set_header(self.header_name.clone(), value),
            Err(_) => warn!(
                "{} cookie is not a valid header value, sending {} {} without {}",
                self.cookie_name, request.method, request.url, self.header_name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryDocument;
    use http::Method;

    fn origin() -> Origin {
        Origin::new(&Location::new("http:", "example.com"))
    }

    #[test]
    fn safe_methods() {
        for m in ["GET", "HEAD", "OPTIONS", "TRACE"] {
            assert!(csrf_safe_method(m), "{m} should be safe");
        }
        for m in ["POST", "PUT", "PATCH", "DELETE", "get"] {
            assert!(!csrf_safe_method(m), "{m} should not be safe");
        }
    }

    #[test]
    fn absolute_urls() {
        let o = origin();
        assert!(o.same_origin("http://example.com"));
        assert!(o.same_origin("http://example.com/path"));
        assert!(!o.same_origin("http://evil.com"));
        assert!(!o.same_origin("https://example.com/path"));
        assert!(!o.same_origin("http://example.com.evil.com/"));
        assert!(!o.same_origin("http://example.com:8080/"));
    }

    #[test]
    fn scheme_relative_urls() {
        let o = origin();
        assert!(o.same_origin("//example.com"));
        assert!(o.same_origin("//example.com/x"));
        assert!(!o.same_origin("//evil.com/x"));
    }

    #[test]
    fn relative_urls() {
        let o = origin();
        assert!(o.same_origin("/relative/path"));
        assert!(o.same_origin("relative/path"));
        assert!(o.same_origin("?page=2"));
        assert!(o.same_origin(""));
    }

    #[test]
    fn origin_string_includes_port() {
        let o = Origin::new(&Location::new("https:", "admin.local:8443"));
        assert_eq!(o.as_str(), "https://admin.local:8443");
        assert!(o.same_origin("https://admin.local:8443/api/"));
        assert!(!o.same_origin("https://admin.local/api/"));
    }

    #[test]
    fn interceptor_sets_token_on_unsafe_same_origin() {
        let doc = MemoryDocument::new(Location::new("http:", "example.com"))
            .with_cookie("sessionid=s; csrftoken=abc123");
        let csrf = CsrfInterceptor::new(doc, &PageOptions::default()).unwrap();

        let mut post = Request::new(Method::POST, "/save/");
        csrf.before_send(&mut post);
        assert_eq!(post.header("X-CSRFToken"), Some("abc123"));

        let mut get = Request::new(Method::GET, "/list/");
        csrf.before_send(&mut get);
        assert_eq!(get.header("X-CSRFToken"), None);

        let mut foreign = Request::new(Method::POST, "https://other.org/hook");
        csrf.before_send(&mut foreign);
        assert_eq!(foreign.header("X-CSRFToken"), None);
    }

    #[test]
    fn interceptor_without_cookie_leaves_request_alone() {
        let doc = MemoryDocument::new(Location::new("http:", "example.com"));
        let csrf = CsrfInterceptor::new(doc, &PageOptions::default()).unwrap();
        let mut post = Request::new(Method::DELETE, "/item/1/");
        csrf.before_send(&mut post);
        assert!(post.headers.is_empty());
    }

    #[test]
    fn token_with_line_breaks_is_not_sent() {
        let doc = MemoryDocument::new(Location::new("http:", "example.com"))
            .with_cookie("csrftoken=abc%0D%0AX-Evil%3A%201");
        let csrf = CsrfInterceptor::new(doc, &PageOptions::default()).unwrap();
        let mut post = Request::new(Method::POST, "/save/");
        csrf.before_send(&mut post);
        assert!(post.headers.is_empty());
        assert_eq!(post.header("X-Evil"), None);
    }

    #[test]
    fn invalid_header_name_is_rejected_up_front() {
        let doc = MemoryDocument::new(Location::new("http:", "example.com"));
        let options = PageOptions {
            csrf_header_name: "X CSRF".into(),
            ..Default::default()
        };
        let err = CsrfInterceptor::new(doc, &options).unwrap_err();
        assert_eq!(err, PageError::InvalidHeader("X CSRF".into()));
    }
}
