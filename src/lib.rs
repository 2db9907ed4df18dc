//! # Admin Page Kit
//!
//! Page-side utilities for a server-rendered admin interface:
//!
//! - **Resource loading**: scripts and stylesheets requested before the page
//!   is ready are queued, then injected once, in request order
//! - **Templates**: markup read from page elements and expanded with
//!   `<!--#KEY#-->` / `#KEY#` placeholders
//! - **translate**: positional `%s` substitution
//! - **CSRF wiring**: `X-CSRFToken` on unsafe, same-origin requests
//! - **Sort helpers**: `-key` ordering toggles and column indicator classes
//!
//! Everything hangs off one explicitly constructed [`PageKit`], which talks to
//! the page only through the [`Document`] capability trait.
//!
//! ```text
//! bootstrap → PageKit::new(doc) → load_* / add_template … → on_ready()
//!                  └── csrf_interceptor() → HttpClient::with_interceptor
//! ```

pub mod cookie;
pub mod csrf;
pub mod dom;
pub mod http;
pub mod loader;
pub mod ordering;
pub mod page;
pub mod template;
pub mod translate;

#[cfg(feature = "napi")]
pub mod bindings;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use csrf::{csrf_safe_method, CsrfInterceptor, Origin};
pub use dom::memory::MemoryDocument;
pub use dom::{Document, Location};
pub use crate::http::{HttpClient, Request, RequestInterceptor, Response, Transport};
pub use loader::{ResourceKind, ResourceLoader};
pub use ordering::{get_order_by, set_order_by_classes};
pub use page::PageKit;
pub use template::TemplateRegistry;

// ---------------------------------------------------------------------------
// PageOptions
// ---------------------------------------------------------------------------

/// Names and attribute values used by the kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageOptions {
    /// Cookie holding the CSRF token.
    pub csrf_cookie_name: String,
    /// Header the token is sent in.
    pub csrf_header_name: String,
    /// `type` attribute of injected `<script>` elements.
    pub script_type: String,
    /// `type` attribute of injected `<link>` elements.
    pub stylesheet_type: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            csrf_cookie_name: "csrftoken".into(),
            csrf_header_name: "X-CSRFToken".into(),
            script_type: "text/javascript".into(),
            stylesheet_type: "text/css".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// PageError
// ---------------------------------------------------------------------------

/// Errors surfaced by the kit. None of them are fatal to the page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Don't know how to load item of type {0}")]
    UnknownResourceKind(String),

    #[error("Invalid page location `{0}`")]
    InvalidLocation(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
