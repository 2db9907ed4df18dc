//! The page service.
//!
//! [`PageKit`] bundles the loader, the template registry and the page
//! [`Document`]. The page bootstrap builds exactly one, hands it (or an `Arc`
//! of it) to whatever needs it, and calls [`PageKit::on_ready`] once the DOM
//! is ready.

use std::fmt;

use log::warn;
use serde_json::{Map, Value};

use crate::cookie;
use crate::csrf::{self, CsrfInterceptor, Origin};
use crate::dom::Document;
use crate::loader::{ResourceKind, ResourceLoader};
use crate::ordering;
use crate::template::TemplateRegistry;
use crate::translate;
use crate::{PageError, PageOptions};

pub struct PageKit<D> {
    doc: D,
    options: PageOptions,
    loader: ResourceLoader,
    templates: TemplateRegistry,
}

impl<D: fmt::Debug> fmt::Debug for PageKit<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageKit")
            .field("doc", &self.doc)
            .field("options", &self.options)
            .field("templates", &self.templates.len())
            .finish()
    }
}

impl<D: Document> PageKit<D> {
    pub fn new(doc: D) -> Self {
        Self::with_options(doc, PageOptions::default())
    }

    pub fn with_options(doc: D, options: PageOptions) -> Self {
        Self {
            loader: ResourceLoader::new(&options),
            templates: TemplateRegistry::new(),
            doc,
            options,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn options(&self) -> &PageOptions {
        &self.options
    }

    pub fn loader(&self) -> &ResourceLoader {
        &self.loader
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// Seed the loaded-items set and flush everything queued so far.
    pub fn on_ready(&self) {
        self.loader.mark_ready(&self.doc);
    }

    pub fn is_ready(&self) -> bool {
        self.loader.is_ready()
    }

    pub fn load_resource(&self, kind: ResourceKind, url: &str) {
        self.loader.load(&self.doc, kind, url);
    }

    /// Like [`load_resource`](Self::load_resource) with a kind name
    /// (`script`, `javascript`, `css`, `stylesheet`).
    ///
    /// Unknown kinds alert the user and leave all state untouched.
    pub fn load_resource_named(&self, kind: &str, url: &str) -> Result<(), PageError> {
        match kind.parse::<ResourceKind>() {
            Ok(kind) => {
                self.load_resource(kind, url);
                Ok(())
            }
            Err(err) => {
                let message = if self.is_ready() {
                    err.to_string()
                } else {
                    format!("{} once", err)
                };
                warn!("{} (url: {})", message, url);
                self.doc.alert(&message);
                Err(err)
            }
        }
    }

    pub fn load_script(&self, url: &str) {
        self.load_resource(ResourceKind::Script, url);
    }

    pub fn load_stylesheet(&self, url: &str) {
        self.load_resource(ResourceKind::Stylesheet, url);
    }

    // -----------------------------------------------------------------------
    // Templates and text
    // -----------------------------------------------------------------------

    /// Register the inner markup of `selector` as template `name`.
    pub fn add_template(&self, name: &str, selector: &str) {
        self.templates.add_from(&self.doc, name, selector);
    }

    pub fn expand_template(&self, name: &str, data: &Map<String, Value>) -> String {
        self.templates.expand(name, data)
    }

    pub fn translate(&self, key: &str, args: &[&dyn fmt::Display]) -> String {
        translate::translate(key, args)
    }

    // -----------------------------------------------------------------------
    // Cookies and CSRF
    // -----------------------------------------------------------------------

    pub fn get_cookie(&self, name: &str) -> Option<String> {
        cookie::get_cookie(&self.doc.cookie(), name)
    }

    pub fn csrf_safe_method(&self, method: &str) -> bool {
        csrf::csrf_safe_method(method)
    }

    pub fn same_origin(&self, url: &str) -> bool {
        Origin::new(&self.doc.location()).same_origin(url)
    }

    /// Interceptor to register on the page's HTTP client.
    pub fn csrf_interceptor(&self) -> Result<CsrfInterceptor<D>, PageError>
    where
        D: Clone,
    {
        CsrfInterceptor::new(self.doc.clone(), &self.options)
    }

    // -----------------------------------------------------------------------
    // Sorting
    // -----------------------------------------------------------------------

    pub fn get_order_by(&self, old_order: &str, new_order: &str) -> String {
        ordering::get_order_by(old_order, new_order)
    }

    pub fn set_order_by_classes(&self, elem: &D::Element, list: &[D::Element], order_key: &str) {
        ordering::set_order_by_classes(&self.doc, elem, list, order_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryDocument;
    use crate::dom::Location;

    fn kit() -> PageKit<MemoryDocument> {
        PageKit::new(MemoryDocument::new(Location::new("http:", "example.com")))
    }

    #[test]
    fn unknown_kind_before_ready_alerts_with_once() {
        let kit = kit();
        let err = kit.load_resource_named("font", "/f.woff").unwrap_err();
        assert_eq!(err, PageError::UnknownResourceKind("font".into()));
        assert_eq!(
            kit.document().alerts(),
            vec!["Don't know how to load item of type font once"]
        );
        assert!(kit.loader().pending(ResourceKind::Script).is_empty());
        assert!(kit.loader().pending(ResourceKind::Stylesheet).is_empty());
    }

    #[test]
    fn unknown_kind_after_ready_alerts() {
        let kit = kit();
        kit.on_ready();
        assert!(kit.load_resource_named("font", "/f.woff").is_err());
        assert_eq!(
            kit.document().alerts(),
            vec!["Don't know how to load item of type font"]
        );
        assert!(!kit.loader().is_loaded("/f.woff"));
    }

    #[test]
    fn javascript_alias_queues_before_ready() {
        let kit = kit();
        kit.load_resource_named("javascript", "/a.js").unwrap();
        assert_eq!(kit.loader().pending(ResourceKind::Script), vec!["/a.js"]);
        assert!(kit.document().alerts().is_empty());
    }

    #[test]
    fn get_cookie_reads_document() {
        let kit = kit();
        assert_eq!(kit.get_cookie("csrftoken"), None);
        kit.document().set_cookie("csrftoken=t0k");
        assert_eq!(kit.get_cookie("csrftoken"), Some("t0k".into()));
    }

    #[test]
    fn same_origin_uses_document_location() {
        let kit = kit();
        assert!(kit.same_origin("http://example.com/x"));
        assert!(!kit.same_origin("http://evil.com"));
    }
}
