//! Deferred script and stylesheet loading.
//!
//! Before the page is ready, requested URLs are queued per kind. On ready the
//! loader records every `<script src>` / `<link href>` already in the page and
//! then flushes both queues in request order. After ready, requests inject a
//! tag straight away unless the URL is already loaded.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use dashmap::DashSet;
use log::debug;

use crate::dom::Document;
use crate::{PageError, PageOptions};

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `<script src>`, appended to the body.
    Script,
    /// `<link rel="stylesheet" href>`, appended to the head.
    Stylesheet,
}

impl FromStr for ResourceKind {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" | "javascript" => Ok(Self::Script),
            "css" | "stylesheet" => Ok(Self::Stylesheet),
            other => Err(PageError::UnknownResourceKind(other.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => f.write_str("script"),
            Self::Stylesheet => f.write_str("stylesheet"),
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceLoader
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PendingLoads {
    ready: bool,
    scripts: Vec<String>,
    stylesheets: Vec<String>,
}

/// Loaded-items set plus the pre-ready queues.
///
/// The ready flag lives under the same lock as the queues, so a request can
/// never be queued after the queues were drained.
#[derive(Debug)]
pub struct ResourceLoader {
    loaded: DashSet<String>,
    pending: Mutex<PendingLoads>,
    script_type: String,
    stylesheet_type: String,
}

impl ResourceLoader {
    pub fn new(options: &PageOptions) -> Self {
        Self {
            loaded: DashSet::new(),
            pending: Mutex::new(PendingLoads::default()),
            script_type: options.script_type.clone(),
            stylesheet_type: options.stylesheet_type.clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.pending.lock().expect("loader queue poisoned").ready
    }

    /// Whether `url` is known to be present in the page.
    pub fn is_loaded(&self, url: &str) -> bool {
        self.loaded.contains(url)
    }

    /// URLs still waiting for the page to become ready.
    pub fn pending(&self, kind: ResourceKind) -> Vec<String> {
        let pending = self.pending.lock().expect("loader queue poisoned");
        match kind {
            ResourceKind::Script => pending.scripts.clone(),
            ResourceKind::Stylesheet => pending.stylesheets.clone(),
        }
    }

    /// Queue `url` before ready, inject it after.
    pub fn load<D: Document>(&self, doc: &D, kind: ResourceKind, url: &str) {
        {
            let mut pending = self.pending.lock().expect("loader queue poisoned");
            if !pending.ready {
                debug!("queueing {} {} until the page is ready", kind, url);
                match kind {
                    ResourceKind::Script => pending.scripts.push(url.to_string()),
                    ResourceKind::Stylesheet => pending.stylesheets.push(url.to_string()),
                }
                return;
            }
        }
        self.inject(doc, kind, url);
    }

    /// Flip to ready, record what the page already has, then flush the
    /// queues. Scripts go first, each queue in request order.
    pub fn mark_ready<D: Document>(&self, doc: &D) {
        let (scripts, stylesheets) = {
            let mut pending = self.pending.lock().expect("loader queue poisoned");
            pending.ready = true;
            (
                std::mem::take(&mut pending.scripts),
                std::mem::take(&mut pending.stylesheets),
            )
        };

        for script in doc.query_selector_all("script") {
            self.loaded
                .insert(doc.get_attribute(&script, "src").unwrap_or_default());
        }
        for link in doc.query_selector_all("link") {
            self.loaded
                .insert(doc.get_attribute(&link, "href").unwrap_or_default());
        }

        debug!(
            "page ready: {} resources present, flushing {} scripts and {} stylesheets",
            self.loaded.len(),
            scripts.len(),
            stylesheets.len()
        );

        for url in &scripts {
            self.inject(doc, ResourceKind::Script, url);
        }
        for url in &stylesheets {
            self.inject(doc, ResourceKind::Stylesheet, url);
        }
    }

    fn inject<D: Document>(&self, doc: &D, kind: ResourceKind, url: &str) {
        if !self.loaded.insert(url.to_string()) {
            return;
        }

        match kind {
            ResourceKind::Stylesheet => {
                let link = doc.create_element("link");
                doc.set_attribute(&link, "href", url);
                doc.set_attribute(&link, "type", &self.stylesheet_type);
                doc.set_attribute(&link, "rel", "stylesheet");
                doc.append_child(&doc.head(), &link);
            }
            ResourceKind::Script => {
                let script = doc.create_element("script");
                doc.set_attribute(&script, "src", url);
                doc.set_attribute(&script, "type", &self.script_type);
                doc.append_child(&doc.body(), &script);
            }
        }
        debug!("injected {} {}", kind, url);
    }
}
