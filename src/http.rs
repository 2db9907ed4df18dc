//! Request building with interceptors.
//!
//! An [`HttpClient`] owns a [`Transport`] and an ordered list of
//! [`RequestInterceptor`]s. Every request sent through the client passes
//! through each interceptor before the transport sees it. Methods and
//! headers use the `http` crate types, so names and values are validated.

use std::fmt;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use log::debug;

use crate::PageError;

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Target as the page script wrote it; may be relative.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Header value as text, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing any existing value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Hook run on every outgoing request.
pub trait RequestInterceptor: Send + Sync {
    fn before_send(&self, request: &mut Request);
}

/// Whatever actually moves bytes.
pub trait Transport {
    fn send(&self, request: Request) -> Result<Response, PageError>;
}

// ---------------------------------------------------------------------------
// HttpClient
// ---------------------------------------------------------------------------

pub struct HttpClient<T> {
    transport: T,
    interceptors: Vec<Box<dyn RequestInterceptor>>,
}

impl<T: fmt::Debug> fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &self.transport)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder<'_, T> {
        RequestBuilder {
            client: self,
            request: Request::new(method, url),
            error: None,
        }
    }

    /// Run every interceptor over `request`, in registration order.
    pub fn prepare(&self, mut request: Request) -> Request {
        for interceptor in &self.interceptors {
            interceptor.before_send(&mut request);
        }
        request
    }

    pub fn send(&self, request: Request) -> Result<Response, PageError> {
        let request = self.prepare(request);
        debug!("{} {}", request.method, request.url);
        self.transport.send(request)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

// ---------------------------------------------------------------------------
// RequestBuilder
// ---------------------------------------------------------------------------

/// Collects the first header error and reports it from `build`/`send`.
pub struct RequestBuilder<'a, T> {
    client: &'a HttpClient<T>,
    request: Request,
    error: Option<PageError>,
}

impl<T: Transport> RequestBuilder<'_, T> {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| PageError::InvalidHeader(name.to_string()));
        let value = HeaderValue::from_str(value)
            .map_err(|_| PageError::InvalidHeader(format!("value for {}", value.escape_debug())));
        match (name, value) {
            (Ok(name), Ok(value)) => self.request.set_header(name, value),
            (Err(err), _) | (_, Err(err)) => self.error = Some(err),
        }
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// The request as the transport would receive it.
    pub fn build(self) -> Result<Request, PageError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.client.prepare(self.request)),
        }
    }

    pub fn send(self) -> Result<Response, PageError> {
        match self.error {
            Some(err) => Err(err),
            None => self.client.send(self.request),
        }
    }
}
