//! Fetch Model
//!
//! Requests and responses as they cross the interception boundary, plus the
//! `Network` binding the host provides for real fetches.

use std::collections::BTreeMap;
use std::fmt;

/// HTTP request method. Only GETs are ever answered from or written to a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Head,
    Post,
}

impl RequestMethod {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
        }
    }
}

/// Request mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Sub-resource fetch
    #[default]
    Cors,
    /// Top-level or frame navigation
    Navigate,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Full request URL, fragment included when the host supplies it.
    pub url: String,
    /// HTTP method
    pub method: RequestMethod,
    /// Request mode
    pub mode: RequestMode,
}

impl Request {
    /// Create a GET sub-resource request.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::Get,
            mode: RequestMode::Cors,
        }
    }

    /// Create a top-level document navigation.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::new(url)
        }
    }

    /// Builder-style method override.
    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    /// Whether this is a document navigation.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Indicates where a response originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// The versioned static-asset generation.
    StaticCache,
    /// The dynamic network-fill cache.
    DynamicCache,
    /// The network.
    #[default]
    Network,
    /// Synthesised by the worker itself (204 after relay, 503 offline, ...).
    Worker,
}

/// A response handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
    /// Where this response came from
    pub source: ResponseSource,
}

impl Response {
    /// Create a new response
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
            source: ResponseSource::Network,
        }
    }

    /// A 200 response with the given body.
    pub fn ok_with_body(body: impl Into<Vec<u8>>) -> Self {
        let mut response = Self::new(200);
        response.body = body.into();
        response
    }

    /// The "handled, do not open a window" answer to a relayed navigation.
    pub fn no_content() -> Self {
        let mut response = Self::new(204);
        response.source = ResponseSource::Worker;
        response
    }

    /// Builder-style header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style source tag.
    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }
}

/// Network-level fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The host reports no connectivity.
    Offline,
    /// The host's own deadline elapsed.
    Timeout,
    /// Any other transport failure.
    Failed(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Offline => write!(f, "network unavailable"),
            NetworkError::Timeout => write!(f, "network request timed out"),
            NetworkError::Failed(reason) => write!(f, "network request failed: {}", reason),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Network binding implemented by the host.
pub trait Network: Send + Sync {
    /// Whether a network fetch would plausibly succeed right now.
    fn is_online(&self) -> bool;

    /// Perform the fetch. Non-2xx statuses are `Ok` responses, not errors.
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
