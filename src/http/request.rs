use std::collections::HashMap;
use std::path::PathBuf;

/// HTTP request methods the server recognises.
///
/// Only `GET` is implemented; the others are named so the dispatcher can log
/// an unimplemented method differently from garbage in the method slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive, as the method token is.
    ///
    /// ```
    /// # use staticd::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn is_implemented(&self) -> bool {
        matches!(self, Method::GET)
    }
}

/// One request read off a connection.
///
/// Tokens are kept exactly as received; a request whose request line could
/// not be split into three tokens carries an `error` and is answered with a
/// 400 by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Method token, e.g. `GET`. Empty if missing.
    pub method: String,
    /// URI token as received, e.g. `/index.html`.
    pub uri: String,
    /// Document root concatenated with `uri`.
    pub full_path: PathBuf,
    /// Protocol version token, e.g. `HTTP/1.1`.
    pub version: String,
    /// Header fields. Keys keep their case; a repeated key keeps the last value.
    pub headers: HashMap<String, String>,
    /// The raw request line.
    pub request_line: String,
    /// Why the request line could not be parsed.
    pub error: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URI and resolves it against `root` without normalisation.
    pub fn set_uri(&mut self, root: &str, uri: impl Into<String>) {
        self.uri = uri.into();
        self.full_path = PathBuf::from(format!("{}{}", root, self.uri));
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Marks the request as unparseable. The first error wins.
    pub fn invalidate(&mut self, reason: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(reason.into());
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// True only when the client sent exactly `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        self.header("Connection") == Some("keep-alive")
    }
}
