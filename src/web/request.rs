//! Framework-neutral request representation.

use std::collections::BTreeMap;
use std::fmt;

use crate::secret::Secret;

/// HTTP method, as far as page controllers care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a page
    Get,
    /// Submit a form
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Decoded name/value pairs from a query string or a form body.
///
/// A repeated name keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Parses `application/x-www-form-urlencoded` text.
    ///
    /// ```
    /// use newsdesk::web::Params;
    ///
    /// let params = Params::parse("article=4&comments=show&q=hello+world");
    /// assert_eq!(params.get("q"), Some("hello world"));
    /// assert_eq!(params.integer("article"), Some(4));
    /// ```
    pub fn parse(encoded: &str) -> Self {
        Self(
            url::form_urlencoded::parse(encoded.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    /// Raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value for `name`, or `""` when absent.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Whether `name` was submitted at all (checkboxes, buttons).
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Value for `name` parsed as an integer; `None` unless fully numeric.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Value for `name` wrapped as a secret, `""` when absent.
    pub fn secret(&self, name: &str) -> Secret<String> {
        Secret::new(self.text(name).to_string())
    }

    /// Sets `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Whether no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A file attached to a form submission.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    /// Client-supplied file name
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Creates an upload.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// One incoming request.
///
/// Framework integrations build this from their own request type; the site
/// never sees anything framework-specific.
///
/// # Examples
///
/// ```
/// use newsdesk::web::{Method, Request};
///
/// let request = Request::post("/Account/Portal?next=1")
///     .with_form("username", "bobby")
///     .with_form("password", "password123")
///     .with_form("submit", "Log in");
///
/// assert_eq!(request.method(), Method::Post);
/// assert_eq!(request.query().get("next"), Some("1"));
/// assert_eq!(request.form().get("username"), Some("bobby"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    request_id: String,
    method: Method,
    uri: String,
    query: Params,
    form: Params,
    upload: Option<Upload>,
    session_id: Option<String>,
}

impl Request {
    /// A request for `uri` (path plus optional query string).
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query = uri
            .split_once('?')
            .map(|(_, q)| Params::parse(q))
            .unwrap_or_default();
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            method,
            uri,
            query,
            form: Params::default(),
            upload: None,
            session_id: None,
        }
    }

    /// A `GET` request.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::Get, uri)
    }

    /// A `POST` request.
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::Post, uri)
    }

    /// Replaces the generated request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Adds one form field.
    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name, value);
        self
    }

    /// Replaces the whole form body.
    pub fn with_form_params(mut self, form: Params) -> Self {
        self.form = form;
        self
    }

    /// Attaches an uploaded file.
    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }

    /// Presents an existing session id.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Unique id used to correlate log lines.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path and query string exactly as received.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Query-string parameters.
    pub fn query(&self) -> &Params {
        &self.query
    }

    /// Form body parameters.
    pub fn form(&self) -> &Params {
        &self.form
    }

    /// Uploaded file, if any.
    pub fn upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    /// Session id the client presented.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}
