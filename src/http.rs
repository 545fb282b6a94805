//! Request and response types passed between the server, router and views

use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// HTTP request as seen by views
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Parameters captured from the matched URL pattern
	pub path_params: HashMap<String, String>,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	/// Create a new request with no captured path parameters
	///
	/// # Examples
	///
	/// ```
	/// use polls_site::http::Request;
	/// use hyper::{HeaderMap, Method, Uri, Version};
	/// use bytes::Bytes;
	///
	/// let request = Request::new(
	///     Method::GET,
	///     "/polls/".parse::<Uri>().unwrap(),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(request.path(), "/polls/");
	/// ```
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			path_params: HashMap::new(),
			remote_addr: None,
		}
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Get a captured path parameter parsed into `T`
	///
	/// A missing or unparsable parameter is reported as not found, since the
	/// URL does not name an existing resource.
	pub fn path_param<T: std::str::FromStr>(&self, name: &str) -> Result<T> {
		let raw = self
			.path_params
			.get(name)
			.ok_or_else(|| Error::NotFound(format!("missing path parameter '{}'", name)))?;
		raw.parse::<T>()
			.map_err(|_| Error::NotFound(format!("invalid path parameter '{}'", name)))
	}

	/// Decode an `application/x-www-form-urlencoded` body
	pub fn form<T: DeserializeOwned>(&self) -> Result<T> {
		serde_urlencoded::from_bytes(&self.body).map_err(|e| Error::BadRequest(e.to_string()))
	}
}

/// HTTP response produced by views
///
/// Responses rendered from a template keep the template context, so tests
/// can inspect what the view handed to the template.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub context: Option<serde_json::Value>,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use polls_site::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			context: None,
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}

	/// Create a Response with HTTP 302 Found (temporary redirect)
	///
	/// # Examples
	///
	/// ```
	/// use polls_site::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::temporary_redirect("/polls/1/results/");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(
	///     response.headers.get("location").unwrap().to_str().unwrap(),
	///     "/polls/1/results/"
	/// );
	/// ```
	pub fn temporary_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_location(location.as_ref())
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a header, silently skipping names or values that are not valid HTTP
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = hyper::header::HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = hyper::header::HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = hyper::header::HeaderValue::from_str(location) {
			self.headers.insert(hyper::header::LOCATION, value);
		}
		self
	}

	pub fn with_context(mut self, context: serde_json::Value) -> Self {
		self.context = Some(context);
		self
	}
}
