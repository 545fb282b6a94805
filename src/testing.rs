//! Test client and response assertions
//!
//! Requests are dispatched straight into the [`Application`] without a
//! socket, and responses keep the template context they were rendered with.
//!
//! ```
//! use polls_site::testing::TestClient;
//!
//! # tokio_test_block_on(async {
//! let client = TestClient::new().await.unwrap();
//! let url = client.reverse("polls:index", &[]).unwrap();
//! let response = client.get(&url).await;
//! response.assert_contains("No polls are available.");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::app::Application;
use crate::config::settings::Settings;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::http::{Request, Response};

/// In-process client for exercising views
pub struct TestClient {
	app: Arc<Application>,
}

impl TestClient {
	/// Client over a fresh, migrated in-memory database with default settings
	pub async fn new() -> Result<Self> {
		Self::with_settings(Settings::default()).await
	}

	pub async fn with_settings(settings: Settings) -> Result<Self> {
		let db = Database::connect_in_memory().await?;
		db.migrate().await?;
		Ok(Self::with_application(Application::new(settings, db)?))
	}

	pub fn with_application(app: Application) -> Self {
		Self { app: Arc::new(app) }
	}

	pub fn db(&self) -> &Database {
		&self.app.state().db
	}

	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
		self.app.reverse(name, params)
	}

	pub async fn get(&self, path: &str) -> TestResponse {
		self.request(Method::GET, path, HeaderMap::new(), Bytes::new())
			.await
	}

	/// POST `fields` as an urlencoded form
	pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
		let body = serde_urlencoded::to_string(fields).unwrap_or_default();
		let mut headers = HeaderMap::new();
		headers.insert(
			hyper::header::CONTENT_TYPE,
			hyper::header::HeaderValue::from_static("application/x-www-form-urlencoded"),
		);
		self.request(Method::POST, path, headers, Bytes::from(body))
			.await
	}

	pub async fn request(
		&self,
		method: Method,
		path: &str,
		headers: HeaderMap,
		body: Bytes,
	) -> TestResponse {
		let uri = match path.parse::<Uri>() {
			Ok(uri) => uri,
			Err(_) => return TestResponse::from(Response::from(Error::BadRequest(path.to_string()))),
		};
		let request = Request::new(method, uri, Version::HTTP_11, headers, body);
		let response = self
			.app
			.handle(request)
			.await
			.unwrap_or_else(Response::from);
		TestResponse::from(response)
	}
}

/// Response wrapper with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Bytes,
	context: Option<Value>,
}

impl From<Response> for TestResponse {
	fn from(response: Response) -> Self {
		Self {
			status: response.status,
			headers: response.headers,
			body: response.body,
			context: response.context,
		}
	}
}

impl TestResponse {
	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).to_string()
	}

	/// A template context variable, if the response was rendered
	pub fn context(&self, key: &str) -> Option<&Value> {
		self.context.as_ref().and_then(|context| context.get(key))
	}

	/// Deserialize a list-valued context variable
	///
	/// # Panics
	///
	/// Panics if the variable is missing or is not a list of `T`.
	pub fn context_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
		let value = self
			.context(key)
			.unwrap_or_else(|| panic!("Expected context variable '{}'", key));
		serde_json::from_value(value.clone())
			.unwrap_or_else(|e| panic!("Context variable '{}' is not a list: {}", key, e))
	}

	pub fn assert_status(&self, expected: StatusCode) {
		assert_eq!(
			self.status,
			expected,
			"Expected status {}, got {}: {}",
			expected,
			self.status,
			self.text()
		);
	}

	/// Assert a 200 response whose body contains `text`
	pub fn assert_contains(&self, text: &str) {
		self.assert_status(StatusCode::OK);
		let body = self.text();
		assert!(
			body.contains(text),
			"Couldn't find '{}' in response: {}",
			text,
			body
		);
	}

	pub fn assert_not_contains(&self, text: &str) {
		let body = self.text();
		assert!(
			!body.contains(text),
			"Response should not contain '{}': {}",
			text,
			body
		);
	}

	/// Assert a 302 redirect to `location`
	pub fn assert_redirects(&self, location: &str) {
		self.assert_status(StatusCode::FOUND);
		assert_eq!(self.header("location"), Some(location));
	}
}
