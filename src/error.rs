//! Error types shared by every layer of the site

use crate::http::Response;

/// Errors raised while serving the polls site
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("Migration error: {0}")]
	Migration(#[from] sqlx::migrate::MigrateError),

	#[error("Template error: {0}")]
	Template(#[from] tera::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Bad request: {0}")]
	BadRequest(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Reverse error: {0}")]
	Reverse(#[from] crate::urls::ReverseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// HTTP status this error is reported with
	pub fn status(&self) -> hyper::StatusCode {
		match self {
			Error::NotFound(_) => hyper::StatusCode::NOT_FOUND,
			Error::BadRequest(_) => hyper::StatusCode::BAD_REQUEST,
			_ => hyper::StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status = error.status();
		let body = match &error {
			Error::NotFound(what) => format!("Not found: {}", what),
			Error::BadRequest(msg) => format!("Bad request: {}", msg),
			// Internal details stay in the logs
			_ => "Internal server error".to_string(),
		};
		Response::new(status)
			.with_header("content-type", "text/plain; charset=utf-8")
			.with_body(body)
	}
}
