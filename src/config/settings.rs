//! Project settings
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! a TOML file, and `POLLS_*` environment variables.
//!
//! ```toml
//! debug = false
//! database_url = "sqlite://polls.sqlite3"
//! bind = "127.0.0.1:8000"
//! index_page_size = 5
//! log_filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{Error, Result};

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "polls.toml";

/// Main settings structure for the site
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Debug mode
	pub debug: bool,

	/// SQLite connection URL
	pub database_url: String,

	/// Address `runserver` listens on
	pub bind: String,

	/// Number of questions listed on the index page
	pub index_page_size: i64,

	/// `tracing` filter directive, used when `RUST_LOG` is unset
	pub log_filter: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			database_url: "sqlite://polls.sqlite3".to_string(),
			bind: "127.0.0.1:8000".to_string(),
			index_page_size: 5,
			log_filter: "info".to_string(),
		}
	}
}

impl Settings {
	/// Load settings from `path` (or `polls.toml` if present) and the environment
	///
	/// An explicitly given file must exist; the default file is optional.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let settings = match path {
			Some(path) => Self::from_file(path)?,
			None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
				Self::from_file(Path::new(DEFAULT_SETTINGS_FILE))?
			}
			None => Self::default(),
		};
		settings.apply_overrides(|key| std::env::var(key).ok())
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|e| {
			Error::Config(format!("cannot read settings file {}: {}", path.display(), e))
		})?;
		Self::from_toml_str(&content)
	}

	pub fn from_toml_str(content: &str) -> Result<Self> {
		let settings: Self =
			toml::from_str(content).map_err(|e| Error::Config(format!("invalid settings: {}", e)))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Apply `POLLS_*` overrides read through `lookup`
	pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup("POLLS_DEBUG") {
			self.debug = parse_bool(&value)
				.ok_or_else(|| Error::Config(format!("POLLS_DEBUG: not a boolean: {}", value)))?;
		}
		if let Some(value) = lookup("POLLS_DATABASE_URL") {
			self.database_url = value;
		}
		if let Some(value) = lookup("POLLS_BIND") {
			self.bind = value;
		}
		if let Some(value) = lookup("POLLS_INDEX_PAGE_SIZE") {
			self.index_page_size = value.parse().map_err(|_| {
				Error::Config(format!("POLLS_INDEX_PAGE_SIZE: not an integer: {}", value))
			})?;
		}
		if let Some(value) = lookup("POLLS_LOG") {
			self.log_filter = value;
		}
		self.validate()?;
		Ok(self)
	}

	pub fn bind_addr(&self) -> Result<SocketAddr> {
		self.bind
			.parse()
			.map_err(|_| Error::Config(format!("invalid bind address: {}", self.bind)))
	}

	fn validate(&self) -> Result<()> {
		if self.index_page_size < 1 {
			return Err(Error::Config(format!(
				"index_page_size must be at least 1, got {}",
				self.index_page_size
			)));
		}
		if self.database_url.is_empty() {
			return Err(Error::Config("database_url must not be empty".to_string()));
		}
		Ok(())
	}
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}
