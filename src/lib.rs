//! Polls tutorial application
//!
//! A small site in the style of the framework tutorial:
//! - `Question` and `Choice` models stored in SQLite
//! - index, detail, results and vote views with tera templates
//! - named, namespaced URL routing with reverse lookup
//! - an in-process test client
//!
//! ```no_run
//! use polls_site::{Application, Database, HttpServer, Settings};
//!
//! # async fn run() -> polls_site::Result<()> {
//! let settings = Settings::load(None)?;
//! let db = Database::connect(&settings.database_url).await?;
//! db.migrate().await?;
//! let addr = settings.bind_addr()?;
//! let app = Application::new(settings, db)?;
//! HttpServer::new(app.into_handler()).listen(addr).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod apps;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod server;
pub mod templates;
pub mod testing;
pub mod urls;

pub use app::{AppState, Application};
pub use config::settings::Settings;
pub use db::Database;
pub use error::{Error, Result};
pub use server::HttpServer;
