//! Project management CLI (the counterpart of `manage.py`)

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use polls_site::apps::polls::managers::QuestionManager;
use polls_site::{Application, Database, HttpServer, Settings, logging};

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage the polls site")]
struct Cli {
	/// Path to a TOML settings file. Defaults to ./polls.toml when present.
	#[arg(short, long, global = true)]
	settings: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Apply migrations and start the development server
	Runserver {
		/// Address to listen on, overriding the `bind` setting
		addr: Option<SocketAddr>,
	},
	/// Apply database migrations
	Migrate,
	/// Create a question published N days from now
	Createquestion {
		question_text: String,
		/// Publication offset in days; negative for the past
		#[arg(long, default_value_t = 0, allow_negative_numbers = true)]
		days: i64,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = Settings::load(cli.settings.as_deref()).context("failed to load settings")?;
	logging::init(&settings.log_filter);

	let db = Database::connect(&settings.database_url)
		.await
		.with_context(|| format!("failed to open database {}", settings.database_url))?;

	match cli.command {
		Command::Migrate => {
			db.migrate().await.context("failed to apply migrations")?;
		}
		Command::Createquestion {
			question_text,
			days,
		} => {
			let question = QuestionManager::new(&db)
				.create(&question_text, Utc::now() + Duration::days(days))
				.await
				.context("failed to create question")?;
			println!("Created question {} published at {}", question.id, question.pub_date);
		}
		Command::Runserver { addr } => {
			db.migrate().await.context("failed to apply migrations")?;
			let addr = match addr {
				Some(addr) => addr,
				None => settings.bind_addr()?,
			};
			if settings.debug {
				tracing::warn!("debug mode is on; do not use it in production");
			}
			let app = Application::new(settings, db)?;
			HttpServer::new(app.into_handler())
				.listen(addr)
				.await
				.context("server failed")?;
		}
	}

	Ok(())
}
