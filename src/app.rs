//! Application wiring: shared state plus the root router

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::settings::Settings;
use crate::db::Database;
use crate::error::Result;
use crate::handler::{Handler, MiddlewareChain, RequestLoggingMiddleware};
use crate::http::{Request, Response};
use crate::templates::Templates;
use crate::urls::{Router, UrlResolver};

/// State shared by every view
pub struct AppState {
	pub settings: Settings,
	pub db: Database,
	pub templates: Templates,
	pub urls: Arc<UrlResolver>,
}

/// The polls site as a request handler
pub struct Application {
	state: Arc<AppState>,
	router: Router,
}

impl Application {
	/// Build the application from settings and an already-migrated database
	pub fn new(settings: Settings, db: Database) -> Result<Self> {
		let router = crate::config::urls::routes();
		let urls = Arc::new(router.resolver());
		let templates = Templates::new(urls.clone())?;

		Ok(Self {
			state: Arc::new(AppState {
				settings,
				db,
				templates,
				urls,
			}),
			router,
		})
	}

	pub fn state(&self) -> &Arc<AppState> {
		&self.state
	}

	/// Reverse a `"namespace:name"` route into a path
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
		Ok(self.state.urls.reverse(name, params)?)
	}

	/// Wrap the application in the standard middleware stack
	pub fn into_handler(self) -> Arc<dyn Handler> {
		Arc::new(
			MiddlewareChain::new(Arc::new(self)).with_middleware(Arc::new(RequestLoggingMiddleware)),
		)
	}
}

#[async_trait]
impl Handler for Application {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let Some((route, params)) = self.router.resolve(request.path()) else {
			return Ok(Response::not_found()
				.with_header("content-type", "text/plain; charset=utf-8")
				.with_body("Not found"));
		};
		request.path_params = params;
		let view = route.view();

		match view(self.state.clone(), request).await {
			Ok(response) => Ok(response),
			Err(err) => {
				if err.status().is_server_error() {
					tracing::error!(error = %err, "view failed");
				} else {
					tracing::debug!(error = %err, "view rejected request");
				}
				Ok(err.into())
			}
		}
	}
}
