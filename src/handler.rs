//! Handler and middleware abstractions

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::http::{Request, Response};

/// Handler trait for processing requests
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Middleware wraps the next handler in the chain
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// Composes middleware around a terminal handler
///
/// Middleware runs in the order it was added: the first one added sees the
/// request first and the response last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}
}

/// One link of the chain: a middleware plus everything after it
struct Link {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Link {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut current = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			current = Arc::new(Link {
				middleware: middleware.clone(),
				next: current,
			});
		}
		current.handle(request).await
	}
}

/// Logs every request with its status and latency
pub struct RequestLoggingMiddleware;

#[async_trait]
impl Middleware for RequestLoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let method = request.method.clone();
		let path = request.path().to_string();
		let remote_addr = request.remote_addr;
		let started = Instant::now();

		let result = next.handle(request).await;
		let elapsed_ms = started.elapsed().as_millis() as u64;

		match &result {
			Ok(response) => tracing::info!(
				%method,
				%path,
				remote_addr = ?remote_addr,
				status = response.status.as_u16(),
				elapsed_ms,
				"request served"
			),
			Err(err) => tracing::warn!(
				%method,
				%path,
				remote_addr = ?remote_addr,
				status = err.status().as_u16(),
				elapsed_ms,
				error = %err,
				"request failed"
			),
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;
	use hyper::{HeaderMap, Method, Uri, Version};

	struct TestHandler;

	#[async_trait]
	impl Handler for TestHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_body("Hello"))
		}
	}

	struct PrefixMiddleware {
		prefix: String,
	}

	#[async_trait]
	impl Middleware for PrefixMiddleware {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			let response = next.handle(request).await?;
			let current_body = String::from_utf8(response.body.to_vec()).unwrap_or_default();
			Ok(Response::ok().with_body(format!("{}{}", self.prefix, current_body)))
		}
	}

	fn get(path: &str) -> Request {
		Request::new(
			Method::GET,
			path.parse::<Uri>().unwrap(),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	#[tokio::test]
	async fn test_middleware_chain_execution_order() {
		let chain = MiddlewareChain::new(Arc::new(TestHandler))
			.with_middleware(Arc::new(PrefixMiddleware {
				prefix: "First:".to_string(),
			}))
			.with_middleware(Arc::new(PrefixMiddleware {
				prefix: "Second:".to_string(),
			}));

		let response = chain.handle(get("/")).await.unwrap();
		let body = String::from_utf8(response.body.to_vec()).unwrap();

		assert_eq!(body, "First:Second:Hello");
	}

	#[tokio::test]
	async fn test_request_logging_passes_response_through() {
		let chain = MiddlewareChain::new(Arc::new(TestHandler))
			.with_middleware(Arc::new(RequestLoggingMiddleware));

		let mut request = get("/polls/");
		request.remote_addr = Some("127.0.0.1:54321".parse().unwrap());
		let response = chain.handle(request).await.unwrap();

		assert_eq!(response.status, hyper::StatusCode::OK);
		assert_eq!(response.body, Bytes::from("Hello"));
	}
}
