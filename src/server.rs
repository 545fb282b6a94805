//! HTTP/1 server on top of hyper

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};

use crate::error::Result;
use crate::handler::Handler;
use crate::http::{Request, Response};

/// HTTP server dispatching every request to a single handler
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Bind `addr` and serve until Ctrl-C
	pub async fn listen(self, addr: SocketAddr) -> Result<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, shutdown_signal()).await
	}

	/// Serve connections from `listener` until `shutdown` completes
	///
	/// Once shutdown starts no new connections are accepted, and open
	/// connections finish their in-flight request before `serve` returns.
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
	where
		F: Future<Output = ()> + Send,
	{
		let local_addr = listener.local_addr()?;
		tracing::info!(%local_addr, "server listening on http://{}", local_addr);

		let (shutdown_tx, _) = broadcast::channel::<()>(1);
		let mut connections = JoinSet::new();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = match result {
						Ok(accepted) => accepted,
						Err(err) => {
							tracing::warn!(error = %err, "failed to accept connection");
							continue;
						}
					};
					let handler = self.handler.clone();
					let conn_shutdown = shutdown_tx.subscribe();

					connections.spawn(async move {
						if let Err(err) =
							Self::handle_connection(stream, remote_addr, handler, conn_shutdown).await
						{
							tracing::debug!(%remote_addr, error = %err, "connection closed with error");
						}
					});
				}
				Some(joined) = connections.join_next(), if !connections.is_empty() => {
					log_join_error(joined);
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, stopping server");
					break;
				}
			}
		}

		// No receivers just means no connection is open
		let _ = shutdown_tx.send(());
		if !connections.is_empty() {
			tracing::info!(open = connections.len(), "waiting for open connections to finish");
		}
		while let Some(joined) = connections.join_next().await {
			log_join_error(joined);
		}
		tracing::info!("server stopped");
		Ok(())
	}

	async fn handle_connection(
		stream: TcpStream,
		remote_addr: SocketAddr,
		handler: Arc<dyn Handler>,
		mut shutdown: broadcast::Receiver<()>,
	) -> std::result::Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr,
		};

		let conn = http1::Builder::new().serve_connection(io, service);
		tokio::pin!(conn);

		let mut draining = false;
		loop {
			tokio::select! {
				result = conn.as_mut() => return result,
				_ = shutdown.recv(), if !draining => {
					draining = true;
					conn.as_mut().graceful_shutdown();
				}
			}
		}
	}
}

fn log_join_error(joined: std::result::Result<(), JoinError>) {
	if let Err(err) = joined {
		tracing::warn!(error = %err, "connection task failed");
	}
}

/// Resolves when the process receives Ctrl-C
pub async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body_bytes = body.collect().await?.to_bytes();

			let mut request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body_bytes);
			request.remote_addr = Some(remote_addr);

			let response = match handler.handle(request).await {
				Ok(response) => response,
				Err(err) => {
					tracing::error!(error = %err, "unhandled error");
					Response::from(err)
				}
			};

			let mut builder = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				builder = builder.header(key, value);
			}
			Ok(builder.body(Full::new(response.body))?)
		})
	}
}
