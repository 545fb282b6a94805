//! End-to-end test over a real socket

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use polls_site::{Application, Database, HttpServer, Settings};

async fn fetch(addr: std::net::SocketAddr, path: &str) -> String {
	let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
	let request = format!(
		"GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
		path
	);
	stream
		.write_all(request.as_bytes())
		.await
		.expect("Failed to send request");
	let mut raw = String::new();
	stream
		.read_to_string(&mut raw)
		.await
		.expect("Failed to read response");
	raw
}

#[tokio::test]
async fn test_index_served_over_http() {
	let db = Database::connect_in_memory().await.unwrap();
	db.migrate().await.unwrap();
	let app = Application::new(Settings::default(), db).unwrap();

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (stop_tx, stop_rx) = oneshot::channel::<()>();
	let server = tokio::spawn(HttpServer::new(app.into_handler()).serve(listener, async {
		let _ = stop_rx.await;
	}));

	let index = fetch(addr, "/polls/").await;
	assert!(index.starts_with("HTTP/1.1 200 OK"));
	assert!(index.to_ascii_lowercase().contains("content-type: text/html; charset=utf-8"));
	assert!(index.contains("No polls are available."));

	let missing = fetch(addr, "/nowhere/").await;
	assert!(missing.starts_with("HTTP/1.1 404 Not Found"));

	stop_tx.send(()).unwrap();
	server.await.unwrap().unwrap();
}
