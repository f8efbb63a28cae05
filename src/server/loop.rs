// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinSet;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept connections on `listener` until `shutdown` is notified.
///
/// Each connection runs on its own task. After shutdown the listener is
/// closed and open connections get `performance.shutdown_grace` seconds to
/// finish before they are aborted.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let mut tasks: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, &mut tasks);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        logger::log_error(&format!("Connection task panicked: {e}"));
                    }
                }
            }

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_shutdown(active_connections.load(Ordering::SeqCst));

    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    if tokio::time::timeout(grace, drain(&mut tasks)).await.is_err() {
        logger::log_warning(&format!(
            "{} connection(s) still open after {}s, aborting",
            tasks.len(),
            grace.as_secs()
        ));
        tasks.abort_all();
    }
    logger::log_info(&format!("Server stopped with {} item(s) in store", state.store.len()));
}

async fn drain(tasks: &mut JoinSet<()>) {
    while tasks.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_serves_items_over_tcp_and_stops() {
        let mut config = Config::load_from("definitely/missing/config").unwrap();
        config.logging.access_log = false;
        config.performance.shutdown_grace = 1;
        let state = Arc::new(AppState::new(&config));

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        let body = r#"{"name":"Book","price":12.99}"#;
        let created = roundtrip(
            addr,
            &format!(
                "POST /items HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\
                 Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(created.starts_with("HTTP/1.1 201"), "{created}");
        assert!(created.ends_with(r#"{"id":1}"#), "{created}");

        let fetched = roundtrip(
            addr,
            "GET /items/1 HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(fetched.starts_with("HTTP/1.1 200"), "{fetched}");
        assert!(fetched.contains(r#""name":"Book""#));

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.store.len(), 1);
    }
}
