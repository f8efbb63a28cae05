// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Admit a connection unless the configured limit is reached, then serve it
/// on a task in `tasks`.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    tasks: &mut JoinSet<()>,
) {
    // Increment first, then check, so two racing accepts cannot both slip in
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    tasks.spawn(serve_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    ));
}

/// Serve every request on one connection, bounded by the connection timeout
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    let io = TokioIo::new(stream);

    let performance = &state.config.performance;
    let timeout_duration = Duration::from_secs(std::cmp::max(
        performance.read_timeout,
        performance.write_timeout,
    ));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(Duration::from_secs(performance.read_timeout))
        .keep_alive(performance.keep_alive_timeout > 0);

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
    );

    match tokio::time::timeout(timeout_duration, conn).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => logger::log_warning(&format!(
            "Connection from {peer_addr} timed out after {} seconds",
            timeout_duration.as_secs()
        )),
    }

    conn_counter.fetch_sub(1, Ordering::SeqCst);
}
