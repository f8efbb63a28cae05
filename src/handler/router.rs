//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: logs the request, resolves the
//! path to a route and hands the request to that route's handler.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::borrow::Cow;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::handler::{demo, items};
use crate::logger::{self, AccessLogEntry};
use crate::store::{InvalidItemId, ItemId};

/// Prefix of single-item paths; whatever follows it is the raw id
pub const ITEM_PREFIX: &str = "/items/";

/// Where a request path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    MethodEcho(Method),
    Search,
    Form,
    Error,
    Items,
    Item(Result<ItemId, InvalidItemId>),
}

/// Map a request path to its route
///
/// The path is percent-decoded first, so `/items/%31` is item 1. A path that
/// does not decode to UTF-8 is matched as sent. Exact paths first, then the
/// `/items/` prefix. Anything else is the home page. No trailing-slash
/// normalization is applied.
pub fn resolve(path: &str) -> Route {
    let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    if let Some(raw_id) = path.strip_prefix(ITEM_PREFIX) {
        return Route::Item(raw_id.parse());
    }
    match &*path {
        "/items" => Route::Items,
        "/about" => Route::About,
        "/get" => Route::MethodEcho(Method::GET),
        "/post" => Route::MethodEcho(Method::POST),
        "/put" => Route::MethodEcho(Method::PUT),
        "/search" => Route::Search,
        "/form" | "/submit" => Route::Form,
        "/error" => Route::Error,
        _ => Route::Home,
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    logger::log_request(req.method(), req.uri().path());

    let access_entry = state
        .config
        .logging
        .access_log
        .then(|| start_access_entry(&req, remote_addr));

    let mut response = dispatch(req, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let result = match resolve(req.uri().path()) {
        Route::Items => items::handle_collection(req, state).await,
        Route::Item(id) => items::handle_item(req, id, state).await,
        Route::Form => demo::form(req, state).await,
        Route::Home => Ok(demo::home()),
        Route::About => Ok(demo::about()),
        Route::MethodEcho(expected) => Ok(demo::method_echo(&expected, req.method())),
        Route::Search => Ok(demo::search(req.uri().query())),
        Route::Error => Ok(demo::error_page()),
    };

    result.unwrap_or_else(|e| {
        logger::log_debug(&format!("Request rejected ({}): {e}", e.status()));
        e.into_response()
    })
}

fn start_access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{body_json, send, test_config, test_state};
    use crate::store::Item;
    use hyper::StatusCode;

    #[test]
    fn test_resolve_exact_paths() {
        assert_eq!(resolve("/items"), Route::Items);
        assert_eq!(resolve("/about"), Route::About);
        assert_eq!(resolve("/post"), Route::MethodEcho(Method::POST));
        assert_eq!(resolve("/submit"), Route::Form);
        assert_eq!(resolve("/"), Route::Home);
        assert_eq!(resolve("/about/"), Route::Home);
    }

    #[test]
    fn test_resolve_item_prefix() {
        assert_eq!(resolve("/items/7"), Route::Item(Ok(ItemId::from(7))));
        assert!(matches!(resolve("/items/abc"), Route::Item(Err(ref e)) if e.raw == "abc"));
        assert!(matches!(resolve("/items/"), Route::Item(Err(ref e)) if e.raw.is_empty()));
        assert!(matches!(resolve("/items/1/parts"), Route::Item(Err(_))));
    }

    #[test]
    fn test_resolve_decodes_percent_escapes() {
        assert_eq!(resolve("/items/%31"), Route::Item(Ok(ItemId::from(1))));
        assert_eq!(resolve("/items/%2D4"), Route::Item(Ok(ItemId::from(-4))));
        assert_eq!(resolve("/%61bout"), Route::About);
        assert!(matches!(resolve("/items/%20"), Route::Item(Err(ref e)) if e.raw == " "));
        // Invalid UTF-8 after decoding falls back to the raw path
        assert!(matches!(resolve("/items/%FF"), Route::Item(Err(ref e)) if e.raw == "%FF"));
    }

    #[tokio::test]
    async fn test_encoded_item_id_reaches_item() {
        let state = test_state();
        let id = state.store.create(Item::new("Book", 12.99)).unwrap();
        assert_eq!(id, ItemId::from(1));

        let response = send(&state, Method::GET, "/items/%31", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"name": "Book", "price": 12.99})
        );
    }

    #[test]
    fn test_access_entry_from_request() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/items/%31?debug=1")
            .header(USER_AGENT, "curl/8.0")
            .body(())
            .unwrap();
        let entry = start_access_entry(&req, SocketAddr::from(([10, 0, 0, 7], 5555)));
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.path, "/items/%31");
        assert_eq!(entry.query.as_deref(), Some("debug=1"));
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(entry.referer, None);
    }

    #[tokio::test]
    async fn test_access_log_flag_read_from_config() {
        let mut config = test_config();
        config.logging.access_log = true;
        let state = Arc::new(AppState::new(&config));
        assert!(state.config.logging.access_log);

        let response = send(&state, Method::GET, "/items", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "Tokio-Hyper/1.0");
    }

    #[tokio::test]
    async fn test_server_header_is_set() {
        let state = test_state();
        let response = send(&state, Method::GET, "/about", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "Tokio-Hyper/1.0");
    }
}
