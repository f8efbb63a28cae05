//! Stateless demonstration pages: greetings, method echoes, search and form

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};

use crate::config::AppState;
use crate::error::ApiError;
use crate::http;

const FORM_HTML: &str = r#"
			<form action="/submit" method="post">
				<input type="text" name="name" placeholder="Enter your name" />
				<button type="submit">Submit</button>
			</form>
		"#;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

pub fn home() -> Response<Full<Bytes>> {
    http::build_text_response("Welcome to the Home Page!")
}

pub fn about() -> Response<Full<Bytes>> {
    http::build_text_response("About Us Page")
}

/// `/get`, `/post`, `/put`: acknowledge only the matching verb, empty 200 otherwise
pub fn method_echo(expected: &Method, actual: &Method) -> Response<Full<Bytes>> {
    if expected == actual {
        http::build_text_response(format!("{expected} request received"))
    } else {
        http::build_text_response(Bytes::new())
    }
}

/// `/search?q=..&sort=..`
pub fn search(query: Option<&str>) -> Response<Full<Bytes>> {
    // Malformed pairs are skipped rather than rejected.
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query.unwrap_or_default()).unwrap_or_default();

    let mut message = match first_value(&pairs, "q") {
        Some(q) if !q.is_empty() => format!("Searching for: {q}"),
        _ => "No search query provided.".to_string(),
    };
    if let Some(sort) = first_value(&pairs, "sort").filter(|s| !s.is_empty()) {
        message.push_str(&format!(" | Sorted by: {sort}"));
    }
    http::build_text_response(message)
}

/// `/form` and `/submit`: POST reads `name`, anything else gets the HTML form
///
/// Body fields take precedence over query-string fields; the body is only
/// decoded when it is sent as `application/x-www-form-urlencoded`.
pub async fn form<B>(req: Request<B>, state: &AppState) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if *req.method() != Method::POST {
        return Ok(http::build_html_response(FORM_HTML));
    }

    let query = req.uri().query().unwrap_or_default().to_string();
    let is_urlencoded = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(FORM_URLENCODED));

    let mut fields: Vec<(String, String)> = if is_urlencoded {
        let body = http::read_body(req.into_body(), state.config.http.max_body_size).await?;
        serde_urlencoded::from_bytes(&body).map_err(ApiError::InvalidForm)?
    } else {
        Vec::new()
    };
    let query_fields: Vec<(String, String)> =
        serde_urlencoded::from_str(&query).map_err(ApiError::InvalidForm)?;
    fields.extend(query_fields);

    let name = first_value(&fields, "name").unwrap_or_default();
    Ok(http::build_text_response(format!(
        "Form submitted with name: {name}"
    )))
}

pub fn error_page() -> Response<Full<Bytes>> {
    http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Custom error message")
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use crate::handler::test_support::{body_string, send, send_with_content_type, test_state};
    use hyper::{Method, StatusCode};

    #[tokio::test]
    async fn test_home_and_fallback() {
        let state = test_state();
        for path in ["/", "/nowhere", "/items-archive"] {
            let response = send(&state, Method::GET, path, "").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, "Welcome to the Home Page!");
        }
    }

    #[tokio::test]
    async fn test_about() {
        let state = test_state();
        let response = send(&state, Method::GET, "/about", "").await;
        assert_eq!(body_string(response).await, "About Us Page");
    }

    #[tokio::test]
    async fn test_method_echo() {
        let state = test_state();
        let cases = [
            (Method::POST, "/post", "POST request received"),
            (Method::GET, "/get", "GET request received"),
            (Method::PUT, "/put", "PUT request received"),
            (Method::GET, "/post", ""),
        ];
        for (method, path, expected) in cases {
            let response = send(&state, method, path, "").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, expected);
        }
    }

    #[tokio::test]
    async fn test_search() {
        let state = test_state();
        let cases = [
            ("/search?q=Go&sort=desc", "Searching for: Go | Sorted by: desc"),
            ("/search?q=rust+lang", "Searching for: rust lang"),
            ("/search?sort=asc", "No search query provided. | Sorted by: asc"),
            ("/search", "No search query provided."),
            ("/search?q=first&q=second", "Searching for: first"),
        ];
        for (path, expected) in cases {
            let response = send(&state, Method::GET, path, "").await;
            assert_eq!(body_string(response).await, expected, "{path}");
        }
    }

    #[tokio::test]
    async fn test_form_submission() {
        let state = test_state();
        let response = send_with_content_type(
            &state,
            Method::POST,
            "/submit",
            "application/x-www-form-urlencoded",
            "name=John",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Form submitted with name: John");

        let response = send_with_content_type(
            &state,
            Method::POST,
            "/form?name=Query",
            "application/x-www-form-urlencoded",
            "name=Body",
        )
        .await;
        assert_eq!(body_string(response).await, "Form submitted with name: Body");

        let response = send(&state, Method::POST, "/form?name=Query", "name=Ignored").await;
        assert_eq!(body_string(response).await, "Form submitted with name: Query");
    }

    #[tokio::test]
    async fn test_form_page() {
        let state = test_state();
        let response = send(&state, Method::GET, "/form", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        let body = body_string(response).await;
        assert!(body.contains(r#"<form action="/submit" method="post">"#));
    }

    #[tokio::test]
    async fn test_error_page() {
        let state = test_state();
        let response = send(&state, Method::GET, "/error", "").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Custom error message\n");
    }
}
