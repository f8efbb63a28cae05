//! Item collection and single-item handlers
//!
//! `/items` lists and creates, `/items/{id}` reads, updates and deletes. Each
//! store call takes the store lock once; body parsing happens before it.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;

use crate::config::AppState;
use crate::error::ApiError;
use crate::http;
use crate::store::{InvalidItemId, Item, ItemId};

const COLLECTION_METHODS: &str = "GET, POST";
const ITEM_METHODS: &str = "GET, PUT, DELETE";

/// Body of a successful create
#[derive(Debug, Serialize)]
struct Created {
    id: ItemId,
}

/// `GET /items` and `POST /items`
pub async fn handle_collection<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    match method {
        Method::GET => Ok(http::build_json_response(
            StatusCode::OK,
            &state.store.list(),
        )),
        Method::POST => {
            let item = parse_item(req.into_body(), state).await?;
            let id = state.store.create(item)?;
            crate::logger::log_debug(&format!("Created item {id}"));
            Ok(http::build_json_response(StatusCode::CREATED, &Created { id }))
        }
        _ => Err(ApiError::MethodNotAllowed {
            allow: COLLECTION_METHODS,
        }),
    }
}

/// `GET`, `PUT` and `DELETE` on `/items/{id}`
///
/// An unparseable id is rejected before the method is looked at.
pub async fn handle_item<B>(
    req: Request<B>,
    id: Result<ItemId, InvalidItemId>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let id = id?;
    let method = req.method().clone();
    match method {
        Method::GET => {
            let item = state.store.get(id).ok_or(ApiError::NotFound)?;
            Ok(http::build_json_response(StatusCode::OK, &item))
        }
        Method::PUT => {
            let fields = parse_item(req.into_body(), state).await?;
            let merged = state.store.update(id, fields).ok_or(ApiError::NotFound)?;
            Ok(http::build_json_response(StatusCode::OK, &merged))
        }
        Method::DELETE => {
            state.store.delete(id).ok_or(ApiError::NotFound)?;
            crate::logger::log_debug(&format!("Deleted item {id}"));
            Ok(http::build_204_response())
        }
        _ => Err(ApiError::MethodNotAllowed {
            allow: ITEM_METHODS,
        }),
    }
}

async fn parse_item<B>(body: B, state: &AppState) -> Result<Item, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = http::read_body(body, state.config.http.max_body_size).await?;
    Item::from_json(&bytes).map_err(ApiError::InvalidPayload)
}
