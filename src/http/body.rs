//! Request body collection with a size cap

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};

use crate::error::ApiError;

/// Buffer the whole request body, refusing anything over `max_size` bytes
pub async fn read_body<B>(body: B, max_size: u64) -> Result<Bytes, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            crate::logger::log_warning(&format!(
                "Request body exceeds {max_size} bytes, rejected"
            ));
            Err(ApiError::PayloadTooLarge)
        }
        Err(e) => {
            crate::logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(ApiError::BodyRead)
        }
    }
}
