//! HTTP protocol layer module
//!
//! Response builders and request body helpers shared by every handler.

pub mod body;
pub mod response;

// Re-export commonly used types
pub use body::read_body;
pub use response::{
    build_204_response, build_405_response, build_error_response, build_html_response,
    build_json_response, build_text_response,
};
