//! Request handler module
//!
//! Routing dispatch plus the item CRUD handlers and the stateless demo pages.

pub mod demo;
pub mod items;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
