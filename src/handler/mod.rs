//! Request handler module
//!
//! Responsible for request routing dispatch plus the non-API pages:
//! the landing page and the health and version endpoints.

pub mod health;
pub mod pages;
pub mod router;

// Re-export main entry point
pub use router::{handle_request, ClientAddr, Endpoint, RequestContext};
