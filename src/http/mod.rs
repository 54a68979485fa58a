//! HTTP protocol layer module
//!
//! Response builders and query-string helpers, decoupled from the handlers.

pub mod query;
pub mod response;

// Re-export commonly used types
pub use query::query_param;
pub use response::{build_404_response, build_html_response, build_json_response};
