//! Query string helpers

use hyper::Uri;

/// First value of `key` in the query string, percent-decoded.
///
/// An empty value counts as missing, so callers can fall back to a default.
pub fn query_param(uri: &Uri, key: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
