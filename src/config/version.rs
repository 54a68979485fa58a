// Build metadata module
// Version constants stamped into the binary at compile time

/// Crate version, e.g. `2.5.0-dev`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build timestamp, injected by the pipeline through `BUILD_TIME`
pub const BUILD_TIME: &str = match option_env!("BUILD_TIME") {
    Some(v) => v,
    None => "unknown",
};

/// Source revision, injected by the pipeline through `GIT_COMMIT`
pub const GIT_COMMIT: &str = match option_env!("GIT_COMMIT") {
    Some(v) => v,
    None => "unknown",
};

/// `major.minor` part of [`VERSION`], as shown in banners
pub fn short_version() -> &'static str {
    let mut dots = VERSION.match_indices('.');
    match dots.nth(1) {
        Some((idx, _)) => &VERSION[..idx],
        None => VERSION,
    }
}
