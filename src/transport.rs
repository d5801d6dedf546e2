//! Pooled, TLS-hardened HTTP transport.

use std::time::Duration;

use reqwest::{redirect, tls};

use crate::{error::ConfigError, USER_AGENT};

/// Maximum idle connections kept per host.
pub const MAX_IDLE_CONNS_PER_HOST: usize = 10;
/// How long an idle pooled connection is kept before closing.
pub const IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);

/// Builds the HTTP client shared by every call of one API client.
///
/// - TLS 1.3 minimum through rustls, which keeps a bounded in-memory session
///   cache for resumption
/// - HTTP/2 negotiated through ALPN, HTTP/1.1 otherwise
/// - response compression disabled
/// - redirects are never followed; 3xx responses reach the caller
pub(crate) fn build(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .min_tls_version(tls::Version::TLS_1_3)
        .pool_max_idle_per_host(MAX_IDLE_CONNS_PER_HOST)
        .pool_idle_timeout(IDLE_CONN_TIMEOUT)
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .redirect(redirect::Policy::none())
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ConfigError::HttpClient)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::build;

    #[test]
    fn builds_with_hardened_defaults() {
        build(Duration::from_secs(5)).expect("transport must build");
    }
}
