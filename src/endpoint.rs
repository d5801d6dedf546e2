//! Base URL assembly from scheme/host/port/path fragments.

use url::Url;

/// Errors produced while assembling an endpoint.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("missing scheme or host")]
    MissingFragment,
    #[error("invalid URL scheme '{0}'")]
    InvalidScheme(String),
    #[error("invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Parses fragments of a URL into a base [`Url`].
///
/// `port` may be empty, and an empty `path` becomes `/`.
///
/// Example: `("https", "example.com", "8080", "")` → `https://example.com:8080/`
pub fn parse(scheme: &str, host: &str, port: &str, path: &str) -> Result<Url, EndpointError> {
    if scheme.is_empty() || host.is_empty() {
        return Err(EndpointError::MissingFragment);
    }

    if scheme != "https" && scheme != "http" {
        return Err(EndpointError::InvalidScheme(scheme.to_owned()));
    }

    let path = if path.is_empty() { "/" } else { path };

    let mut raw = String::with_capacity(scheme.len() + host.len() + port.len() + path.len() + 4);
    raw.push_str(scheme);
    raw.push_str("://");
    raw.push_str(host);
    if !port.is_empty() {
        raw.push(':');
        raw.push_str(port);
    }
    raw.push_str(path);

    Ok(Url::parse(&raw)?)
}

/// Appends percent-encoded path segments to the base endpoint.
///
/// `https://host/api` + `["blueprint", id]` yields `https://host/api/blueprint/<id>`.
pub(crate) fn resource_url(base: &Url, segments: &[&str]) -> Result<Url, EndpointError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::{parse, resource_url, EndpointError};

    #[test]
    fn builds_url_with_port_and_default_path() {
        let url = parse("https", "example.com", "8080", "").expect("must parse");
        assert_eq!(url.as_str(), "https://example.com:8080/");
    }

    #[test]
    fn builds_url_without_port() {
        let url = parse("http", "localhost", "", "/api/").expect("must parse");
        assert_eq!(url.as_str(), "http://localhost/api/");
    }

    #[test]
    fn rejects_missing_fragments() {
        assert!(matches!(
            parse("", "example.com", "", ""),
            Err(EndpointError::MissingFragment)
        ));
        assert!(matches!(
            parse("https", "", "", ""),
            Err(EndpointError::MissingFragment)
        ));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = parse("ftp", "example.com", "", "").expect_err("must fail");
        assert!(matches!(err, EndpointError::InvalidScheme(ref s) if s == "ftp"));
    }

    #[test]
    fn rejects_invalid_port() {
        let err = parse("https", "example.com", "80a", "").expect_err("must fail");
        assert!(matches!(err, EndpointError::InvalidUrl(_)));
    }

    #[test]
    fn resource_url_appends_encoded_segments() {
        let base = parse("https", "example.com", "", "/api").expect("must parse");
        let url = resource_url(&base, &["blueprint", "abc"]).expect("must join");
        assert_eq!(url.as_str(), "https://example.com/api/blueprint/abc");

        let root = parse("https", "example.com", "", "").expect("must parse");
        let url = resource_url(&root, &["user", "me"]).expect("must join");
        assert_eq!(url.as_str(), "https://example.com/user/me");

        let url = resource_url(&root, &["blueprint", "a b/c"]).expect("must join");
        assert_eq!(url.as_str(), "https://example.com/blueprint/a%20b%2Fc");
    }
}
