use bytes::Bytes;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;

use crate::{CloudcraftError, Result};

/// Normalized, fully read response from the Cloudcraft API.
#[derive(Clone, Debug)]
pub struct Response {
    /// Response headers; a name may carry several ordered values.
    pub headers: HeaderMap,
    /// Complete response body.
    pub body: Bytes,
    /// HTTP status code.
    pub status: u16,
}

impl Response {
    /// Returns the first value of a header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns every value of a header in received order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    /// Returns the `ETag` header, used for conditional blueprint updates.
    pub fn etag(&self) -> Option<&str> {
        self.header(header::ETAG.as_str())
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            CloudcraftError::Decode(format!(
                "invalid response JSON: {err}; body: {}",
                String::from_utf8_lossy(&self.body)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use reqwest::header::{HeaderMap, HeaderValue, ETAG, SET_COOKIE};
    use serde::Deserialize;

    use super::Response;
    use crate::CloudcraftError;

    fn response(body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"v1\""));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        Response {
            headers,
            body: Bytes::from_static(body.as_bytes()),
            status: 200,
        }
    }

    #[test]
    fn header_helpers_preserve_order() {
        let response = response("{}");
        assert_eq!(response.etag(), Some("\"v1\""));
        assert_eq!(response.header_values("set-cookie"), vec!["a=1", "b=2"]);
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn json_decodes_and_reports_errors() {
        #[derive(Debug, Deserialize)]
        struct Named {
            name: String,
        }

        let named: Named = response(r#"{"name":"kit"}"#).json().expect("must decode");
        assert_eq!(named.name, "kit");

        let err = response("not json").json::<Named>().expect_err("must fail");
        assert!(matches!(err, CloudcraftError::Decode(ref msg) if msg.contains("not json")));
    }
}
