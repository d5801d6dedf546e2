//! Retrying request execution.
//!
//! One logical call runs as a strict sequence of attempts on the caller's
//! task. Between attempts the previous response body is drained so its
//! connection returns to the pool, and the retry policy's backoff is awaited.
//! Every suspension point races the caller's cancellation token.

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    limiter::RateLimiter,
    retry::{as_dyn, RetryPolicy},
    CloudcraftError, Response, Result,
};

/// Upper bound for pre-allocating a body buffer from `Content-Length`.
const MAX_PREALLOCATED_BODY: usize = 8 * 1024 * 1024;

/// HTTP request whose body is buffered in memory so that it can be sent
/// identically on every attempt.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl PreparedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Sets a header, replacing previous values.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Buffers the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Builds a fresh request for one attempt with an unread view of the body.
    fn to_attempt(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(reqwest::Body::from(body.clone()));
        }
        request
    }
}

type SendOutcome = std::result::Result<reqwest::Response, reqwest::Error>;

/// Per-call view over the client's shared, read-only collaborators.
pub(crate) struct Executor<'a> {
    pub(crate) http: &'a reqwest::Client,
    pub(crate) policy: &'a RetryPolicy,
    pub(crate) limiter: Option<&'a RateLimiter>,
    pub(crate) cancel: &'a CancellationToken,
}

impl Executor<'_> {
    /// Executes `request` to a terminal outcome.
    pub(crate) async fn execute(&self, request: &PreparedRequest) -> Result<Response> {
        let max_attempts = self.policy.max_retries.saturating_add(1);
        let mut attempt = 0usize;

        let (outcome, retryable) = loop {
            if let Some(limiter) = self.limiter {
                limiter.acquire(self.cancel).await?;
            }

            let outcome = self.send(request).await?;
            let retryable = match &outcome {
                Ok(response) => self.policy.is_retryable(Some(response.status()), None),
                Err(err) => self.policy.is_retryable(None, Some(as_dyn(err))),
            };

            if !retryable || attempt + 1 >= max_attempts {
                break (outcome, retryable);
            }

            match outcome {
                Ok(response) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempt,
                        status = response.status().as_u16(),
                        url = %request.url,
                        "retryable status"
                    );
                    self.drain(response).await;
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, error = %_err, url = %request.url, "retryable transport error");
                }
            }

            self.policy.wait(self.cancel, attempt).await?;
            attempt += 1;
        };

        let attempts = attempt + 1;
        let response = match outcome {
            Ok(response) => response,
            Err(err) => return Err(self.classify_transport_error(err, retryable, attempts)),
        };

        let status = response.status();
        if retryable || status.as_u16() > StatusCode::NO_CONTENT.as_u16() {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempts, status = status.as_u16(), url = %request.url, "request failed");
            self.drain(response).await;
            return Err(CloudcraftError::RequestFailed {
                status: status.as_u16(),
            });
        }

        self.read_body(response).await
    }

    async fn send(&self, request: &PreparedRequest) -> Result<SendOutcome> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CloudcraftError::Canceled),
            outcome = self.http.execute(request.to_attempt()) => Ok(outcome),
        }
    }

    fn classify_transport_error(
        &self,
        err: reqwest::Error,
        retryable: bool,
        attempts: usize,
    ) -> CloudcraftError {
        if self.cancel.is_cancelled() {
            CloudcraftError::Canceled
        } else if retryable {
            CloudcraftError::RetriesExhausted {
                attempts,
                source: err,
            }
        } else {
            CloudcraftError::Transport(err)
        }
    }

    /// Reads the rest of a body and discards it so the connection can be
    /// reused. Failures only cost the connection, so they are not surfaced.
    async fn drain(&self, mut response: reqwest::Response) {
        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                chunk = response.chunk() => chunk,
            };
            match chunk {
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %_err, "cannot drain response body");
                    return;
                }
            }
        }
    }

    async fn read_body(&self, mut response: reqwest::Response) -> Result<Response> {
        let status = response.status().as_u16();
        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0)
            .min(MAX_PREALLOCATED_BODY);
        let headers = std::mem::take(response.headers_mut());

        let mut body = Vec::with_capacity(capacity);
        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CloudcraftError::Canceled),
                chunk = response.chunk() => chunk.map_err(CloudcraftError::Body)?,
            };
            match chunk {
                Some(chunk) => body.extend_from_slice(&chunk),
                None => break,
            }
        }

        Ok(Response {
            headers,
            body: Bytes::from(body),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use reqwest::{
        header::{HeaderValue, CONTENT_TYPE},
        Method,
    };
    use url::Url;

    use super::PreparedRequest;

    #[test]
    fn every_attempt_gets_identical_body() {
        let url = Url::parse("https://example.com/blueprint").expect("valid url");
        let request = PreparedRequest::new(Method::POST, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(r#"{"name":"diagram"}"#);

        let first = request.to_attempt();
        let second = request.to_attempt();
        let expected = Bytes::from_static(br#"{"name":"diagram"}"#);

        for attempt in [&first, &second] {
            let body = attempt
                .body()
                .and_then(reqwest::Body::as_bytes)
                .expect("buffered body");
            assert_eq!(body, &expected[..]);
            assert_eq!(attempt.method(), &Method::POST);
            assert_eq!(
                attempt.headers().get(CONTENT_TYPE),
                Some(&HeaderValue::from_static("application/json"))
            );
        }
    }

    #[test]
    fn bodiless_request_stays_bodiless() {
        let url = Url::parse("https://example.com/user/me").expect("valid url");
        let request = PreparedRequest::new(Method::GET, url);
        assert!(request.to_attempt().body().is_none());
        assert!(request.body_bytes().is_none());
    }
}
