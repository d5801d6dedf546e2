use std::fmt;
use std::sync::Arc;

use reqwest::{
    header::{self, HeaderValue},
    Method,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    endpoint,
    error::ConfigError,
    executor::{Executor, PreparedRequest},
    limiter::RateLimiter,
    options::DEFAULT_TIMEOUT,
    params::{SnapshotParams, DEFAULT_SNAPSHOT_FORMAT},
    transport, AwsService, AzureService, BlueprintService, CloudcraftError, Config, Response,
    Result, RetryPolicy, UserService,
};

#[derive(Clone)]
/// HTTP client for the Cloudcraft developer API.
///
/// Cloning is cheap. Clones share the connection pool, the retry policy and
/// the request pacing; none of them change after construction.
pub struct CloudcraftClient {
    http: reqwest::Client,
    endpoint: Url,
    authorization: HeaderValue,
    policy: Arc<RetryPolicy>,
    limiter: Option<Arc<RateLimiter>>,
    cancel: CancellationToken,
}

impl fmt::Debug for CloudcraftClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudcraftClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("authorization", &"<redacted>")
            .field("policy", &self.policy)
            .field("paced", &self.limiter.is_some())
            .finish()
    }
}

impl CloudcraftClient {
    /// Creates a client from a validated [`Config`].
    ///
    /// Fails with [`CloudcraftError::Config`] before any request is made when
    /// the endpoint or the API key is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let endpoint = endpoint::parse(&config.scheme, &config.host, &config.port, &config.path)
            .map_err(ConfigError::from)?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.key))
            .map_err(|_| ConfigError::InvalidKeyFormat)?;
        authorization.set_sensitive(true);

        let options = config.options;
        let timeout = if options.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            options.timeout
        };

        Ok(Self {
            http: transport::build(timeout)?,
            endpoint,
            authorization,
            policy: Arc::new(RetryPolicy::from_options(&options)),
            limiter: options
                .requests_per_second
                .and_then(RateLimiter::per_second)
                .map(Arc::new),
            cancel: CancellationToken::new(),
        })
    }

    /// Creates a client from `CLOUDCRAFT_*` environment variables.
    ///
    /// See [`Config::from_env`] for the variables read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cloudcraft_http::CloudcraftClient;
    ///
    /// let client = CloudcraftClient::from_env().expect("missing CLOUDCRAFT_API_KEY");
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env())
    }

    /// Replaces the retry policy, e.g. to inject a custom predicate.
    ///
    /// The policy is used as given; see [`RetryPolicy::new`] for inverted
    /// delay bounds.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Returns a client whose calls are canceled when `token` fires.
    ///
    /// A canceled call returns [`CloudcraftError::Canceled`] without further
    /// attempts, whether it was sending, reading or backing off.
    ///
    /// ```no_run
    /// # async fn demo(client: cloudcraft_http::CloudcraftClient) {
    /// use cloudcraft_http::CancellationToken;
    ///
    /// let token = CancellationToken::new();
    /// let scoped = client.with_cancellation(token.clone());
    /// tokio::spawn(async move {
    ///     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    ///     token.cancel();
    /// });
    /// let _ = scoped.blueprints().list().await;
    /// # }
    /// ```
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Base URL every resource path is appended to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn aws(&self) -> AwsService<'_> {
        AwsService::new(self)
    }

    pub fn azure(&self) -> AzureService<'_> {
        AzureService::new(self)
    }

    pub fn blueprints(&self) -> BlueprintService<'_> {
        BlueprintService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }

    /// Builds a request carrying the bearer token.
    pub fn prepare(&self, method: Method, url: Url) -> PreparedRequest {
        PreparedRequest::new(method, url).header(header::AUTHORIZATION, self.authorization.clone())
    }

    /// Executes a prepared request with retries.
    pub async fn execute(&self, request: PreparedRequest) -> Result<Response> {
        let executor = Executor {
            http: &self.http,
            policy: &self.policy,
            limiter: self.limiter.as_deref(),
            cancel: &self.cancel,
        };
        executor.execute(&request).await
    }

    pub(crate) fn resource_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint::resource_url(&self.endpoint, segments)
            .map_err(|err| CloudcraftError::Config(err.into()))
    }

    pub(crate) async fn send(&self, method: Method, url: Url) -> Result<Response> {
        self.execute(self.prepare(method, url)).await
    }

    pub(crate) async fn send_json<B: serde::Serialize>(
        &self,
        method: Method,
        url: Url,
        payload: &B,
    ) -> Result<Response> {
        let request = self.prepare_json(method, url, payload)?;
        self.execute(request).await
    }

    pub(crate) fn prepare_json<B: serde::Serialize>(
        &self,
        method: Method,
        url: Url,
        payload: &B,
    ) -> Result<PreparedRequest> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| CloudcraftError::Decode(format!("cannot encode request JSON: {err}")))?;
        Ok(self
            .prepare(method, url)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .body(body))
    }

    /// Renders a live snapshot of a registered cloud account.
    pub(crate) async fn account_snapshot(
        &self,
        provider: &str,
        id: &str,
        region: &str,
        format: &str,
        params: &SnapshotParams,
    ) -> Result<Response> {
        require(id, "account ID")?;
        require(region, "region")?;
        let format = if format.is_empty() {
            DEFAULT_SNAPSHOT_FORMAT
        } else {
            format
        };

        let mut url = self.resource_url(&[provider, "account", id, region, format])?;
        params.query().apply(&mut url);
        self.send(Method::GET, url).await
    }
}

/// Fails with [`CloudcraftError::InvalidArgument`] when `value` is empty.
pub(crate) fn require(value: &str, field: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(CloudcraftError::InvalidArgument { field });
    }
    Ok(())
}
