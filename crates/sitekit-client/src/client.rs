//! `SiteClient` implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::HeaderName;
use reqwest::{Method, Url};
use sitekit_core::csrf;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::middleware::{
    self, Attempt, BoxFuture, CsrfHeader, CsrfRetry, Outcome, RequestMiddleware, ResponseContext,
    ResponseMiddleware,
};
use crate::types::{ApiErrorBody, ApiRequest, ApiResponse, TokenResponse};
use crate::{
    ClientBuilder, ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT, Inner, SiteClient, USER_AGENT,
};

impl SiteClient {
    /// Create a client with the default middleware chain.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` or `ClientError::InvalidUrl` if the
    /// configuration cannot be resolved.
    pub fn new(cfg: ClientConfig) -> Result<Self, ClientError> {
        Self::builder(cfg).build()
    }

    /// Start composing a client.
    #[must_use]
    pub fn builder(cfg: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config: cfg,
            csrf: true,
            request_chain: Vec::new(),
            response_chain: Vec::new(),
        }
    }

    /// Resolved API base URL, without a trailing slash.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    /// Fetch a CSRF cookie once per session.
    ///
    /// Never fails: a failed bootstrap is logged and later mutating requests
    /// go out without a token.
    pub async fn initialize(&self) {
        match self.bootstrap().await {
            Ok(()) => debug!(present = self.csrf_token().is_some(), "csrf token initialized"),
            Err(err) => warn!(error = %err, "failed to initialize csrf token"),
        }
    }

    /// Issue the bootstrap GET. The server answers by setting the token cookie.
    ///
    /// The request bypasses the middleware chain.
    ///
    /// # Errors
    ///
    /// Returns the network or API error of the bootstrap call.
    pub async fn bootstrap(&self) -> Result<(), ClientError> {
        let req = self
            .inner
            .http
            .get(self.inner.bootstrap_url.clone())
            .build()?;
        self.execute(req).await?;
        debug!(url = %self.inner.bootstrap_url, "csrf bootstrap complete");
        Ok(())
    }

    /// Fetch a token from the JSON token endpoint.
    ///
    /// The endpoint also sets the cookie, so this doubles as a bootstrap.
    ///
    /// # Errors
    ///
    /// Returns the network or API error, or `ClientError::Json` if the body
    /// has no `csrftoken` field.
    pub async fn fetch_token(&self) -> Result<String, ClientError> {
        let req = self.inner.http.get(self.inner.token_url.clone()).build()?;
        let resp = self.execute(req).await?;
        Ok(resp.json::<TokenResponse>()?.csrftoken)
    }

    /// Current CSRF token from the cookie jar.
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        middleware::read_cookie(&self.inner.jar, &self.inner.cookie_url, &self.inner.cookie_name)
    }

    /// Send a request through the middleware chain.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` for non-2xx responses that no middleware
    /// recovered from, or the underlying network error.
    pub async fn send(&self, request: ApiRequest) -> Outcome {
        self.dispatch(&request, Attempt::First).await
    }

    /// `GET` a path.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get(&self, path: &str) -> Outcome {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn post(&self, path: &str, body: serde_json::Value) -> Outcome {
        self.send(ApiRequest::new(Method::POST, path).json(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn put(&self, path: &str, body: serde_json::Value) -> Outcome {
        self.send(ApiRequest::new(Method::PUT, path).json(body)).await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn patch(&self, path: &str, body: serde_json::Value) -> Outcome {
        self.send(ApiRequest::new(Method::PATCH, path).json(body)).await
    }

    /// `DELETE` a path.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> Outcome {
        self.send(ApiRequest::new(Method::DELETE, path)).await
    }

    // --- Private ---

    /// Run one attempt through the request chain, the network, and the
    /// response chain. Boxed because response middlewares may re-enter it.
    pub(crate) fn dispatch<'a>(
        &'a self,
        request: &'a ApiRequest,
        attempt: Attempt,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let mut outgoing = self.build_request(request)?;
            for mw in &self.inner.request_chain {
                mw.on_request(&mut outgoing);
            }

            debug!(
                method = %outgoing.method(),
                url = %outgoing.url(),
                ?attempt,
                "sending request"
            );
            let mut outcome = self.execute(outgoing).await;

            let cx = ResponseContext::new(self, request, attempt);
            for mw in &self.inner.response_chain {
                outcome = mw.on_response(&cx, outcome).await;
            }
            outcome
        })
    }

    fn build_request(&self, request: &ApiRequest) -> Result<reqwest::Request, ClientError> {
        let url = self.url(&request.path)?;
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else if path.starts_with('/') {
            format!("{}{path}", self.inner.api_url)
        } else {
            format!("{}/{path}", self.inner.api_url)
        };
        parse_url(&raw)
    }

    /// Send and buffer. Non-2xx statuses become `ClientError::Api`.
    async fn execute(&self, req: reqwest::Request) -> Outcome {
        let resp = self.inner.http.execute(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        if status.is_success() {
            return Ok(ApiResponse {
                status,
                headers,
                body,
            });
        }

        let text = String::from_utf8_lossy(&body).into_owned();
        let parsed = ApiErrorBody::parse(&text);
        Err(ClientError::Api {
            status: status.as_u16(),
            message: parsed.detail.clone().or(parsed.message),
            detail: parsed.detail,
            body: text,
        })
    }
}

impl ClientBuilder {
    /// Append a request middleware.
    #[must_use]
    pub fn request_middleware(mut self, mw: impl RequestMiddleware + 'static) -> Self {
        self.request_chain.push(Arc::new(mw));
        self
    }

    /// Append a response middleware.
    #[must_use]
    pub fn response_middleware(mut self, mw: impl ResponseMiddleware + 'static) -> Self {
        self.response_chain.push(Arc::new(mw));
        self
    }

    /// Leave the CSRF header and retry middlewares out of the chain.
    #[must_use]
    pub fn without_csrf(mut self) -> Self {
        self.csrf = false;
        self
    }

    /// Resolve configuration and build the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` for an invalid header name or a failed
    /// HTTP client build, and `ClientError::InvalidUrl` for an unparsable API URL.
    pub fn build(self) -> Result<SiteClient, ClientError> {
        let cfg = self.config;

        let api_url = first_non_empty(&[
            &cfg.api_url,
            &std::env::var("SITEKIT_API_URL").unwrap_or_default(),
            DEFAULT_API_URL,
        ])
        .trim_end_matches('/')
        .to_owned();

        let cookie_name = first_non_empty(&[
            &cfg.cookie_name,
            &std::env::var("SITEKIT_CSRF_COOKIE").unwrap_or_default(),
            csrf::DEFAULT_COOKIE_NAME,
        ]);

        let header = first_non_empty(&[
            &cfg.header_name,
            &std::env::var("SITEKIT_CSRF_HEADER").unwrap_or_default(),
            csrf::DEFAULT_HEADER_NAME,
        ]);
        let header_name = HeaderName::from_bytes(header.as_bytes()).map_err(|e| {
            ClientError::Config(format!("invalid csrf header name '{header}': {e}"))
        })?;

        let bootstrap_path = first_non_empty(&[&cfg.bootstrap_path, csrf::BOOTSTRAP_PATH]);
        let token_path = first_non_empty(&[&cfg.token_path, csrf::TOKEN_PATH]);

        let timeout = if cfg.timeout.is_zero() {
            std::env::var("SITEKIT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
        } else {
            cfg.timeout
        };

        let cookie_url = parse_url(&format!("{api_url}/"))?;
        let bootstrap_url = parse_url(&format!("{api_url}{bootstrap_path}"))?;
        let token_url = parse_url(&format!("{api_url}{token_path}"))?;

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {e}")))?;

        let mut request_chain: Vec<Arc<dyn RequestMiddleware>> = Vec::new();
        let mut response_chain: Vec<Arc<dyn ResponseMiddleware>> = Vec::new();
        if self.csrf {
            request_chain.push(Arc::new(CsrfHeader::new(
                Arc::clone(&jar),
                cookie_name.clone(),
                header_name,
            )));
            response_chain.push(Arc::new(CsrfRetry));
        }
        request_chain.extend(self.request_chain);
        response_chain.extend(self.response_chain);

        Ok(SiteClient {
            inner: Arc::new(Inner {
                api_url,
                bootstrap_url,
                token_url,
                cookie_url,
                cookie_name,
                http,
                jar,
                request_chain,
                response_chain,
            }),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw).map_err(|e| ClientError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

fn first_non_empty(vals: &[&str]) -> String {
    for v in vals {
        if !v.is_empty() {
            return (*v).to_owned();
        }
    }
    String::new()
}
