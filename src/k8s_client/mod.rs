pub mod api;

use api::{
    cluster_config::{AuthMethod, ClusterConfig},
    ApiGetter, K8sApiError, Status, REASON_FORBIDDEN, REASON_NOT_FOUND,
};
use backoff::{future::retry_notify, ExponentialBackoff};
use futures_util::TryFutureExt;
use reqwest::{header, Method, Request, Response, Url};
use std::{
    str::FromStr,
    time::{Duration, Instant},
};

pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct K8sClient {
    base_url: Url,
    client: reqwest::Client,
    retry_timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum K8sClientError {
    #[error("Request error {:?}", _0)]
    Reqwest(#[from] reqwest::Error),
    #[error("Url parse error {:?}", _0)]
    UrlParse(#[from] url::ParseError),
    #[error("Kubernetes API error: {}", _0)]
    K8sApi(#[from] K8sApiError),
    #[error("Invalid group version {:?}", _0)]
    InvalidGroupVersion(String),
}

impl K8sClientError {
    /// The server answered with a `NotFound` status.
    pub fn is_not_found(&self) -> bool {
        self.reason() == Some(REASON_NOT_FOUND)
    }

    /// The server answered with a `Forbidden` status.
    pub fn is_forbidden(&self) -> bool {
        self.reason() == Some(REASON_FORBIDDEN)
    }

    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::K8sApi(K8sApiError::UnexpectedStatus { status, .. }) => Some(status),
            _ => None,
        }
    }

    fn reason(&self) -> Option<&str> {
        match self {
            Self::K8sApi(err) => err.reason(),
            _ => None,
        }
    }
}

impl K8sClient {
    pub fn new(config: ClusterConfig) -> Result<Self, K8sClientError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls() // identity from PEM only works in rustls
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(cacert) = config.cacert {
            builder = builder
                .add_root_certificate(cacert)
                .tls_built_in_root_certs(false)
                .https_only(true);
        }
        builder = match config.auth {
            AuthMethod::Identity(identity) => builder.identity(identity),
            AuthMethod::Token(token) => {
                let mut headers = header::HeaderMap::new();
                headers.insert(header::AUTHORIZATION, token);
                builder.default_headers(headers)
            }
            AuthMethod::None => builder,
        };
        let client = builder.build().map_err(K8sClientError::Reqwest)?;
        let mut base_url = reqwest::Url::from_str(&config.server).map_err(K8sClientError::UrlParse)?;
        // request paths are joined relative to the server's own path, e.g. behind a proxy prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            client,
            retry_timeout: Some(DEFAULT_RETRY_TIMEOUT),
        })
    }

    /// Bounds how long transient transport errors are retried; `None` retries forever.
    pub fn with_retry_timeout(mut self, retry_timeout: Option<Duration>) -> Self {
        self.retry_timeout = retry_timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(50),
            current_interval: Duration::from_millis(50),
            max_elapsed_time: self.retry_timeout,
            randomization_factor: 0.1,
            max_interval: Duration::from_secs(10),
            multiplier: 1.3,
            clock: Default::default(),
            start_time: Instant::now(),
        }
    }
    fn notify(err: K8sClientError, duration: Duration) {
        tracing::warn!(retry_in = ?duration, "error sending request: {}", err);
    }
    async fn send(&self, method: &Method, path: &str) -> Result<Response, K8sClientError> {
        let url = &self.base_url.join(path.trim_start_matches('/'))?;
        let send = move || {
            let req = Request::new(method.clone(), url.clone());

            self.client.execute(req).map_err(|e| {
                if e.is_connect() || e.is_decode() || e.is_timeout() {
                    backoff::Error::Transient(K8sClientError::from(e))
                } else {
                    backoff::Error::Permanent(K8sClientError::from(e))
                }
            })
        };
        retry_notify(self.backoff(), &send, Self::notify).await
    }

    /// Issues the getter's request against an absolute path of the apiserver and decodes the body.
    pub async fn get<T: ApiGetter>(&self, getter: &T) -> Result<T::Output, K8sClientError> {
        let req = getter.get();
        tracing::trace!(path = req.absolute_path.as_str(), "GET");
        let resp = self.send(&req.method, &req.absolute_path).await?;
        let code = resp.status();
        let bytes = resp.bytes().await?;
        if !(req.status_check)(code) {
            let status = Status::from_response(code, &bytes);
            tracing::debug!(path = req.absolute_path.as_str(), ?status, "unsuccessful");
            return Err(K8sApiError::UnexpectedStatus { code, status }.into());
        }
        let result = (req.response)(&bytes)?;
        Ok(result)
    }
}
