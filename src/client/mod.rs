use hyper::header::CONTENT_TYPE;
use hyper::{Body as HyperBody, Client, Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::models::plan::{StepBody, Target};

pub type HttpsClient = Client<HttpsConnector<hyper::client::HttpConnector>>;

pub fn build_client() -> HttpsClient {
    let https = HttpsConnector::new();
    Client::builder().build::<_, HyperBody>(https)
}

/// Why a single dispatch produced no usable response. Absorbed into the
/// `failed` counters by the executors, never propagated to the caller.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid method: {0}")]
    InvalidMethod(String),

    #[error("invalid request: {0}")]
    Build(#[from] hyper::http::Error),

    #[error("invalid json body: {0}")]
    Body(#[from] serde_json::Error),

    #[error(transparent)]
    Network(#[from] hyper::Error),

    #[error("request timed out")]
    TimedOut,
}

/// Join a step path onto a target base URL, stripping duplicate trailing
/// slashes from the base.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Absolute URL for a step against this target, with the target's default
/// query parameters appended when any exist.
pub(crate) fn target_url(target: &Target, path: &str) -> Result<String, RequestError> {
    let joined = join_url(&target.url, path);
    match &target.default_query_params {
        Some(params) if !params.is_empty() => {
            let mut url =
                Url::parse(&joined).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    pairs.append_pair(key, &value.to_string());
                }
            }
            Ok(url.as_str().to_string())
        }
        _ => Ok(joined),
    }
}

/// Target default headers overridden by step-specific headers.
pub(crate) fn merge_headers(
    defaults: Option<&HashMap<String, String>>,
    step: Option<&HashMap<String, String>>,
) -> HashMap<String, String> {
    let mut merged = defaults.cloned().unwrap_or_default();
    if let Some(step) = step {
        for (key, value) in step {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Issue one request and return its status. The caller times the call;
/// this function only assembles and dispatches it.
pub async fn send_request(
    client: &HttpsClient,
    method: &str,
    url: &str,
    headers: &HashMap<String, String>,
    body: Option<&StepBody>,
) -> Result<StatusCode, RequestError> {
    let uri: Uri = url
        .parse()
        .map_err(|_| RequestError::InvalidUrl(url.to_string()))?;
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| RequestError::InvalidMethod(method.to_string()))?;

    let mut builder = Request::builder().method(method).uri(uri);

    let payload = match body {
        Some(StepBody::Json(json)) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            HyperBody::from(serde_json::to_string(json)?)
        }
        Some(StepBody::Raw(raw)) => HyperBody::from(raw.clone()),
        None => HyperBody::empty(),
    };

    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let request = builder.body(payload)?;
    let response = client.request(request).await?;
    Ok(response.status())
}

/// `send_request` under the plan's global per-request timeout, if any.
/// Expiry aborts the in-flight request and surfaces as `TimedOut`.
pub async fn send_with_timeout(
    client: &HttpsClient,
    method: &str,
    url: &str,
    headers: &HashMap<String, String>,
    body: Option<&StepBody>,
    timeout: Option<Duration>,
) -> Result<StatusCode, RequestError> {
    match timeout {
        Some(limit) => {
            tokio::time::timeout(limit, send_request(client, method, url, headers, body))
                .await
                .map_err(|_| RequestError::TimedOut)?
        }
        None => send_request(client, method, url, headers, body).await,
    }
}

/// 2xx and 3xx responses count as delivered; everything else is a failed
/// step.
pub(crate) fn is_success_class(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}
