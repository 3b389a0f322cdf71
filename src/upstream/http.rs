//! The generic HTTP fetch primitive the upstream clients are written against.
//!
//! [`HttpFetch`] makes no promise about retries; callers own that policy.
//! [`ReqwestFetch`] is the production implementation, tests plug in fakes.

use std::time::Duration;

use futures::{FutureExt, future::BoxFuture};
use reqwest::{Client, Method, StatusCode, header::HeaderMap, redirect::Policy};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{UpstreamError, UpstreamResult};

/// Request payload encodings used by the upstreams.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/json`.
    Json(Value),
    /// `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// Transport-agnostic request description.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl FetchRequest {
    /// `GET url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// `POST url`.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append `Authorization: Bearer <token>`.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a form body.
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(RequestBody::Form(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ));
        self
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchResponse {
    /// Build a response from parts; mostly useful for fakes.
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body.
    pub fn json<T: DeserializeOwned>(&self) -> UpstreamResult<T> {
        serde_json::from_str(&self.body).map_err(|err| UpstreamError::Decode {
            url: self.url.clone(),
            message: err.to_string(),
        })
    }

    /// Turn a non-success response into the matching [`UpstreamError`].
    pub fn error_for_status(self) -> UpstreamResult<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(UpstreamError::from_status(&self.url, self.status, &self.body))
        }
    }

    /// Header value as UTF-8, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// The HTTP primitive every upstream client is written against.
pub trait HttpFetch: Send + Sync {
    /// Perform one request. Non-success statuses are returned, not raised.
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, UpstreamResult<FetchResponse>>;
}

/// [`HttpFetch`] backed by `reqwest`.
///
/// Redirects are not followed: the console network's authorization step
/// hands back its code in a `Location` header that must be read directly.
#[derive(Clone)]
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    /// Build a client with the given request timeout.
    pub fn new(timeout: Duration) -> UpstreamResult<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|err| UpstreamError::Transport {
                url: String::new(),
                message: err.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetch {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, UpstreamResult<FetchResponse>> {
        async move {
            let url = request.url.clone();
            let mut builder = self.client.request(request.method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder = match request.body {
                Some(RequestBody::Json(body)) => builder.json(&body),
                Some(RequestBody::Form(pairs)) => builder.form(&pairs),
                None => builder,
            };

            let transport = |err: reqwest::Error| UpstreamError::Transport {
                url: url.clone(),
                message: err.to_string(),
            };
            let response = builder.send().await.map_err(transport)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(transport)?;
            Ok(FetchResponse {
                url: url.clone(),
                status,
                headers,
                body,
            })
        }
        .boxed()
    }
}
