use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{future::IntoFuture, sync::Arc};

use crate::{
    body::{self, Body, Payload},
    params::{Headers, Params},
    pending::Pending,
    transport::{Method, OutboundRequest, Transport},
    HttpError, Response, Result, StdResult,
};

pub const DEFAULT_USER_AGENT: &str = concat!("chainfetch/", env!("CARGO_PKG_VERSION"));

/// Everything a request accumulates before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub query: Params,
    pub body: Option<Body>,
    pub user_agent: String,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            query: Params::new(),
            body: None,
            user_agent: user_agent.into(),
        }
    }

    /// The url with the query appended.
    pub fn request_url(&self) -> String {
        self.query.append_to(&self.url)
    }

    pub(crate) fn to_outbound(&self) -> OutboundRequest {
        let mut headers = self.headers.clone();
        if !headers.contains_key("user-agent") {
            headers.insert("user-agent", self.user_agent.clone());
        }
        OutboundRequest {
            method: self.method.clone(),
            url: self.request_url(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: self.body.as_ref().map(Body::to_bytes),
        }
    }
}

/// Initial configuration accepted by the `*_with` constructors.
///
/// `method` is overridden by the verb used to build the request. `headers`
/// and `query` are applied in the order given, so of two header names that
/// differ only in case the later one wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub method: Option<Method>,
    #[serde(default)]
    pub headers: Params,
    #[serde(default)]
    pub query: Params,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default, alias = "userAgent")]
    pub user_agent: Option<String>,
}

/// A chainable request.
///
/// Await it to execute it, or turn it into a [`Pending`] to attach several
/// completion handlers to one execution.
#[derive(Debug)]
pub struct Request {
    config: RequestConfig,
    transport: Arc<dyn Transport>,
}

impl Request {
    pub fn new(
        transport: Arc<dyn Transport>,
        method: Method,
        url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            config: RequestConfig::new(method, url, user_agent),
            transport,
        }
    }

    /// Headers go first so that `body` is serialized against the declared
    /// content type.
    pub(crate) fn with_options(
        transport: Arc<dyn Transport>,
        method: Method,
        url: impl Into<String>,
        default_user_agent: &str,
        options: RequestOptions,
    ) -> Self {
        let user_agent = options
            .user_agent
            .unwrap_or_else(|| default_user_agent.to_string());
        let request = Self::new(transport, method, url, user_agent)
            .set_many(options.headers)
            .query_many(options.query);
        match options.body {
            Some(body) => request.send(body),
            None => request,
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.query.insert(name, value);
        self
    }

    pub fn query_many<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.query.extend(pairs);
        self
    }

    /// `None` leaves the query untouched.
    pub fn query_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn set(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name, value);
        self
    }

    pub fn set_many<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.config.headers.extend(headers);
        self
    }

    /// `None` leaves the headers untouched.
    pub fn set_opt(self, name: impl AsRef<str>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Sets the body. Objects and arrays are encoded according to
    /// `content-type`, which defaults to `application/json`.
    pub fn send(mut self, payload: impl Into<Payload>) -> Self {
        self.config.body = body::encode(payload.into(), &mut self.config.headers);
        self
    }

    pub fn send_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.send(Payload::json(value)?))
    }

    /// Freezes the configuration. Nothing is sent until the first handler
    /// is registered on the returned value.
    pub fn pending(self) -> Pending {
        Pending::new(self.transport, self.config)
    }
}

impl IntoFuture for Request {
    type Output = StdResult<Response, HttpError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        self.pending().into_future()
    }
}
