use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result, StdResult, TransportError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Method(http::Method);

impl Method {
    pub const GET: Method = Method(http::Method::GET);
    pub const POST: Method = Method(http::Method::POST);
    pub const PUT: Method = Method(http::Method::PUT);
    pub const PATCH: Method = Method(http::Method::PATCH);
    pub const DELETE: Method = Method(http::Method::DELETE);
    pub const HEAD: Method = Method(http::Method::HEAD);
    pub const OPTIONS: Method = Method(http::Method::OPTIONS);

    pub fn from_bytes(s: &[u8]) -> Result<Self> {
        http::Method::from_bytes(s)
            .map(Method)
            .map_err(|_| Error::InvalidRequest(format!("invalid method: {:?}", s)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> http::Method {
        self.0
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Method {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D>(deserializer: D) -> StdResult<Method, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Method::from_bytes(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// A fully assembled request, as handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub type BodyStream = BoxStream<'static, StdResult<Bytes, TransportError>>;

pub enum RawBody {
    Buffered(Bytes),
    Stream(BodyStream),
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawBody::Buffered(bytes) => f.debug_tuple("Buffered").field(bytes).finish(),
            RawBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// What a transport hands back before normalization.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub ok: bool,
    pub headers: Vec<(String, String)>,
    pub body: RawBody,
}

impl RawResponse {
    /// A buffered response; the status text is the canonical reason phrase.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self::with_body(status, RawBody::Buffered(body.into()))
    }

    pub fn streaming(status: u16, body: BodyStream) -> Self {
        Self::with_body(status, RawBody::Stream(body))
    }

    fn with_body(status: u16, body: RawBody) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            ok: (200..300).contains(&status),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }
}

/// Whatever response data a failed transport call still managed to see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialResponse {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

pub(crate) fn canonical_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

/// The HTTP client that actually performs a call.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    async fn fetch(&self, request: OutboundRequest) -> StdResult<RawResponse, TransportError>;
}

#[cfg(feature = "reqwest-transport")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_transport {
    use futures::StreamExt;
    use tracing::{debug, instrument};

    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
        async fn fetch(&self, request: OutboundRequest) -> StdResult<RawResponse, TransportError> {
            let mut builder = self
                .client
                .request(request.method.into_inner(), &request.url);
            for (key, value) in request.headers.into_iter() {
                builder = builder.header(key, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            let response = builder.send().await?;
            let status = response.status();
            debug!(status = status.as_u16(), "response received");
            let headers = response
                .headers()
                .iter()
                .map(|(key, value)| {
                    (
                        key.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = futures::stream::try_unfold(response, |mut response| async move {
                let chunk = response.chunk().await?;
                Ok::<_, TransportError>(chunk.map(|chunk| (chunk, response)))
            })
            .boxed();
            Ok(RawResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                ok: status.is_success(),
                headers,
                body: RawBody::Stream(body),
            })
        }
    }

    impl From<reqwest::Error> for TransportError {
        fn from(e: reqwest::Error) -> Self {
            let error = TransportError::new(e.to_string());
            match e.status() {
                Some(status) => error.with_partial(PartialResponse {
                    status: Some(status.as_u16()),
                    status_text: status.canonical_reason().map(str::to_string),
                    ..Default::default()
                }),
                None => error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method() {
        let method = Method::from_bytes(b"GET").unwrap();
        assert_eq!(method.as_str(), "GET");
        assert_eq!(method, Method::GET);
        assert_eq!(method.into_inner(), http::Method::GET);
        assert!(matches!(
            Method::from_bytes(b"BAD METHOD"),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_method_serde() {
        let method: Method = serde_json::from_str("\"PATCH\"").unwrap();
        assert_eq!(method, Method::PATCH);
        assert_eq!(serde_json::to_string(&Method::DELETE).unwrap(), "\"DELETE\"");
        assert!(serde_json::from_str::<Method>("\"\"").is_err());
    }

    #[test]
    fn test_raw_response() {
        let raw = RawResponse::new(404, "missing").header("X-Trace", "1");
        assert_eq!(raw.status_text, "Not Found");
        assert!(!raw.ok);
        assert_eq!(raw.headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert!(RawResponse::new(204, "").ok);
        assert_eq!(RawResponse::new(599, "").status_text, "");
    }

    #[cfg(feature = "reqwest-transport")]
    mod reqwest_transport_tests {
        use super::*;
        use crate::tests::serve_once;

        #[tokio::test]
        async fn test_reqwest_transport() {
            let (addr, server) = serve_once(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
            )
            .await;
            let transport = ReqwestTransport::default();
            let request = OutboundRequest {
                method: Method::GET,
                url: format!("http://{}/path?a=1", addr),
                headers: vec![("x-token".to_string(), "secret".to_string())],
                body: None,
            };
            let raw = transport.fetch(request).await.unwrap();
            assert_eq!(raw.status, 200);
            assert_eq!(raw.status_text, "OK");
            assert!(raw.ok);
            assert!(raw
                .headers
                .contains(&("content-type".to_string(), "text/plain".to_string())));
            assert!(matches!(raw.body, RawBody::Stream(_)));

            let received = server.await.unwrap().to_lowercase();
            assert!(received.starts_with("get /path?a=1 http/1.1"));
            assert!(received.contains("x-token: secret"));
        }

        #[tokio::test]
        async fn test_reqwest_transport_refused() {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            let request = OutboundRequest {
                method: Method::GET,
                url: format!("http://{}/", addr),
                headers: Vec::new(),
                body: None,
            };
            let error = ReqwestTransport::default().fetch(request).await.unwrap_err();
            assert!(error.partial().is_none());
            assert!(!error.message().is_empty());
        }
    }
}
