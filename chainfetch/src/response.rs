use bytes::BytesMut;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashMap, sync::OnceLock};
use tracing::{instrument, trace};

use crate::{
    media::MediaType,
    transport::{PartialResponse, RawBody, RawResponse},
    Result, StdResult, TransportError,
};

/// The body of a [`Response`], interpreted according to its `content-type`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Text(String),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&[(String, String)]> {
        match self {
            ParsedBody::Form(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A normalized response.
#[derive(Debug, Clone)]
pub struct Response {
    raw: String,
    parsed: OnceLock<ParsedBody>,
    ok: bool,
    status_code: u16,
    status_text: String,
    headers: HashMap<String, String>,
}

impl Response {
    pub(crate) fn new(
        status_code: u16,
        status_text: String,
        ok: bool,
        headers: HashMap<String, String>,
        raw: String,
    ) -> Self {
        Self {
            raw,
            parsed: OnceLock::new(),
            ok,
            status_code,
            status_text,
            headers,
        }
    }

    /// The parsed body. Computed on first access and reused afterwards.
    pub fn body(&self) -> &ParsedBody {
        self.parsed.get_or_init(|| self.parse_body())
    }

    /// The exact response text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Flattened headers, keyed by lowercase name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<MediaType<'_>> {
        self.header("content-type").and_then(MediaType::parse)
    }

    /// Deserializes the raw text as JSON, regardless of `content-type`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.raw)?)
    }

    fn parse_body(&self) -> ParsedBody {
        match self.content_type() {
            Some(media) if media.is_json() => match serde_json::from_str(&self.raw) {
                Ok(value) => ParsedBody::Json(value),
                Err(e) => {
                    trace!("body is not valid json, keeping text: {}", e);
                    ParsedBody::Text(self.raw.clone())
                }
            },
            Some(media) if media.is_form() => ParsedBody::Form(
                url::form_urlencoded::parse(self.raw.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            _ => ParsedBody::Text(self.raw.clone()),
        }
    }
}

/// Copies header entries into a flat map. Entries with an empty name or value
/// are skipped; repeated names are joined with `", "`.
pub(crate) fn flatten_headers<I, K, V>(entries: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in entries {
        let (name, value) = (name.as_ref(), value.as_ref());
        if name.is_empty() || value.is_empty() {
            continue;
        }
        headers
            .entry(name.to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

#[cfg(feature = "charset")]
fn decode_text(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(MediaType::parse)
        .and_then(|media| media.charset())
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(not(feature = "charset"))]
fn decode_text(bytes: &[u8], _content_type: Option<&str>) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn build(
    status_code: u16,
    status_text: String,
    ok: bool,
    headers: HashMap<String, String>,
    body: &[u8],
) -> Response {
    let raw = decode_text(body, headers.get("content-type").map(String::as_str));
    Response::new(status_code, status_text, ok, headers, raw)
}

/// Reads the whole body and builds a [`Response`]. A failing body chunk fails
/// the call, carrying the status and headers already received.
#[instrument(skip_all, fields(status = raw.status))]
pub(crate) async fn normalize(raw: RawResponse) -> StdResult<Response, TransportError> {
    let RawResponse {
        status,
        status_text,
        ok,
        headers,
        body,
    } = raw;
    let headers = flatten_headers(headers);
    let body = match body {
        RawBody::Buffered(bytes) => bytes,
        RawBody::Stream(mut stream) => {
            let mut buffer = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(chunk) => buffer.extend_from_slice(&chunk),
                    Err(e) => {
                        let partial = PartialResponse {
                            status: Some(status),
                            status_text: Some(status_text),
                            headers: headers.into_iter().collect(),
                            body: buffer.freeze(),
                        };
                        return Err(if e.partial().is_some() {
                            e
                        } else {
                            e.with_partial(partial)
                        });
                    }
                }
            }
            buffer.freeze()
        }
    };
    trace!(len = body.len(), "body read");
    Ok(build(status, status_text, ok, headers, &body))
}

/// Builds the response attached to a transport failure. Missing fields
/// default to status `0` and an empty status text.
pub(crate) fn normalize_partial(partial: Option<PartialResponse>) -> Response {
    let PartialResponse {
        status,
        status_text,
        headers,
        body,
    } = partial.unwrap_or_default();
    let status = status.unwrap_or_default();
    let status_text = status_text.unwrap_or_default();
    build(
        status,
        status_text,
        false,
        flatten_headers(headers),
        &body,
    )
}
