mod body;
mod client;
mod error;
mod executor;
mod params;
mod pending;
mod request;
mod response;

pub mod media;
pub mod transport;

pub use body::{to_form, Body, Payload};
pub use client::Client;
pub use error::*;
pub use params::{Headers, Params};
pub use pending::Pending;
pub use request::{Request, RequestConfig, RequestOptions, DEFAULT_USER_AGENT};
pub use response::{ParsedBody, Response};
pub use transport::{
    Method, OutboundRequest, PartialResponse, RawBody, RawResponse, Transport,
};

#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
static DEFAULT_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(Client::default);

#[cfg(feature = "reqwest-transport")]
pub fn get(url: impl Into<String>) -> Request {
    DEFAULT_CLIENT.get(url)
}

#[cfg(feature = "reqwest-transport")]
pub fn post(url: impl Into<String>) -> Request {
    DEFAULT_CLIENT.post(url)
}

#[cfg(feature = "reqwest-transport")]
pub fn patch(url: impl Into<String>) -> Request {
    DEFAULT_CLIENT.patch(url)
}

#[cfg(feature = "reqwest-transport")]
pub fn delete(url: impl Into<String>) -> Request {
    DEFAULT_CLIENT.delete(url)
}

#[cfg(feature = "reqwest-transport")]
pub fn get_with(url: impl Into<String>, options: RequestOptions) -> Request {
    DEFAULT_CLIENT.get_with(url, options)
}

#[cfg(feature = "reqwest-transport")]
pub fn post_with(url: impl Into<String>, options: RequestOptions) -> Request {
    DEFAULT_CLIENT.post_with(url, options)
}

#[cfg(feature = "reqwest-transport")]
pub fn patch_with(url: impl Into<String>, options: RequestOptions) -> Request {
    DEFAULT_CLIENT.patch_with(url, options)
}

#[cfg(feature = "reqwest-transport")]
pub fn delete_with(url: impl Into<String>, options: RequestOptions) -> Request {
    DEFAULT_CLIENT.delete_with(url, options)
}
