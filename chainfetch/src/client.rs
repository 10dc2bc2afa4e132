use std::sync::Arc;

use crate::{
    request::{Request, RequestOptions, DEFAULT_USER_AGENT},
    transport::{Method, Transport},
};

/// Builds requests against one transport with a shared default user agent.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    user_agent: String,
}

#[cfg(feature = "reqwest-transport")]
impl Default for Client {
    fn default() -> Self {
        Self::new(crate::transport::ReqwestTransport::default())
    }
}

impl Client {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> Request {
        Request::new(self.transport.clone(), method, url, self.user_agent.clone())
    }

    pub fn request_with(
        &self,
        method: Method,
        url: impl Into<String>,
        options: RequestOptions,
    ) -> Request {
        Request::with_options(
            self.transport.clone(),
            method,
            url,
            &self.user_agent,
            options,
        )
    }

    pub fn get(&self, url: impl Into<String>) -> Request {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: impl Into<String>) -> Request {
        self.request(Method::POST, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> Request {
        self.request(Method::PATCH, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> Request {
        self.request(Method::DELETE, url)
    }

    pub fn get_with(&self, url: impl Into<String>, options: RequestOptions) -> Request {
        self.request_with(Method::GET, url, options)
    }

    pub fn post_with(&self, url: impl Into<String>, options: RequestOptions) -> Request {
        self.request_with(Method::POST, url, options)
    }

    pub fn patch_with(&self, url: impl Into<String>, options: RequestOptions) -> Request {
        self.request_with(Method::PATCH, url, options)
    }

    pub fn delete_with(&self, url: impl Into<String>, options: RequestOptions) -> Request {
        self.request_with(Method::DELETE, url, options)
    }
}
