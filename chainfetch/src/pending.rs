use futures::future::{BoxFuture, FutureExt, Shared};
use std::{fmt, future::IntoFuture, sync::Arc};
use tokio::sync::OnceCell;
use tracing::error;

use crate::{
    executor, request::RequestConfig, response, transport::Transport, HttpError, Response,
    StdResult,
};

type Execution = Shared<BoxFuture<'static, StdResult<Response, HttpError>>>;

struct Inner {
    config: Arc<RequestConfig>,
    execution: Execution,
    outcome: OnceCell<StdResult<Response, HttpError>>,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner")
            .field("config", &self.config)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// A request that runs at most once.
///
/// The first handler registered (through [`outcome`](Pending::outcome),
/// [`then`](Pending::then), [`catch`](Pending::catch) or `.await`) starts the
/// call on its own task; every later one, on this value or any clone of it,
/// waits for and observes the same outcome. Dropping a handler before the
/// call finishes neither cancels nor repeats it.
#[derive(Debug, Clone)]
pub struct Pending {
    inner: Arc<Inner>,
}

impl Pending {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: RequestConfig) -> Self {
        let config = Arc::new(config);
        let execution = {
            let config = config.clone();
            async move {
                let task = tokio::spawn(async move {
                    executor::execute(transport.as_ref(), &config).await
                });
                match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("request task failed: {}", e);
                        Err(HttpError::new(e.to_string(), response::normalize_partial(None)))
                    }
                }
            }
            .boxed()
            .shared()
        };
        Self {
            inner: Arc::new(Inner {
                config,
                execution,
                outcome: OnceCell::new(),
            }),
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.inner.config
    }

    /// Whether the call has finished.
    pub fn is_settled(&self) -> bool {
        self.inner.outcome.initialized() || self.inner.execution.peek().is_some()
    }

    pub async fn outcome(&self) -> &StdResult<Response, HttpError> {
        let inner = &*self.inner;
        inner.outcome.get_or_init(|| inner.execution.clone()).await
    }

    pub async fn then<T, F, R>(&self, on_resolve: F, on_reject: R) -> T
    where
        F: FnOnce(&Response) -> T,
        R: FnOnce(&HttpError) -> T,
    {
        match self.outcome().await {
            Ok(response) => on_resolve(response),
            Err(error) => on_reject(error),
        }
    }

    /// Runs `on_reject` if the call failed; `None` if it succeeded.
    pub async fn catch<T, R>(&self, on_reject: R) -> Option<T>
    where
        R: FnOnce(&HttpError) -> T,
    {
        self.outcome().await.as_ref().err().map(on_reject)
    }
}

impl IntoFuture for Pending {
    type Output = StdResult<Response, HttpError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.outcome().await.clone() })
    }
}
