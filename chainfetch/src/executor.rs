use tracing::{debug, instrument, warn};

use crate::{
    request::RequestConfig, response, transport::Transport, HttpError, Response, StdResult,
};

/// Performs one call for `config` and normalizes the outcome.
#[instrument(skip_all, fields(method = %config.method, url = %config.url))]
pub(crate) async fn execute(
    transport: &dyn Transport,
    config: &RequestConfig,
) -> StdResult<Response, HttpError> {
    let request = config.to_outbound();
    debug!(url = %request.url, "sending request");
    let outcome = match transport.fetch(request).await {
        Ok(raw) => response::normalize(raw).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(response) if response.ok() => {
            debug!(status = response.status_code(), "request succeeded");
            Ok(response)
        }
        Ok(response) => {
            let error = HttpError::from_status(response);
            warn!("request failed: {}", error);
            Err(error)
        }
        Err(e) => {
            let (message, partial) = e.into_parts();
            let error = HttpError::new(message, response::normalize_partial(partial));
            warn!("transport failed: {}", error);
            Err(error)
        }
    }
}
