use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::prelude::*;
use crate::upload::UploadContext;

const USER_AGENT: &str = concat!("mapping-uploader/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by every request of one coordinator.
///
/// No client-wide deadline is set, so a large archive may take as long as it needs.
/// Metadata calls set their own per-request timeout.
pub fn build_client(context: &UploadContext) -> UploadResult<Client> {
    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .connect_timeout(context.connect_timeout)
        .pool_idle_timeout(context.pool_idle_timeout)
        .build()
        .map_err(UploadError::http("client setup"))
}

/// Ensure that a response has one of the `accepted` statuses.
///
/// A 401 always means the token was rejected, whatever the accepted set.
pub async fn expect_status(
    response: Response,
    operation: &'static str,
    accepted: &[StatusCode],
) -> UploadResult<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(UploadError::Unauthorized { operation });
    }
    if !accepted.contains(&status) {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable response body>".to_string());
        return Err(UploadError::UnexpectedStatus {
            operation,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Read a JSON body, reporting malformed documents as invalid responses.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    operation: &'static str,
) -> UploadResult<T> {
    let text = response.text().await.map_err(UploadError::http(operation))?;
    serde_json::from_str(&text).map_err(|err| UploadError::InvalidResponse {
        operation,
        message: err.to_string(),
    })
}
