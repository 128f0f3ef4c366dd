use std::path::Path;

use reqwest::{
    Client, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE},
};
use tokio::fs::File;
use url::Url;

use crate::prelude::*;
use crate::request_client::expect_status;

use super::context::endpoint;
use super::interfaces::{ProjectId, UploadId};

const ARCHIVE_TRANSFER: &str = "archive transfer";

/// Client of the binary upload service.
#[derive(Debug, Clone)]
pub struct TransferClient {
    client: Client,
    base: Url,
}

/// Value of the `Range` header covering a whole body of `size` bytes.
fn full_range(size: u64) -> String {
    format!("bytes 0-{}", size.saturating_sub(1))
}

impl TransferClient {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Send the whole archive in one request.
    pub async fn send(
        &self,
        archive_path: &Path,
        project_id: &ProjectId,
        upload_id: &UploadId,
        token: &str,
    ) -> UploadResult<()> {
        let url = endpoint(
            &self.base,
            &["upload", project_id.0.as_str(), upload_id.0.as_str()],
        )?;
        let size = tokio::fs::metadata(archive_path)
            .await
            .map_err(UploadError::io(format!(
                "Failed to read the archive at {}",
                archive_path.display()
            )))?
            .len();
        let file = File::open(archive_path)
            .await
            .map_err(UploadError::io(format!(
                "Failed to open the archive at {}",
                archive_path.display()
            )))?;
        let body = reqwest::Body::wrap_stream(tokio_util::io::ReaderStream::new(file));

        debug!("Uploading {size} bytes to {url}");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .header(RANGE, full_range(size))
            .body(body)
            .send()
            .await
            .map_err(UploadError::http(ARCHIVE_TRANSFER))?;

        expect_status(
            response,
            ARCHIVE_TRANSFER,
            &[StatusCode::CREATED, StatusCode::ACCEPTED],
        )
        .await?;
        Ok(())
    }
}
