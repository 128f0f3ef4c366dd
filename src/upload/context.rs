use std::time::Duration;

use url::Url;

use crate::prelude::*;

use super::polling::PollingPolicy;

pub const DEFAULT_METADATA_URL: &str = "https://crash-metadata.flurry.com/pulse/v1";
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.flurry.com/upload/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(5);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by every upload made by one coordinator. Immutable once built.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub metadata_base: Url,
    pub upload_base: Url,
    pub connect_timeout: Duration,
    /// Timeout of a single metadata request. The archive transfer has no overall deadline.
    pub read_timeout: Duration,
    /// How long an idle pooled connection is kept for reuse.
    pub pool_idle_timeout: Duration,
    pub polling: PollingPolicy,
}

impl Default for UploadContext {
    fn default() -> Self {
        Self {
            metadata_base: Url::parse(DEFAULT_METADATA_URL).expect("default metadata URL is valid"),
            upload_base: Url::parse(DEFAULT_UPLOAD_URL).expect("default upload URL is valid"),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            pool_idle_timeout: POOL_IDLE_TIMEOUT,
            polling: PollingPolicy::default(),
        }
    }
}

impl UploadContext {
    pub fn with_metadata_base(mut self, url: Url) -> Self {
        self.metadata_base = url;
        self
    }

    pub fn with_upload_base(mut self, url: Url) -> Self {
        self.upload_base = url;
        self
    }

    pub fn with_polling(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration, pool_idle: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self.pool_idle_timeout = pool_idle;
        self
    }
}

/// Append path segments to a base URL, keeping the base path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> UploadResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UploadError::Validation(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse(DEFAULT_METADATA_URL).unwrap();
        let url = endpoint(&base, &["project", "12", "uploads"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://crash-metadata.flurry.com/pulse/v1/project/12/uploads"
        );

        let base = Url::parse("http://127.0.0.1:8080/upload/v1/").unwrap();
        let url = endpoint(&base, &["upload", "1", "2"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/upload/v1/upload/1/2");
    }

    #[test]
    fn test_endpoint_rejects_non_base_url() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(endpoint(&base, &["project"]).unwrap_err().is_validation());
    }
}
