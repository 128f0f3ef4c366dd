//! The upload-and-confirm workflow: archive, register, transfer, then poll.

mod archive;
mod context;
mod coordinator;
mod interfaces;
mod metadata_client;
mod polling;
mod transfer_client;

pub use archive::{Archive, build_archive};
pub use context::{DEFAULT_METADATA_URL, DEFAULT_UPLOAD_URL, UploadContext};
pub use coordinator::{UploadCoordinator, UploadStage, validate_request};
pub use interfaces::{
    ProjectId, UploadId, UploadKind, UploadRecord, UploadReport, UploadRequest, UploadStatus,
};
pub use metadata_client::MetadataClient;
pub use polling::{PollSchedule, PollingPolicy, wait_for_processing};
pub use transfer_client::TransferClient;
