use std::fmt::Display;

use console::style;

use crate::prelude::*;
use crate::request_client::build_client;

use super::archive::build_archive;
use super::context::UploadContext;
use super::interfaces::{UploadKind, UploadReport, UploadRequest};
use super::metadata_client::MetadataClient;
use super::polling::wait_for_processing;
use super::transfer_client::TransferClient;

/// Stages of one upload, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    BuildingArchive,
    ResolvingProject,
    RegisteringUpload,
    Transferring,
    Polling,
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStage::BuildingArchive => write!(f, "Building the archive"),
            UploadStage::ResolvingProject => write!(f, "Looking up the project"),
            UploadStage::RegisteringUpload => write!(f, "Registering the upload"),
            UploadStage::Transferring => write!(f, "Uploading the archive"),
            UploadStage::Polling => write!(f, "Waiting for the upload to be processed"),
        }
    }
}

/// Check a request before anything touches the network.
pub async fn validate_request(request: &UploadRequest) -> UploadResult<()> {
    if request.file_paths.is_empty() {
        return Err(UploadError::Validation(format!(
            "No {} mapping file provided",
            request.kind.display_name()
        )));
    }
    for path in &request.file_paths {
        let metadata = tokio::fs::metadata(path).await.map_err(|_| {
            UploadError::Validation(format!(
                "{} does not exist. Please provide the path to the {} mapping file",
                path.display(),
                request.kind.display_name()
            ))
        })?;
        if metadata.is_dir() {
            return Err(UploadError::Validation(format!(
                "{} is a directory. Please provide the path to the {} mapping file",
                path.display(),
                request.kind.display_name()
            )));
        }
        if !metadata.is_file() {
            return Err(UploadError::Validation(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
    }
    if request.api_key.is_empty() {
        return Err(UploadError::Validation("No API key provided".into()));
    }
    if request.kind == UploadKind::Java && request.name_hint().is_none() {
        return Err(UploadError::Validation("No UUID provided".into()));
    }
    if request.token.is_empty() {
        return Err(UploadError::Validation("No token provided".into()));
    }
    Ok(())
}

/// Runs the archive, lookup, registration, transfer and polling steps of an upload.
pub struct UploadCoordinator {
    context: UploadContext,
    metadata: MetadataClient,
    transfer: TransferClient,
}

impl UploadCoordinator {
    pub fn new(context: UploadContext) -> UploadResult<Self> {
        let client = build_client(&context)?;
        Ok(Self {
            metadata: MetadataClient::new(
                client.clone(),
                context.metadata_base.clone(),
                context.read_timeout,
            ),
            transfer: TransferClient::new(client, context.upload_base.clone()),
            context,
        })
    }

    /// Upload one set of mapping files and wait until the backend has processed them.
    pub async fn upload(&self, request: &UploadRequest) -> UploadResult<UploadReport> {
        validate_request(request).await?;
        let token = request.token.as_str();

        enter_stage(UploadStage::BuildingArchive);
        let archive = build_archive(&request.file_paths, request.name_hint()).await?;
        end_group!();

        enter_stage(UploadStage::ResolvingProject);
        let project_id = self
            .metadata
            .resolve_project(&request.api_key, token)
            .await?;
        info!("Found project {project_id} for api key {}", request.api_key);
        end_group!();

        enter_stage(UploadStage::RegisteringUpload);
        let upload_id = self
            .metadata
            .register_upload(&project_id, request.kind, archive.size(), token)
            .await?;
        info!("Created upload with ID: {upload_id}");
        end_group!();

        enter_stage(UploadStage::Transferring);
        self.transfer
            .send(archive.path(), &project_id, &upload_id, token)
            .await?;
        info!(
            "{} mapping uploaded ({} bytes)",
            request.kind.display_name(),
            archive.size()
        );
        end_group!();
        let archive_size = archive.size();
        drop(archive);

        enter_stage(UploadStage::Polling);
        let schedule = self.context.polling.schedule(request.timeout);
        let polls =
            wait_for_processing(&self.metadata, &project_id, &upload_id, token, schedule).await?;
        end_group!();
        info!("{}", style("Upload completed successfully!").green().bold());

        Ok(UploadReport {
            project_id,
            upload_id,
            archive_size,
            polls,
        })
    }

    /// Upload several file sets one after the other, stopping at the first failure.
    pub async fn upload_all(&self, requests: &[UploadRequest]) -> UploadResult<Vec<UploadReport>> {
        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            reports.push(self.upload(request).await?);
        }
        Ok(reports)
    }
}

fn enter_stage(stage: UploadStage) {
    debug!("Entering stage {stage:?}");
    start_group!(stage);
}
