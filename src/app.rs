use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{
    Parser,
    builder::{Styles, styling},
};
use log::{debug, info};
use url::Url;

use crate::config::UploaderConfig;
use crate::upload::{
    DEFAULT_METADATA_URL, DEFAULT_UPLOAD_URL, UploadContext, UploadCoordinator, UploadKind,
    UploadRequest,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

fn create_styles() -> Styles {
    styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Blue.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(
    name = "upload-mapping",
    version,
    about = "Uploads ProGuard/Native mapping files for Android crash symbolication",
    styles = create_styles()
)]
pub struct Cli {
    /// API key for your project
    #[arg(short = 'k', long, env = "MAPPING_UPLOAD_API_KEY")]
    pub api_key: Option<String>,

    /// The build UUID, used to name the mapping in the archive
    #[arg(
        short = 'u',
        long = "uuid",
        visible_alias = "build-id",
        env = "MAPPING_UPLOAD_BUILD_ID"
    )]
    pub build_id: Option<String>,

    /// Path to a ProGuard/Native mapping file for the build. Repeat to upload several files
    #[arg(short = 'p', long = "path", required = true)]
    pub paths: Vec<PathBuf>,

    /// An auth token to use for the upload
    #[arg(short = 't', long, env = "MAPPING_UPLOAD_TOKEN")]
    pub token: Option<String>,

    /// How long to wait (in ms) for the upload to be processed
    #[arg(long = "timeout", env = "MAPPING_UPLOAD_TIMEOUT")]
    pub timeout_ms: Option<u64>,

    /// Upload native (NDK) symbol files instead of a ProGuard mapping
    #[arg(short = 'n', long)]
    pub ndk: bool,

    /// Properties file providing defaults for the options above.
    /// Defaults to `flurry.config` in the working directory, when it exists
    #[arg(short = 'c', long, env = "MAPPING_UPLOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// The URL of the metadata API
    #[arg(
        long,
        env = "MAPPING_UPLOAD_METADATA_URL",
        hide = true,
        default_value = DEFAULT_METADATA_URL
    )]
    pub metadata_url: String,

    /// The URL of the upload API
    #[arg(
        long,
        env = "MAPPING_UPLOAD_UPLOAD_URL",
        hide = true,
        default_value = DEFAULT_UPLOAD_URL
    )]
    pub upload_url: String,
}

impl Cli {
    /// Merge the flags with the config file into an upload request.
    ///
    /// Missing values are left empty for the upload validation to report.
    pub fn to_upload_request(&self, config: UploaderConfig) -> UploadRequest {
        let kind = if self.ndk || config.ndk.unwrap_or(false) {
            UploadKind::Native
        } else {
            UploadKind::Java
        };
        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .or(config.timeout)
            .unwrap_or(DEFAULT_TIMEOUT);

        UploadRequest {
            api_key: self.api_key.clone().or(config.api_key).unwrap_or_default(),
            build_id: self.build_id.clone().or(config.build_id),
            file_paths: self.paths.clone(),
            token: self.token.clone().or(config.token).unwrap_or_default(),
            kind,
            timeout,
        }
    }

    pub fn to_upload_context(&self) -> Result<UploadContext> {
        let metadata_base = Url::parse(&self.metadata_url)
            .with_context(|| format!("Invalid metadata URL: {}", self.metadata_url))?;
        let upload_base = Url::parse(&self.upload_url)
            .with_context(|| format!("Invalid upload URL: {}", self.upload_url))?;
        Ok(UploadContext::default()
            .with_metadata_base(metadata_base)
            .with_upload_base(upload_base))
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = UploaderConfig::load(cli.config.as_deref())?;
    let request = cli.to_upload_request(config);
    let context = cli.to_upload_context()?;
    debug!(
        "Uploading {} {} mapping file(s) with a timeout of {:?}",
        request.file_paths.len(),
        request.kind.display_name(),
        request.timeout
    );

    let coordinator = UploadCoordinator::new(context)?;
    let report = coordinator.upload(&request).await?;
    info!(
        "Upload {} for project {} processed after {} status checks",
        report.upload_id, report.project_id, report.polls
    );
    Ok(())
}
