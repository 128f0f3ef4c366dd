//! Upload ProGuard/R8 and native symbol mapping files to the crash reporting backend.
//!
//! The [`upload::UploadCoordinator`] never exits the process: every failure is returned as an
//! [`UploadError`]. Only the `upload-mapping` binary turns an error into an exit status.

mod prelude;
mod request_client;

pub mod app;
pub mod config;
pub mod error;
pub mod local_logger;
pub mod logger;
pub mod upload;

pub use error::{ErrorKind, UploadError, UploadResult};
pub use local_logger::{clean_logger, init_local_logger};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
