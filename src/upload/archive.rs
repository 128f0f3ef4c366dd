use std::path::{Path, PathBuf};

use async_compression::tokio::write::GzipEncoder;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_tar::Builder;
use uuid::Uuid;

use crate::prelude::*;

/// A gzip-compressed tar archive of mapping files, stored in a temporary file.
///
/// The file is removed when the archive is dropped.
#[derive(Debug)]
pub struct Archive {
    path: TempPath,
    size: u64,
    entry_names: Vec<String>,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the compressed archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn entry_names(&self) -> &[String] {
        &self.entry_names
    }
}

/// Name every entry of the archive.
///
/// A single file with a name hint is stored as `<hint>.txt`. In every other case each entry gets
/// a fresh random name, so names never collide when several files share one build id.
fn entry_names(file_count: usize, name_hint: Option<&str>) -> Vec<String> {
    match name_hint {
        Some(hint) if file_count == 1 && !hint.is_empty() => vec![format!("{hint}.txt")],
        _ => (0..file_count)
            .map(|_| format!("{}.txt", Uuid::new_v4()))
            .collect(),
    }
}

/// Package `files` into a single `.tgz` archive, one entry per file.
pub async fn build_archive(files: &[PathBuf], name_hint: Option<&str>) -> UploadResult<Archive> {
    let time_start = std::time::Instant::now();
    let temp_file = tempfile::Builder::new()
        .prefix("mapping-archive")
        .suffix(".tgz")
        .tempfile()
        .map_err(UploadError::io("Failed to create the temporary archive file"))?;
    let file = File::create(temp_file.path())
        .await
        .map_err(UploadError::io(format!(
            "Failed to open the temporary archive file at {}",
            temp_file.path().display()
        )))?;
    let path = temp_file.into_temp_path();

    let names = entry_names(files.len(), name_hint);
    let mut tar = Builder::new(GzipEncoder::new(file));
    for (source, name) in files.iter().zip(&names) {
        trace!("Adding {} to the archive as {name}", source.display());
        tar.append_path_with_name(source, name)
            .await
            .map_err(UploadError::io(format!(
                "Failed to add {} to the archive",
                source.display()
            )))?;
    }

    let finish_error = || UploadError::io("Failed to finish writing the archive");
    let mut gzip_encoder = tar.into_inner().await.map_err(finish_error())?;
    gzip_encoder.shutdown().await.map_err(finish_error())?;
    gzip_encoder
        .into_inner()
        .sync_all()
        .await
        .map_err(finish_error())?;

    let size = tokio::fs::metadata(&path)
        .await
        .map_err(finish_error())?
        .len();
    debug!(
        "Created archive with {} entries ({size} bytes) in {:.2?}",
        names.len(),
        time_start.elapsed()
    );

    Ok(Archive {
        path,
        size,
        entry_names: names,
    })
}
