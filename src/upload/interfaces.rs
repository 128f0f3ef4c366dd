use std::{fmt::Display, path::PathBuf, time::Duration};

use nestify::nest;
use serde::{Deserialize, Deserializer, Serialize};

/// The kind of mapping being uploaded, which decides the backend `uploadType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadKind {
    /// ProGuard/R8 mapping for Java/Kotlin code
    #[serde(rename = "ANDROID")]
    Java,
    /// Native (NDK) symbol mapping
    #[serde(rename = "ANDROID_NATIVE")]
    Native,
}

impl UploadKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            UploadKind::Java => "ProGuard",
            UploadKind::Native => "Native",
        }
    }
}

/// Everything needed to upload one set of mapping files.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub api_key: String,
    /// Build identifier, used to name the archive entry. Required for Java mappings.
    pub build_id: Option<String>,
    pub file_paths: Vec<PathBuf>,
    pub token: String,
    pub kind: UploadKind,
    /// How long to wait for the backend to process the upload.
    /// Never less than the polling policy's minimum wait.
    pub timeout: Duration,
}

impl UploadRequest {
    /// The build id when it is present and non-empty.
    pub fn name_hint(&self) -> Option<&str> {
        self.build_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadId(pub String);

impl ProjectId {
    /// The id as the metadata service expects it in request bodies: a bare number when numeric.
    pub(crate) fn to_wire(&self) -> serde_json::Value {
        match self.0.parse::<u64>() {
            Ok(id) => serde_json::Value::from(id),
            Err(_) => serde_json::Value::from(self.0.as_str()),
        }
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing status of an upload record, as reported by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status this client does not know. Treated as still in flight.
    Other(String),
}

impl UploadStatus {
    pub fn from_wire(status: &str) -> Self {
        match status.to_uppercase().as_str() {
            "PENDING" => UploadStatus::Pending,
            "PROCESSING" => UploadStatus::Processing,
            "COMPLETED" => UploadStatus::Completed,
            "FAILED" => UploadStatus::Failed,
            other => UploadStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "PENDING"),
            UploadStatus::Processing => write!(f, "PROCESSING"),
            UploadStatus::Completed => write!(f, "COMPLETED"),
            UploadStatus::Failed => write!(f, "FAILED"),
            UploadStatus::Other(status) => write!(f, "{status}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub id: UploadId,
    pub status: UploadStatus,
    pub failure_reason: Option<String>,
}

/// Summary of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub project_id: ProjectId,
    pub upload_id: UploadId,
    /// Size in bytes of the archive that was sent.
    pub archive_size: u64,
    /// Number of status requests made before the upload completed.
    pub polls: u32,
}

/// Top level JSON:API document.
#[derive(Debug, Deserialize)]
pub(crate) struct Document<T> {
    pub data: T,
}

/// A JSON:API resource object, of which only the id is needed.
#[derive(Debug, Deserialize)]
pub(crate) struct Resource {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
}

nest! {
    #[derive(Debug, Deserialize)]*
    #[serde(rename_all = "camelCase")]*
    pub(crate) struct UploadStatusResource {
        #[serde(default, deserialize_with = "optional_id_as_string")]
        pub id: Option<String>,
        pub attributes: pub(crate) struct UploadStatusAttributes {
            pub upload_status: String,
            #[serde(default)]
            pub failure_reason: Option<String>,
        }
    }
}

nest! {
    #[derive(Debug, Serialize)]*
    #[serde(rename_all = "camelCase")]*
    /// Body of the upload registration request.
    pub(crate) struct RegisterUploadPayload {
        data: struct RegisterUploadData {
            #[serde(rename = "type")]
            resource_type: &'static str,
            attributes: struct RegisterUploadAttributes {
                upload_type: UploadKind,
                content_length: u64,
            },
            relationships: struct RegisterUploadRelationships {
                project: struct ProjectRelationship {
                    data: struct ProjectIdentifier {
                        id: serde_json::Value,
                        #[serde(rename = "type")]
                        resource_type: &'static str,
                    }
                }
            }
        }
    }
}

impl RegisterUploadPayload {
    pub(crate) fn new(project_id: &ProjectId, kind: UploadKind, content_length: u64) -> Self {
        Self {
            data: RegisterUploadData {
                resource_type: "upload",
                attributes: RegisterUploadAttributes {
                    upload_type: kind,
                    content_length,
                },
                relationships: RegisterUploadRelationships {
                    project: ProjectRelationship {
                        data: ProjectIdentifier {
                            id: project_id.to_wire(),
                            resource_type: "project",
                        },
                    },
                },
            },
        }
    }
}

/// The metadata service may send ids as JSON strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(id) => id,
            RawId::Number(id) => id.to_string(),
        }
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_as_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
