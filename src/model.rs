//! Wire types for the provider's jobs API, plus the task-graph encoder.
//!
//! A conversion job is a chain of three named tasks: an `import/base64`
//! task carrying the file inline, a `convert` task referencing the import
//! by name, and an `export/url` task referencing the convert. The task
//! names are fixed well-known strings so the poller can locate the export
//! task without guessing.
//!
//! Request body shape: `{"tasks": {<name>: {"operation": ..., ...}}}`.
//! Response body shape:
//! `{"data": {"id": ..., "tasks": [{"operation", "status", "result"}]}}`.

use crate::error::RelayError;
use crate::format::DocumentFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the import stage task.
pub const IMPORT_TASK: &str = "import-my-file";
/// Name of the convert stage task.
pub const CONVERT_TASK: &str = "convert-my-file";
/// Name of the export stage task.
pub const EXPORT_TASK: &str = "export-my-file";

/// Operation string identifying the export stage in status responses.
pub const EXPORT_OPERATION: &str = "export/url";

// ── Request ──────────────────────────────────────────────────────────────

/// One task in the submission graph, tagged by its `operation` field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "operation")]
pub enum TaskSpec {
    /// Inline file upload.
    #[serde(rename = "import/base64")]
    ImportBase64 { file: String, filename: String },

    /// Format conversion, referencing the input task by name.
    #[serde(rename = "convert")]
    Convert {
        input: String,
        input_format: String,
        output_format: String,
    },

    /// Publish the converted file behind a signed URL.
    #[serde(rename = "export/url")]
    ExportUrl { input: String },
}

/// The JSON body POSTed to the jobs endpoint.
///
/// A `BTreeMap` keeps task-name order deterministic, which keeps request
/// bodies stable across runs and trivially assertable in tests.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobRequest {
    pub tasks: BTreeMap<String, TaskSpec>,
}

/// Build the three-stage task graph for one conversion.
///
/// No inspection of `bytes` happens here: whether the payload really is a
/// valid document of `source` format is the provider's call. This layer
/// only rejects inputs that can never form a valid request (empty file
/// name, empty payload, identical source and target).
pub fn build_job_request(
    file_name: &str,
    bytes: &[u8],
    source: DocumentFormat,
    target: DocumentFormat,
) -> Result<JobRequest, RelayError> {
    if file_name.trim().is_empty() {
        return Err(RelayError::InvalidInput {
            reason: "file name must not be empty".into(),
        });
    }
    if bytes.is_empty() {
        return Err(RelayError::InvalidInput {
            reason: format!("'{file_name}' is empty"),
        });
    }
    if source == target {
        return Err(RelayError::InvalidInput {
            reason: format!("source and target format are both '{source}'"),
        });
    }

    let mut tasks = BTreeMap::new();
    tasks.insert(
        IMPORT_TASK.to_string(),
        TaskSpec::ImportBase64 {
            file: STANDARD.encode(bytes),
            filename: file_name.to_string(),
        },
    );
    tasks.insert(
        CONVERT_TASK.to_string(),
        TaskSpec::Convert {
            input: IMPORT_TASK.to_string(),
            input_format: source.as_str().to_string(),
            output_format: target.as_str().to_string(),
        },
    );
    tasks.insert(
        EXPORT_TASK.to_string(),
        TaskSpec::ExportUrl {
            input: CONVERT_TASK.to_string(),
        },
    );

    Ok(JobRequest { tasks })
}

// ── Response ─────────────────────────────────────────────────────────────

/// Top-level envelope the provider wraps every job resource in.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEnvelope {
    pub data: JobSnapshot,
}

/// The state of a job as reported by one status (or submit) response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSnapshot {
    /// Opaque identifier assigned by the provider at submission.
    pub id: String,
    #[serde(default)]
    pub tasks: Vec<TaskStatus>,
}

impl JobSnapshot {
    /// The export-stage task entry, if the provider reported one.
    pub fn export_task(&self) -> Option<&TaskStatus> {
        self.tasks.iter().find(|t| t.operation == EXPORT_OPERATION)
    }
}

/// One task entry inside a job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    pub operation: String,
    pub status: TaskState,
    #[serde(default)]
    pub result: Option<TaskResult>,
    /// Optional human-readable failure detail some providers attach.
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskStatus {
    /// First downloadable result URL, when present.
    pub fn first_url(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.files.first())
            .map(|f| f.url.as_str())
    }
}

/// Provider-reported task lifecycle state.
///
/// The set is open-ended on the provider side; only `finished` and `error`
/// carry meaning for the poller, so anything unrecognised maps to
/// [`TaskState::Unknown`] and is treated as still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Waiting,
    Processing,
    Finished,
    Error,
    #[serde(other)]
    Unknown,
}

/// Result payload of a finished export task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// One downloadable file reference.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_request_serialises_to_provider_shape() {
        let req = build_job_request(
            "report.pdf",
            b"%PDF-1.7 fake",
            DocumentFormat::Pdf,
            DocumentFormat::Docx,
        )
        .unwrap();

        let json = serde_json::to_value(&req).unwrap();
        let tasks = &json["tasks"];

        assert_eq!(tasks[IMPORT_TASK]["operation"], "import/base64");
        assert_eq!(tasks[IMPORT_TASK]["filename"], "report.pdf");
        assert_eq!(
            tasks[IMPORT_TASK]["file"],
            STANDARD.encode(b"%PDF-1.7 fake")
        );

        assert_eq!(tasks[CONVERT_TASK]["operation"], "convert");
        assert_eq!(tasks[CONVERT_TASK]["input"], IMPORT_TASK);
        assert_eq!(tasks[CONVERT_TASK]["input_format"], "pdf");
        assert_eq!(tasks[CONVERT_TASK]["output_format"], "docx");

        assert_eq!(tasks[EXPORT_TASK]["operation"], "export/url");
        assert_eq!(tasks[EXPORT_TASK]["input"], CONVERT_TASK);
    }

    #[test]
    fn empty_file_name_is_rejected() {
        let err = build_job_request("  ", b"x", DocumentFormat::Pdf, DocumentFormat::Docx)
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput { .. }));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = build_job_request("a.pdf", b"", DocumentFormat::Pdf, DocumentFormat::Docx)
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput { .. }));
    }

    #[test]
    fn identity_conversion_is_rejected() {
        let err = build_job_request("a.pdf", b"x", DocumentFormat::Pdf, DocumentFormat::Pdf)
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput { .. }));
    }

    #[test]
    fn snapshot_deserialises_provider_response() {
        let body = r#"{
            "data": {
                "id": "job123",
                "tasks": [
                    {"operation": "import/base64", "status": "finished"},
                    {"operation": "convert", "status": "finished"},
                    {"operation": "export/url", "status": "finished",
                     "result": {"files": [{"url": "https://x/out.docx", "filename": "out.docx"}]}}
                ]
            }
        }"#;
        let envelope: JobEnvelope = serde_json::from_str(body).unwrap();
        let snap = envelope.data;
        assert_eq!(snap.id, "job123");
        let export = snap.export_task().expect("export task present");
        assert_eq!(export.status, TaskState::Finished);
        assert_eq!(export.first_url(), Some("https://x/out.docx"));
    }

    #[test]
    fn unknown_status_maps_to_unknown() {
        let body = r#"{"operation": "convert", "status": "queued"}"#;
        let task: TaskStatus = serde_json::from_str(body).unwrap();
        assert_eq!(task.status, TaskState::Unknown);
        assert_eq!(task.first_url(), None);
    }
}
