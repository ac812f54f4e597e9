use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::UpdateManifest, error::EventDecodeError};

pub const UPDATE_DOWNLOAD_PROGRESS_EVENT: &str = "tauri://update-download-progress";
pub const UPDATE_STATUS_EVENT: &str = "tauri://update-status";
pub const SCREENSHOT_IMPORT_PROGRESS_EVENT: &str = "screenshotImportProgress";
pub const SCREENSHOT_IMPORT_ERROR_EVENT: &str = "screenshotImportError";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub should_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<UpdateManifest>,
}

impl UpdateCheck {
    pub fn up_to_date() -> Self {
        Self {
            should_update: false,
            manifest: None,
        }
    }

    pub fn available(version: impl Into<String>, release_notes: impl Into<String>) -> Self {
        Self {
            should_update: true,
            manifest: Some(UpdateManifest {
                version: version.into(),
                release_notes: release_notes.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadChunk {
    pub chunk_length: u64,
    pub content_length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateStatusKind {
    Pending,
    Done,
    Error,
    Uptodate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub status: UpdateStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    UpdateDownloadProgress(DownloadChunk),
    UpdateStatus(UpdateStatus),
    ScreenshotImportProgress(String),
    ScreenshotImportError(String),
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::UpdateDownloadProgress(_) => UPDATE_DOWNLOAD_PROGRESS_EVENT,
            HostEvent::UpdateStatus(_) => UPDATE_STATUS_EVENT,
            HostEvent::ScreenshotImportProgress(_) => SCREENSHOT_IMPORT_PROGRESS_EVENT,
            HostEvent::ScreenshotImportError(_) => SCREENSHOT_IMPORT_ERROR_EVENT,
        }
    }

    /// Decodes a named host event with its JSON payload.
    pub fn decode(name: &str, payload: Value) -> Result<Self, EventDecodeError> {
        let malformed = |source| EventDecodeError::MalformedPayload {
            name: name.to_string(),
            source,
        };
        match name {
            UPDATE_DOWNLOAD_PROGRESS_EVENT => serde_json::from_value(payload)
                .map(HostEvent::UpdateDownloadProgress)
                .map_err(malformed),
            UPDATE_STATUS_EVENT => serde_json::from_value(payload)
                .map(HostEvent::UpdateStatus)
                .map_err(malformed),
            SCREENSHOT_IMPORT_PROGRESS_EVENT => serde_json::from_value(payload)
                .map(HostEvent::ScreenshotImportProgress)
                .map_err(malformed),
            SCREENSHOT_IMPORT_ERROR_EVENT => serde_json::from_value(payload)
                .map(HostEvent::ScreenshotImportError)
                .map_err(malformed),
            other => Err(EventDecodeError::UnknownEvent {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_download_progress_payload() {
        let event = HostEvent::decode(
            UPDATE_DOWNLOAD_PROGRESS_EVENT,
            json!({"chunkLength": 50, "contentLength": 100}),
        )
        .expect("decode");
        assert_eq!(
            event,
            HostEvent::UpdateDownloadProgress(DownloadChunk {
                chunk_length: 50,
                content_length: 100,
            })
        );
        assert_eq!(event.name(), UPDATE_DOWNLOAD_PROGRESS_EVENT);
    }

    #[test]
    fn decodes_update_status_with_error() {
        let event = HostEvent::decode(
            UPDATE_STATUS_EVENT,
            json!({"status": "ERROR", "error": "signature mismatch"}),
        )
        .expect("decode");
        assert_eq!(
            event,
            HostEvent::UpdateStatus(UpdateStatus {
                status: UpdateStatusKind::Error,
                error: Some("signature mismatch".into()),
            })
        );
    }

    #[test]
    fn import_events_carry_plain_strings() {
        let event = HostEvent::decode(SCREENSHOT_IMPORT_ERROR_EVENT, json!("b.jpg: unreadable"))
            .expect("decode");
        assert_eq!(
            event,
            HostEvent::ScreenshotImportError("b.jpg: unreadable".into())
        );
    }

    #[test]
    fn rejects_unknown_names_and_bad_payloads() {
        assert!(matches!(
            HostEvent::decode("tauri://menu", json!(null)),
            Err(EventDecodeError::UnknownEvent { .. })
        ));
        assert!(matches!(
            HostEvent::decode(UPDATE_DOWNLOAD_PROGRESS_EVENT, json!({"chunkLength": "x"})),
            Err(EventDecodeError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn update_check_reads_optional_manifest() {
        let check: UpdateCheck =
            serde_json::from_value(json!({"shouldUpdate": false})).expect("check");
        assert_eq!(check, UpdateCheck::up_to_date());

        let check: UpdateCheck = serde_json::from_value(
            json!({"shouldUpdate": true, "manifest": {"version": "2.0", "body": "fixes"}}),
        )
        .expect("check");
        assert_eq!(check, UpdateCheck::available("2.0", "fixes"));
    }
}
