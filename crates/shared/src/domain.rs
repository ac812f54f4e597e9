use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AppId);

/// Image extensions the import picker accepts.
pub const SCREENSHOT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "ico", "tiff", "tif", "webp", "avif", "pnm", "dds", "tga", "exr",
];

pub fn is_supported_screenshot(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SCREENSHOT_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    #[serde(rename = "body")]
    pub release_notes: String,
}

/// Bytes received for the current download session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes_received: u64,
    pub total_bytes: u64,
}

impl DownloadProgress {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds one chunk. `content_length` is taken from every event since the
    /// collaborator repeats it on each one.
    pub fn record_chunk(&mut self, chunk_length: u64, content_length: u64) {
        self.bytes_received = self.bytes_received.saturating_add(chunk_length);
        self.total_bytes = content_length;
    }

    /// `None` until a non-zero total is known.
    pub fn percentage(&self) -> Option<u8> {
        if self.total_bytes == 0 {
            return None;
        }
        let pct = (u128::from(self.bytes_received) * 100) / u128::from(self.total_bytes);
        Some(pct.min(100) as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub file_paths: Vec<String>,
    pub app_id: AppId,
}

impl ImportRequest {
    pub fn new(file_paths: Vec<String>, app_id: AppId) -> Self {
        Self { file_paths, app_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    NoSelection,
    Succeeded { imported: usize },
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_floors_and_clamps() {
        let mut progress = DownloadProgress::default();
        assert_eq!(progress.percentage(), None);

        progress.record_chunk(1, 3);
        assert_eq!(progress.percentage(), Some(33));

        progress.record_chunk(10, 3);
        assert_eq!(progress.percentage(), Some(100));

        progress.reset();
        assert_eq!(progress.bytes_received, 0);
        assert_eq!(progress.percentage(), None);
    }

    #[test]
    fn manifest_reads_release_notes_from_body() {
        let manifest: UpdateManifest =
            serde_json::from_str(r#"{"version":"2.0","body":"fixes"}"#).expect("manifest");
        assert_eq!(manifest.release_notes, "fixes");
    }

    #[test]
    fn import_request_uses_camel_case_fields() {
        let request = ImportRequest::new(vec!["/a.png".into()], AppId(7));
        let json = serde_json::to_value(&request).expect("json");
        assert_eq!(json["filePaths"][0], "/a.png");
        assert_eq!(json["appId"], 7);
    }

    #[test]
    fn screenshot_extensions_are_case_insensitive() {
        assert!(is_supported_screenshot("/shots/a.PNG"));
        assert!(is_supported_screenshot("b.exr"));
        assert!(!is_supported_screenshot("notes.txt"));
        assert!(!is_supported_screenshot("no_extension"));
    }
}
