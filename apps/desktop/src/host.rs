//! Local stand-in for the privileged host process.
//!
//! Downloads are simulated; imports copy the selected screenshots into
//! `<data dir>/screenshots/<app id>/` under timestamped names.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use host_bridge::{EventHub, ImportHost, PickFilesOptions, UpdaterHost};
use shared::{
    domain::{is_supported_screenshot, ImportRequest},
    protocol::{DownloadChunk, HostEvent, UpdateCheck, UpdateStatus, UpdateStatusKind},
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const DOWNLOAD_CHUNK: u64 = 256 * 1024;
const DOWNLOAD_TICK: Duration = Duration::from_millis(40);

#[derive(Debug, Clone)]
pub struct SimulatedRelease {
    pub version: String,
    pub notes: String,
    pub download_size: u64,
}

pub struct LocalHost {
    release: Option<SimulatedRelease>,
    preselected: Vec<String>,
    screenshots_root: PathBuf,
    events: EventHub,
}

impl LocalHost {
    pub fn new(release: Option<SimulatedRelease>, preselected: Vec<String>) -> Self {
        let screenshots_root = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("host-ops")
            .join("screenshots");
        Self {
            release,
            preselected,
            screenshots_root,
            events: EventHub::new(),
        }
    }

    fn emit(&self, event: HostEvent) {
        self.events.emit(event);
    }

    fn emit_status(&self, status: UpdateStatusKind, error: Option<String>) {
        self.emit(HostEvent::UpdateStatus(UpdateStatus { status, error }));
    }

    async fn import_one(
        &self,
        target_dir: &Path,
        stamp: &str,
        index: usize,
        path: &str,
    ) -> Result<PathBuf> {
        if !is_supported_screenshot(path) {
            return Err(anyhow!("unsupported image format"));
        }
        let source = Path::new(path);
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let target = target_dir.join(format!("{stamp}{index}.{extension}"));
        tokio::fs::copy(source, &target)
            .await
            .with_context(|| format!("copy to {}", target.display()))?;
        Ok(target)
    }
}

#[async_trait]
impl UpdaterHost for LocalHost {
    async fn check_for_update(&self) -> Result<UpdateCheck> {
        Ok(match &self.release {
            Some(release) => UpdateCheck::available(&release.version, &release.notes),
            None => {
                self.emit_status(UpdateStatusKind::Uptodate, None);
                UpdateCheck::up_to_date()
            }
        })
    }

    async fn install_update(&self) -> Result<()> {
        let release = self
            .release
            .as_ref()
            .ok_or_else(|| anyhow!("no pending update to install"))?;
        self.emit_status(UpdateStatusKind::Pending, None);

        let mut sent = 0;
        while sent < release.download_size {
            let chunk_length = DOWNLOAD_CHUNK.min(release.download_size - sent);
            sent += chunk_length;
            self.emit(HostEvent::UpdateDownloadProgress(DownloadChunk {
                chunk_length,
                content_length: release.download_size,
            }));
            tokio::time::sleep(DOWNLOAD_TICK).await;
        }

        info!(version = %release.version, bytes = sent, "simulated update installed");
        self.emit_status(UpdateStatusKind::Done, None);
        Ok(())
    }

    async fn relaunch(&self) -> Result<()> {
        let exe = std::env::current_exe().context("locate current executable")?;
        std::process::Command::new(&exe)
            .arg("relaunched")
            .spawn()
            .with_context(|| format!("spawn {}", exe.display()))?;
        std::process::exit(0);
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ImportHost for LocalHost {
    async fn picture_dir(&self) -> Result<PathBuf> {
        dirs::picture_dir().ok_or_else(|| anyhow!("no picture directory for this user"))
    }

    async fn pick_files(&self, options: PickFilesOptions) -> Result<Option<Vec<String>>> {
        if !self.preselected.is_empty() {
            return Ok(Some(self.preselected.clone()));
        }

        let mut dialog = rfd::AsyncFileDialog::new()
            .set_title(options.title.as_str())
            .add_filter(options.filter.name.as_str(), options.filter.extensions.as_slice());
        if let Some(dir) = &options.default_dir {
            dialog = dialog.set_directory(dir);
        }

        let picked = if options.multiple {
            dialog.pick_files().await
        } else {
            dialog.pick_file().await.map(|file| vec![file])
        };
        Ok(picked.map(|files| {
            files
                .iter()
                .map(|file| file.path().to_string_lossy().into_owned())
                .collect()
        }))
    }

    async fn send_files(&self, request: ImportRequest) -> Result<String> {
        let total = request.file_paths.len();
        info!(app_id = %request.app_id, files = total, "importing screenshots");

        let target_dir = self.screenshots_root.join(request.app_id.to_string());
        if let Err(err) = tokio::fs::create_dir_all(&target_dir).await {
            return Ok(format!("Could not create {}: {err}", target_dir.display()));
        }

        let stamp = Local::now().format("%Y%m%d%H%M%S_").to_string();
        let mut failed = 0;
        for (idx, path) in request.file_paths.iter().enumerate() {
            let name = Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            self.emit(HostEvent::ScreenshotImportProgress(format!(
                "Importing {name} ({}/{total})",
                idx + 1
            )));
            match self.import_one(&target_dir, &stamp, idx + 1, path).await {
                Ok(target) => {
                    info!(source = %path, target = %target.display(), "screenshot imported")
                }
                Err(err) => {
                    failed += 1;
                    warn!(source = %path, error = %err, "screenshot rejected");
                    self.emit(HostEvent::ScreenshotImportError(format!("{name}: {err:#}")));
                }
            }
        }

        if failed == 0 {
            Ok(String::new())
        } else {
            Ok(format!("{failed} of {total} screenshots failed to import"))
        }
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.events.subscribe()
    }
}
