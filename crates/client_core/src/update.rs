//! Self-update life cycle: check, confirm, download with progress, install, relaunch.

use std::sync::Arc;

use host_bridge::UpdaterHost;
use shared::{
    domain::{DownloadProgress, UpdateManifest},
    protocol::{DownloadChunk, HostEvent},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    crash::{CrashReport, CrashReporter, FatalStage, TracingCrashReporter},
    error::OrchestratorError,
    notification::{NotificationPresenter, NotificationSpec, ProgressBar},
};

pub const ACCEPT_UPDATE_LABEL: &str = "Update";
pub const DECLINE_UPDATE_LABEL: &str = "Nope";
const DOWNLOAD_TITLE: &str = "Downloading update";
const RESTARTING_TEXT: &str = "Restarting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Checking,
    AwaitingConfirmation,
    Downloading,
    Installing,
    Relaunching,
    Failed,
    /// Install or relaunch failed. Terminal for this process.
    Fatal,
}

pub struct UpdateOrchestrator {
    host: Arc<dyn UpdaterHost>,
    presenter: Arc<NotificationPresenter>,
    crash_reporter: Arc<dyn CrashReporter>,
    phase: UpdatePhase,
    progress: DownloadProgress,
}

impl UpdateOrchestrator {
    pub fn new(host: Arc<dyn UpdaterHost>, presenter: Arc<NotificationPresenter>) -> Self {
        Self {
            host,
            presenter,
            crash_reporter: Arc::new(TracingCrashReporter),
            phase: UpdatePhase::Idle,
            progress: DownloadProgress::default(),
        }
    }

    pub fn with_crash_reporter(mut self, crash_reporter: Arc<dyn CrashReporter>) -> Self {
        self.crash_reporter = crash_reporter;
        self
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn progress(&self) -> DownloadProgress {
        self.progress
    }

    /// Runs one update check. Calls made while a previous run is still in
    /// progress, or after a fatal failure, are ignored.
    pub async fn run_update_check(&mut self) -> Result<UpdatePhase, OrchestratorError> {
        if !matches!(self.phase, UpdatePhase::Idle | UpdatePhase::Failed) {
            warn!(phase = ?self.phase, "update check ignored; orchestrator not idle");
            return Ok(self.phase);
        }

        self.transition(UpdatePhase::Checking);
        let check = match self.host.check_for_update().await {
            Ok(check) => check,
            Err(err) => {
                warn!(error = %err, "update check failed");
                self.transition(UpdatePhase::Failed);
                return Ok(self.phase);
            }
        };

        let manifest = match (check.should_update, check.manifest) {
            (true, Some(manifest)) => manifest,
            (true, None) => {
                warn!("host reported an update without a manifest; skipping");
                self.transition(UpdatePhase::Idle);
                return Ok(self.phase);
            }
            (false, _) => {
                debug!("no update available");
                self.transition(UpdatePhase::Idle);
                return Ok(self.phase);
            }
        };

        info!(version = %manifest.version, "update available");
        self.transition(UpdatePhase::AwaitingConfirmation);
        let choice = match self.presenter.present(update_prompt(&manifest)).await {
            Ok(choice) => choice,
            Err(err) => {
                self.transition(UpdatePhase::Failed);
                return Err(err);
            }
        };

        if choice.as_deref() != Some(ACCEPT_UPDATE_LABEL) {
            info!(version = %manifest.version, "update declined");
            self.transition(UpdatePhase::Idle);
            return Ok(self.phase);
        }
        drop(manifest);

        self.download_and_relaunch().await
    }

    /// Applies one host event. Progress outside a download is discarded.
    pub async fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::UpdateStatus(status) => {
                info!(status = ?status.status, error = ?status.error, "update status");
            }
            HostEvent::UpdateDownloadProgress(chunk) => {
                if matches!(self.phase, UpdatePhase::Downloading | UpdatePhase::Installing) {
                    self.record_chunk(chunk).await;
                } else {
                    debug!(
                        phase = ?self.phase,
                        chunk_length = chunk.chunk_length,
                        "discarding download progress outside a download"
                    );
                }
            }
            other => {
                debug!(event = other.name(), "ignoring unrelated host event");
            }
        }
    }

    async fn download_and_relaunch(&mut self) -> Result<UpdatePhase, OrchestratorError> {
        let mut events = self.host.subscribe_events();
        self.progress.reset();
        self.transition(UpdatePhase::Downloading);
        self.presenter.present(download_modal(None)).await?;

        let host = Arc::clone(&self.host);
        let install = host.install_update();
        tokio::pin!(install);
        let mut stream_open = true;
        let installed = loop {
            tokio::select! {
                biased;
                event = events.recv(), if stream_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => stream_open = false,
                },
                result = &mut install => break result,
            }
        };
        self.drain_events(&mut events).await;
        drop(events);

        if let Err(err) = installed {
            return Err(self.fail_fatally(FatalStage::Install, err).await);
        }

        if self.phase == UpdatePhase::Downloading {
            self.transition(UpdatePhase::Installing);
        }
        info!("update installed; relaunching");
        self.transition(UpdatePhase::Relaunching);
        if let Err(err) = self.host.relaunch().await {
            return Err(self.fail_fatally(FatalStage::Relaunch, err).await);
        }
        Ok(self.phase)
    }

    /// Applies events the host emitted before its install call resolved.
    async fn drain_events(&mut self, events: &mut mpsc::UnboundedReceiver<HostEvent>) {
        while let Ok(event) = events.try_recv() {
            self.handle_event(event).await;
        }
    }

    async fn record_chunk(&mut self, chunk: DownloadChunk) {
        if chunk.content_length == 0 {
            warn!(
                chunk_length = chunk.chunk_length,
                "ignoring download progress without content length"
            );
            return;
        }

        self.progress.record_chunk(chunk.chunk_length, chunk.content_length);
        let percentage = self.progress.percentage().unwrap_or(0);
        debug!(
            bytes_received = self.progress.bytes_received,
            total_bytes = self.progress.total_bytes,
            percentage,
            "download progress"
        );
        if percentage >= 100 && self.phase == UpdatePhase::Downloading {
            self.transition(UpdatePhase::Installing);
        }
        if let Err(err) = self.presenter.present(download_modal(Some(percentage))).await {
            warn!(error = %err, "failed to render download progress");
        }
    }

    async fn fail_fatally(
        &mut self,
        stage: FatalStage,
        source: anyhow::Error,
    ) -> OrchestratorError {
        self.crash_reporter.report(&CrashReport::from_error(stage, &source));
        self.transition(UpdatePhase::Fatal);
        let notice = NotificationSpec::error("Update failed", format!("{source:#}"));
        if let Err(err) = self.presenter.present(notice).await {
            warn!(error = %err, "failed to render update failure");
        }
        OrchestratorError::Fatal { stage, source }
    }

    fn transition(&mut self, next: UpdatePhase) {
        debug!(from = ?self.phase, to = ?next, "update phase transition");
        self.phase = next;
    }
}

fn update_prompt(manifest: &UpdateManifest) -> NotificationSpec {
    NotificationSpec::info(
        "Update available",
        format!(
            "Update to version {} available:\n{}",
            manifest.version, manifest.release_notes
        ),
    )
    .blocking()
    .with_choices(&[DECLINE_UPDATE_LABEL, ACCEPT_UPDATE_LABEL])
}

/// `None` renders the initial indeterminate state.
pub fn download_modal(percentage: Option<u8>) -> NotificationSpec {
    let (body, progress) = match percentage {
        None => ("0%".to_string(), ProgressBar::Indeterminate),
        Some(pct) if pct < 100 => (format!("{pct}%"), ProgressBar::Determinate(pct)),
        Some(_) => (RESTARTING_TEXT.to_string(), ProgressBar::Determinate(100)),
    };
    NotificationSpec::info(DOWNLOAD_TITLE, body)
        .blocking()
        .with_progress(progress)
}

#[cfg(test)]
#[path = "tests/update_tests.rs"]
mod tests;
