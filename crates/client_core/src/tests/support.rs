//! Fakes shared by the orchestrator tests.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use host_bridge::{EventHub, ImportHost, PickFilesOptions, UpdaterHost};
use shared::{
    domain::ImportRequest,
    protocol::{DownloadChunk, HostEvent, UpdateCheck},
};
use tokio::sync::mpsc;

use crate::notification::{NotificationIcon, NotificationSpec, NotificationSurface};

#[derive(Default)]
pub struct RecordingSurface {
    shown: Mutex<Vec<NotificationSpec>>,
    answers: Mutex<VecDeque<String>>,
    hidden: AtomicUsize,
}

impl RecordingSurface {
    pub fn answering(answers: &[&str]) -> Arc<Self> {
        let surface = Self::default();
        surface
            .answers
            .lock()
            .expect("answers")
            .extend(answers.iter().map(|a| a.to_string()));
        Arc::new(surface)
    }

    pub fn shown(&self) -> Vec<NotificationSpec> {
        self.shown.lock().expect("shown").clone()
    }

    pub fn with_icon(&self, icon: NotificationIcon) -> Vec<NotificationSpec> {
        self.shown()
            .into_iter()
            .filter(|spec| spec.icon == icon)
            .collect()
    }

    pub fn last(&self) -> Option<NotificationSpec> {
        self.shown().last().cloned()
    }

    pub fn hidden(&self) -> usize {
        self.hidden.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSurface for RecordingSurface {
    fn show(&self, spec: &NotificationSpec) {
        self.shown.lock().expect("shown").push(spec.clone());
    }

    async fn choose(&self, spec: &NotificationSpec) -> Result<String> {
        self.shown.lock().expect("shown").push(spec.clone());
        self.answers
            .lock()
            .expect("answers")
            .pop_front()
            .ok_or_else(|| anyhow!("prompt closed without a choice"))
    }

    fn hide(&self) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeUpdater {
    check: UpdateCheck,
    chunks: Vec<DownloadChunk>,
    install_error: Option<String>,
    relaunch_error: Option<String>,
    yield_between_chunks: bool,
    events: EventHub,
    install_calls: AtomicUsize,
    relaunch_calls: AtomicUsize,
}

impl FakeUpdater {
    pub fn new(check: UpdateCheck) -> Self {
        Self {
            check,
            chunks: Vec::new(),
            install_error: None,
            relaunch_error: None,
            yield_between_chunks: true,
            events: EventHub::new(),
            install_calls: AtomicUsize::new(0),
            relaunch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_chunks(mut self, chunks: &[(u64, u64)]) -> Self {
        self.chunks = chunks
            .iter()
            .map(|&(chunk_length, content_length)| DownloadChunk {
                chunk_length,
                content_length,
            })
            .collect();
        self
    }

    /// Emits every chunk before the orchestrator gets a chance to poll.
    pub fn in_one_burst(mut self) -> Self {
        self.yield_between_chunks = false;
        self
    }

    pub fn failing_install(mut self, err: &str) -> Self {
        self.install_error = Some(err.to_string());
        self
    }

    pub fn failing_relaunch(mut self, err: &str) -> Self {
        self.relaunch_error = Some(err.to_string());
        self
    }

    pub fn emit(&self, event: HostEvent) {
        self.events.emit(event);
    }

    pub fn install_calls(&self) -> usize {
        self.install_calls.load(Ordering::SeqCst)
    }

    pub fn relaunch_calls(&self) -> usize {
        self.relaunch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdaterHost for FakeUpdater {
    async fn check_for_update(&self) -> Result<UpdateCheck> {
        Ok(self.check.clone())
    }

    async fn install_update(&self) -> Result<()> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        for chunk in &self.chunks {
            self.events.emit(HostEvent::UpdateDownloadProgress(*chunk));
            if self.yield_between_chunks {
                tokio::task::yield_now().await;
            }
        }
        match &self.install_error {
            Some(err) => Err(anyhow!(err.clone())),
            None => Ok(()),
        }
    }

    async fn relaunch(&self) -> Result<()> {
        self.relaunch_calls.fetch_add(1, Ordering::SeqCst);
        match &self.relaunch_error {
            Some(err) => Err(anyhow!(err.clone())),
            None => Ok(()),
        }
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.events.subscribe()
    }
}

pub struct FakeImporter {
    picture_dir: Option<PathBuf>,
    selection: Option<Vec<String>>,
    script: Vec<HostEvent>,
    resolution: std::result::Result<String, String>,
    events: EventHub,
    pick_requests: Mutex<Vec<PickFilesOptions>>,
    sent: Mutex<Vec<ImportRequest>>,
}

impl FakeImporter {
    pub fn selecting(selection: Option<&[&str]>) -> Self {
        Self {
            picture_dir: Some(PathBuf::from("/home/user/Pictures")),
            selection: selection.map(|paths| paths.iter().map(|p| p.to_string()).collect()),
            script: Vec::new(),
            resolution: Ok(String::new()),
            events: EventHub::new(),
            pick_requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn without_picture_dir(mut self) -> Self {
        self.picture_dir = None;
        self
    }

    /// Events emitted while `send_files` runs, before it resolves.
    pub fn emitting(mut self, script: Vec<HostEvent>) -> Self {
        self.script = script;
        self
    }

    pub fn resolving(mut self, message: &str) -> Self {
        self.resolution = Ok(message.to_string());
        self
    }

    pub fn failing_transport(mut self, err: &str) -> Self {
        self.resolution = Err(err.to_string());
        self
    }

    pub fn emit(&self, event: HostEvent) {
        self.events.emit(event);
    }

    pub fn pick_requests(&self) -> Vec<PickFilesOptions> {
        self.pick_requests.lock().expect("picks").clone()
    }

    pub fn sent(&self) -> Vec<ImportRequest> {
        self.sent.lock().expect("sent").clone()
    }
}

#[async_trait]
impl ImportHost for FakeImporter {
    async fn picture_dir(&self) -> Result<PathBuf> {
        self.picture_dir
            .clone()
            .ok_or_else(|| anyhow!("no picture directory"))
    }

    async fn pick_files(&self, options: PickFilesOptions) -> Result<Option<Vec<String>>> {
        self.pick_requests.lock().expect("picks").push(options);
        Ok(self.selection.clone())
    }

    async fn send_files(&self, request: ImportRequest) -> Result<String> {
        self.sent.lock().expect("sent").push(request);
        for event in &self.script {
            self.events.emit(event.clone());
            tokio::task::yield_now().await;
        }
        self.resolution.clone().map_err(|err| anyhow!(err))
    }

    fn subscribe_events(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.events.subscribe()
    }
}
