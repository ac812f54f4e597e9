use thiserror::Error;

use crate::crash::FatalStage;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("self-update failed during {stage}: {source}")]
    Fatal {
        stage: FatalStage,
        source: anyhow::Error,
    },
    #[error("prompt resolved to unknown choice `{label}`")]
    InvalidChoice { label: String },
    #[error("notification surface failed: {0}")]
    Presentation(#[source] anyhow::Error),
}

impl OrchestratorError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrchestratorError::Fatal { .. })
    }
}
