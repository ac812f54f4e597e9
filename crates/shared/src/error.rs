use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("unknown host event `{name}`")]
    UnknownEvent { name: String },
    #[error("malformed payload for `{name}`: {source}")]
    MalformedPayload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
