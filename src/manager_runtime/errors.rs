use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("RuntimeError::Environment: {0}")]
    Environment(String),
    #[error("RuntimeError::Transport: {0}")]
    Transport(String),
    #[error("RuntimeError::Protocol: {0}")]
    Protocol(String),
    #[error("RuntimeError::Document: {0}")]
    Document(String),
}
impl From<ureq::Error> for RuntimeError {
    fn from(e: ureq::Error) -> Self { RuntimeError::Transport(e.to_string()) }
}
impl From<serde_json::Error> for RuntimeError {
    fn from(e: serde_json::Error) -> Self { RuntimeError::Document(e.to_string()) }
}
