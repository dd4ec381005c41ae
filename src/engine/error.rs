use thiserror::Error;

/// Failure of a snapshot reload.
///
/// Cloned to every caller that awaited the same reload, so sources are kept
/// as rendered messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReloadError {
    #[error("Reload could not read the durable store: {0}")]
    Store(String),

    #[error("Reload could not replace the cache snapshot: {0}")]
    Cache(String),

    #[error("Reload task ended abnormally: {0}")]
    Aborted(String),
}
