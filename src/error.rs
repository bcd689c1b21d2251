use thiserror::Error;

use crate::persist::PersistError;

/// Unified error type covering persistence and I/O.
///
/// Returned by convenience methods like
/// [`WorkflowGraph::from_json_file()`](crate::WorkflowGraph::from_json_file).
#[derive(Debug, Error)]
pub enum FlowgateError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
