use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Command rejected by engine: {0}")]
    Rejected(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Engine resource already released: {0}")]
    Released(String),
}

impl BridgeError {
    /// Returns `true` when the host refused the command but remains usable.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BridgeError::Rejected(_) | BridgeError::InvalidArgument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
