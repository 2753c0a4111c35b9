use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Host audio capability not available: {0}")]
    NotAvailable(String),

    #[error("Host session operation failed: {0}")]
    OperationFailed(String),

    #[error("Host session already released")]
    SessionReleased,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
