use domain::{RegistryError, SubmitError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("submit error: {0}")]
    Submit(#[from] SubmitError),
}

impl ApplicationError {
    /// 返回给客户端的错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationError::Registry(RegistryError::DuplicateConnection(_)) => {
                "DUPLICATE_CONNECTION"
            }
            ApplicationError::Registry(RegistryError::NotFound(_)) => "NOT_FOUND",
            ApplicationError::Submit(SubmitError::UnknownSender(_)) => "UNKNOWN_SENDER",
            ApplicationError::Submit(SubmitError::MessageTooLong { .. }) => "MESSAGE_TOO_LONG",
        }
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
