pub mod classify;
pub mod dispatch;
pub mod integration;
pub mod response;
pub mod sensor;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WetterError {
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Classification domain error: {0}")]
    ClassificationDomainError(String),

    #[error("Turn cancelled: {0}")]
    TurnCancelled(String),

    #[error("Emit error: {0}")]
    EmitError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for WetterError {
    fn from(e: std::io::Error) -> Self {
        WetterError::IOError(e.to_string())
    }
}

impl WetterError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The platform adapter sent something we don't handle; the next turn may be fine
            WetterError::UnknownIntent(_) => true,
            // Bad sensor data is usually transient
            WetterError::ClassificationDomainError(_) => true,
            WetterError::TurnCancelled(_) => true,
            // Nobody is listening for replies anymore
            WetterError::EmitError(_) => false,
            WetterError::IOError(_) => false,
            WetterError::ConfigError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            WetterError::UnknownIntent(_) => {
                "Sorry, I did not understand that request.".to_string()
            }
            WetterError::ClassificationDomainError(_) => {
                "The sensor reported a value I cannot interpret. Please try again.".to_string()
            }
            WetterError::TurnCancelled(_) => "The conversation was closed.".to_string(),
            WetterError::EmitError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            WetterError::IOError(_) => "File system error occurred.".to_string(),
            WetterError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WetterError>;
