use crate::config::Property;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpinnerError {
    #[error("cannot change {property} while a spin is in progress")]
    InvalidState { property: Property },

    #[error("invalid {property}: {reason}")]
    InvalidArgument { property: Property, reason: String },
}

pub type Result<T> = std::result::Result<T, SpinnerError>;
