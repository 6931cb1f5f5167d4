//! Error types shared across the flight stack

use thiserror::Error;

/// Core error type for drone control operations
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("drone is not connected")]
    NotConnected,

    #[error("drone is already flying")]
    AlreadyFlying,

    #[error("drone is not flying")]
    NotFlying,

    #[error("no flight plan loaded")]
    NoPlanLoaded,

    #[error("a flight plan is already running; abort it first")]
    PlanAlreadyRunning,

    #[error("no destination set")]
    NoDestination,

    #[error("command not acknowledged: {0}")]
    NoAck(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlightError {
    pub fn no_ack(cmd: impl Into<String>) -> Self {
        Self::NoAck(cmd.into())
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    /// True for failures the caller provoked rather than the backend
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::AlreadyFlying
                | Self::NotFlying
                | Self::NoPlanLoaded
                | Self::PlanAlreadyRunning
                | Self::NoDestination
                | Self::InvalidCommand(_)
        )
    }
}

pub type FlightResult<T> = Result<T, FlightError>;
