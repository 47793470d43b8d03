//! Error taxonomy for the quoting/risk core.
//!
//! Recoverable variants (`CalibrationError`, `StaleTick`, `AdapterTimeout`,
//! `AdapterReject`) are matched and handled inline by the epoch driver.
//! `InvalidParameters` and `FatalAdapter` propagate to `main` via `?` and are
//! fatal; `GateHalt` stops new quoting but keeps draining fills.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected at startup; never recovered from.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The kappa provider could not fit a usable curve this round. Caller
    /// keeps the last-good (kappa, A) and increments a stale counter.
    #[error("calibration error: {0}")]
    CalibrationError(String),

    /// Tick rejected by the gate's outlier filter; volatility is not updated.
    #[error("stale/outlier tick ignored: {0}")]
    StaleTick(String),

    /// A single adapter round-trip (ack, depth fetch, ...) timed out.
    #[error("adapter timeout: {0}")]
    AdapterTimeout(String),

    /// The venue rejected an order or cancel.
    #[error("adapter rejected request: {0}")]
    AdapterReject(String),

    /// The risk/safety gate has halted new quoting; fills continue draining.
    #[error("risk gate halt: {0}")]
    GateHalt(String),

    /// The adapter is unrecoverably broken; process must exit.
    #[error("fatal adapter error: {0}")]
    FatalAdapter(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("other error: {0}")]
    Other(String),
}

impl CoreError {
    /// Process exit code per the configuration surface's documented contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::InvalidParameters(_) => 2,
            CoreError::FatalAdapter(_) => 3,
            CoreError::GateHalt(_) => 4,
            _ => 1,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::CalibrationError(_)
                | CoreError::StaleTick(_)
                | CoreError::AdapterTimeout(_)
                | CoreError::AdapterReject(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
