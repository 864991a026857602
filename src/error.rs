//! Error type for a pulse sweep run.
//!
//! Failures split into two groups. Opening the bus, the device or the CSV
//! file are initialization failures: nothing has been sent to the SMU outputs
//! yet and the run stops on the spot. Everything after that is a transport or
//! storage failure raised mid-run, after which teardown still disables the
//! outputs before the error is reported.

use thiserror::Error;

/// Convenience alias for results using [`SweepError`].
pub type SweepResult<T> = std::result::Result<T, SweepError>;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Failed to open VISA resource manager: {0}")]
    BackendOpen(String),

    #[error("Failed to open instrument at {address}: {reason}")]
    DeviceOpen { address: String, reason: String },

    #[error("Failed to open CSV file {path}: {source}")]
    CsvOpen {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Instrument I/O error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid sweep parameters: {0}")]
    InvalidParams(String),

    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),
}

impl SweepError {
    /// True for failures that happen before any command reaches the instrument.
    pub fn is_init_failure(&self) -> bool {
        matches!(
            self,
            SweepError::BackendOpen(_)
                | SweepError::DeviceOpen { .. }
                | SweepError::CsvOpen { .. }
                | SweepError::InvalidParams(_)
                | SweepError::FeatureNotEnabled(_)
        )
    }

    /// Process exit status for this failure. Every failure maps to -1.
    pub fn exit_code(&self) -> i32 {
        -1
    }
}
