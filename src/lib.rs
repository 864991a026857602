//! Pulsed gate sweep on a Keithley 2600-series SMU over GPIB.
//!
//! Channel A holds the drain at a fixed voltage while channel B toggles the
//! gate between two levels. Both currents are polled at a fixed interval and
//! every response is appended to a CSV file.

pub mod config;
pub mod error;
pub mod keithley;
pub mod logger;
pub mod mock;
pub mod session;
pub mod sweep;
#[cfg(feature = "visa")]
pub mod visa;

pub use config::SweepParams;
pub use error::{SweepError, SweepResult};
pub use sweep::{RunSummary, run};
