//! Keithley 2600-series dual-channel SMU driven with TSP commands.
//!
//! Channel A (`smua`) biases the drain, channel B (`smub`) the gate.

use std::fmt;
use std::io;

use crate::config::SweepParams;
use crate::session::Session;

/// Measurement query; the instrument answers with both currents, drain first.
pub const MEASURE_CURRENTS: &str = "print(smua.measure.i(), smub.measure.i())";

pub const ERROR_COUNT_QUERY: &str = "print(errorqueue.count)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Drain channel, `smua`.
    A,
    /// Gate channel, `smub`.
    B,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::A => "smua",
            Channel::B => "smub",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    On,
    Off,
}

impl OutputState {
    pub fn to_command_value(&self) -> &'static str {
        match self {
            OutputState::On => "OUTPUT_ON",
            OutputState::Off => "OUTPUT_OFF",
        }
    }
}

pub fn reset_command(ch: Channel) -> String {
    format!("{ch}.reset()")
}

pub fn dc_volts_command(ch: Channel) -> String {
    format!("{ch}.source.func = {ch}.OUTPUT_DCVOLTS")
}

/// Source level, always six decimals (`1.000000`, `-1.000000`).
pub fn level_command(ch: Channel, volts: f64) -> String {
    format!("{ch}.source.levelv = {volts:.6}")
}

pub fn output_command(ch: Channel, state: OutputState) -> String {
    format!("{ch}.source.output = {ch}.{}", state.to_command_value())
}

/// SMU on an open session.
pub struct Keithley2600<S: Session> {
    session: S,
}

impl<S: Session> Keithley2600<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    fn send(&mut self, command: &str) -> io::Result<()> {
        log::debug!("Sending: {}", command);
        self.session.write_command(command)
    }

    pub fn reset(&mut self, ch: Channel) -> io::Result<()> {
        self.send(&reset_command(ch))
    }

    pub fn set_dc_volts_mode(&mut self, ch: Channel) -> io::Result<()> {
        self.send(&dc_volts_command(ch))
    }

    pub fn set_level(&mut self, ch: Channel, volts: f64) -> io::Result<()> {
        self.send(&level_command(ch, volts))
    }

    pub fn set_output(&mut self, ch: Channel, state: OutputState) -> io::Result<()> {
        self.send(&output_command(ch, state))
    }

    /// Reset both channels, then bring up drain and gate as DC voltage
    /// sources with outputs enabled. The gate starts at its low level.
    pub fn configure(&mut self, params: &SweepParams) -> io::Result<()> {
        self.reset(Channel::A)?;
        self.reset(Channel::B)?;

        self.set_dc_volts_mode(Channel::A)?;
        self.set_level(Channel::A, params.drain_v)?;
        self.set_output(Channel::A, OutputState::On)?;

        self.set_dc_volts_mode(Channel::B)?;
        self.set_level(Channel::B, params.gate_low)?;
        self.set_output(Channel::B, OutputState::On)?;

        log::info!(
            "SMU configured: drain {:.3} V, gate {:.3} V, outputs on",
            params.drain_v,
            params.gate_low
        );
        Ok(())
    }

    /// Request both currents and return the raw response line.
    pub fn measure_currents(&mut self) -> io::Result<String> {
        self.session.write_command(MEASURE_CURRENTS)?;
        self.session.read_response()
    }

    /// Switch both outputs off. Nothing is read back.
    pub fn outputs_off(&mut self) -> io::Result<()> {
        self.set_output(Channel::A, OutputState::Off)?;
        self.set_output(Channel::B, OutputState::Off)
    }

    /// Number of entries in the instrument error queue.
    pub fn error_count(&mut self) -> io::Result<u32> {
        let response = self.session.query(ERROR_COUNT_QUERY)?;
        let trimmed = response.trim();
        // TSP prints numbers as floats, e.g. "0.00000e+00"
        trimmed
            .parse::<f64>()
            .map(|n| n as u32)
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid error count {:?}: {}", trimmed, e),
                )
            })
    }

    /// Abort any running script, clear the error queue, reset both channels
    /// and leave both outputs off.
    pub fn recover(&mut self) -> io::Result<()> {
        self.send("abort")?;
        self.send("errorqueue.clear()")?;
        self.reset(Channel::A)?;
        self.reset(Channel::B)?;
        self.outputs_off()
    }
}
