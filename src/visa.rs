//! VISA backend for GPIB/USB/Ethernet instruments, built on `visa-rs`.
//!
//! Only compiled with the `visa` feature because linking needs a VISA
//! installation (NI-VISA, Keysight IO Libraries, ...).

use std::ffi::CString;
use std::io;
use std::time::Duration;

use visa_rs::enums::attribute::{
    AttrSendEndEn, AttrTermchar, AttrTermcharEn, Attribute, HasAttribute,
};
use visa_rs::prelude::*;

use crate::error::{SweepError, SweepResult};
use crate::session::{Backend, LINE_TERMINATOR, Session, StreamSession};

const VI_TRUE: visa_rs::vs::ViBoolean = 1;

/// Opens sessions through the default VISA resource manager.
pub struct VisaBackend {
    open_timeout: Duration,
}

impl VisaBackend {
    pub fn new() -> Self {
        Self {
            open_timeout: Duration::from_secs(1),
        }
    }
}

impl Default for VisaBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A device session plus the resource manager it was opened from.
///
/// Fields drop in declaration order, so the instrument is closed before the
/// resource manager.
pub struct VisaSession {
    device: StreamSession<Instrument>,
    _rm: DefaultRM,
}

impl Session for VisaSession {
    fn write_command(&mut self, command: &str) -> io::Result<()> {
        self.device.write_command(command)
    }

    fn read_response(&mut self) -> io::Result<String> {
        self.device.read_response()
    }
}

impl Backend for VisaBackend {
    type Session = VisaSession;

    fn open(&self, address: &str) -> SweepResult<VisaSession> {
        let rm = DefaultRM::new().map_err(|e| SweepError::BackendOpen(e.to_string()))?;

        let device_err = |reason: String| SweepError::DeviceOpen {
            address: address.to_string(),
            reason,
        };

        let resource_string = CString::new(address).map_err(|e| device_err(e.to_string()))?;
        let instr = rm
            .open(&resource_string.into(), AccessMode::NO_LOCK, self.open_timeout)
            .map_err(|e| device_err(e.to_string()))?;

        let attrs = termination_attrs()
            .ok_or_else(|| device_err("termination attribute out of range".to_string()))?;
        for attr in attrs {
            instr.set_attr(attr).map_err(|e| device_err(e.to_string()))?;
        }
        log::info!("Opened VISA session at {}", address);

        Ok(VisaSession {
            device: StreamSession::new(instr),
            _rm: rm,
        })
    }
}

/// Assert END on every write and stop reads at the line terminator.
fn termination_attrs() -> Option<[Attribute; 3]> {
    Some([
        AttrSendEndEn::new_checked(VI_TRUE)?.into(),
        AttrTermchar::new_checked(LINE_TERMINATOR)?.into(),
        AttrTermcharEn::new_checked(VI_TRUE)?.into(),
    ])
}
