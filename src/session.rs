//! Line-oriented bus sessions.
//!
//! Every command is one line terminated by `\n` and every response is read
//! up to the next `\n`. [`StreamSession`] implements that framing over any
//! byte stream, which covers a VISA instrument as well as the in-memory
//! streams used by tests.

use std::io::{self, BufRead, BufReader, Read, Write};

use crate::error::SweepResult;

/// Terminator appended to commands and expected after responses.
pub const LINE_TERMINATOR: u8 = b'\n';

/// An open session to one instrument.
pub trait Session {
    /// Send one command. The terminator is appended here.
    fn write_command(&mut self, command: &str) -> io::Result<()>;

    /// Block until one response line arrives and return it without the terminator.
    fn read_response(&mut self) -> io::Result<String>;

    /// Send a command and read the single line it produces.
    fn query(&mut self, command: &str) -> io::Result<String> {
        self.write_command(command)?;
        self.read_response()
    }
}

/// Communication stack able to open a session at a bus address.
pub trait Backend {
    type Session: Session;

    fn open(&self, address: &str) -> SweepResult<Self::Session>;
}

/// [`Session`] over a byte stream.
pub struct StreamSession<S: Read + Write> {
    reader: BufReader<S>,
}

impl<S: Read + Write> StreamSession<S> {
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

impl<S: Read + Write> Session for StreamSession<S> {
    fn write_command(&mut self, command: &str) -> io::Result<()> {
        log::trace!("-> {}", command);
        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(LINE_TERMINATOR);

        let stream = self.reader.get_mut();
        stream.write_all(&line)?;
        stream.flush()
    }

    fn read_response(&mut self) -> io::Result<String> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(LINE_TERMINATOR, &mut buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "instrument closed the session before responding",
            ));
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        let response = String::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        log::trace!("<- {}", response);
        Ok(response)
    }
}
