//! In-memory SMU for tests and dry runs.
//!
//! `MockSession` records every command it receives and answers each pending
//! query with a canned line. Clones share state, so a test can keep one
//! handle while the sweep owns another.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;

use crate::error::{SweepError, SweepResult};
use crate::keithley::ERROR_COUNT_QUERY;
use crate::session::{Backend, Session};

/// Default measurement answer: drain and gate current, tab-separated.
pub const DEFAULT_RESPONSE: &str = "1.00000e-06\t2.00000e-12";

#[derive(Default)]
struct MockState {
    commands: Vec<String>,
    pending: VecDeque<String>,
    replies: HashMap<String, String>,
    default_reply: String,
    reads: usize,
    fail_after_reads: Option<usize>,
}

#[derive(Clone)]
pub struct MockSession {
    state: Rc<RefCell<MockState>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::with_response(DEFAULT_RESPONSE)
    }

    /// Answer every query not registered with [`MockSession::reply_to`] with `response`.
    pub fn with_response(response: &str) -> Self {
        let mut replies = HashMap::new();
        replies.insert(ERROR_COUNT_QUERY.to_string(), "0.00000e+00".to_string());
        Self {
            state: Rc::new(RefCell::new(MockState {
                replies,
                default_reply: response.to_string(),
                ..MockState::default()
            })),
        }
    }

    pub fn reply_to(self, command: &str, response: &str) -> Self {
        self.state
            .borrow_mut()
            .replies
            .insert(command.to_string(), response.to_string());
        self
    }

    /// Time out every read once `n` responses have been delivered.
    pub fn fail_after_reads(self, n: usize) -> Self {
        self.state.borrow_mut().fail_after_reads = Some(n);
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MockSession {
    fn write_command(&mut self, command: &str) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.commands.push(command.to_string());
        if command.starts_with("print(") {
            let reply = state
                .replies
                .get(command)
                .cloned()
                .unwrap_or_else(|| state.default_reply.clone());
            state.pending.push_back(reply);
        }
        Ok(())
    }

    fn read_response(&mut self) -> io::Result<String> {
        let mut state = self.state.borrow_mut();
        let reply = state.pending.pop_front();
        if state.fail_after_reads.is_some_and(|limit| state.reads >= limit) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock bus timeout"));
        }
        state.reads += 1;
        reply.ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no response pending"))
    }
}

/// Which stage of opening a mock session should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    Backend,
    Device,
}

pub struct MockBackend {
    session: MockSession,
    failure: Option<OpenFailure>,
}

impl MockBackend {
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            failure: None,
        }
    }

    pub fn failing(failure: OpenFailure) -> Self {
        Self {
            session: MockSession::new(),
            failure: Some(failure),
        }
    }
}

impl Backend for MockBackend {
    type Session = MockSession;

    fn open(&self, address: &str) -> SweepResult<MockSession> {
        match self.failure {
            Some(OpenFailure::Backend) => Err(SweepError::BackendOpen(
                "mock resource manager unavailable".to_string(),
            )),
            Some(OpenFailure::Device) => Err(SweepError::DeviceOpen {
                address: address.to_string(),
                reason: "mock device not found".to_string(),
            }),
            None => Ok(self.session.clone()),
        }
    }
}
