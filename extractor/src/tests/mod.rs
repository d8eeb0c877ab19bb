use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{ExtractError, Result};
use crate::fetcher::{HttpResponse, Sleeper, TickerSource, Transport};
use crate::snapshot::TickerSnapshot;

pub mod archive_tests;
pub mod fixtures;

/// Replays canned responses in order and panics if asked for more.
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<HttpResponse>>>,
    calls: Cell<usize>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, _url: &str) -> Result<HttpResponse> {
        self.calls.set(self.calls.get() + 1);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request #{}", self.calls.get()))
    }
}

pub fn response(status: u16, body: &str) -> Result<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

pub fn network_error() -> Result<HttpResponse> {
    Err(ExtractError::Transport("connection reset by peer".to_string()))
}

/// Records requested sleeps instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

/// Hands out queued results, then a fallback snapshot, counting every fetch.
pub struct CountingSource {
    queued: RefCell<VecDeque<Result<TickerSnapshot>>>,
    fallback: TickerSnapshot,
    calls: Cell<usize>,
}

impl CountingSource {
    pub fn new(fallback: TickerSnapshot) -> Self {
        Self::with_queue(fallback, Vec::new())
    }

    pub fn with_queue(fallback: TickerSnapshot, queued: Vec<Result<TickerSnapshot>>) -> Self {
        Self {
            queued: RefCell::new(queued.into()),
            fallback,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl TickerSource for CountingSource {
    fn fetch(&self) -> Result<TickerSnapshot> {
        self.calls.set(self.calls.get() + 1);
        match self.queued.borrow_mut().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }
}
