//! Event plumbing for the terminal loop.
//!
//! Keyboard and resize events come off a reader thread as [`RaceEvent`]s;
//! the runner turns receive timeouts into ticks so the loop keeps moving
//! at the tick rate even when the keyboard is idle.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::TICK_RATE_MS;

/// One unit of input for the event loop.
#[derive(Clone, Debug)]
pub enum RaceEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Anything the runner can pull events from. A plain mpsc receiver
/// qualifies, which is how headless tests drive the loop.
pub trait EventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<RaceEvent, RecvTimeoutError>;
}

impl EventSource for Receiver<RaceEvent> {
    fn recv_timeout(&self, timeout: Duration) -> Result<RaceEvent, RecvTimeoutError> {
        Receiver::recv_timeout(self, timeout)
    }
}

/// Spawns the crossterm reader thread and hands back its receiving end.
/// The thread exits when the receiver is dropped or the terminal read
/// fails.
pub fn crossterm_events() -> Receiver<RaceEvent> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => {
                if tx.send(RaceEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Resize(_, _)) => {
                if tx.send(RaceEvent::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });

    rx
}

/// Pulls one event at a time, substituting [`RaceEvent::Tick`] whenever
/// the source stays quiet for a whole tick interval.
pub struct Runner<E: EventSource> {
    events: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(events: E) -> Self {
        Self::with_tick(events, Duration::from_millis(TICK_RATE_MS))
    }

    pub fn with_tick(events: E, tick: Duration) -> Self {
        Self { events, tick }
    }

    /// Blocks up to one tick interval; on timeout (or a dead source) the
    /// result is a tick.
    pub fn step(&self) -> RaceEvent {
        match self.events.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => RaceEvent::Tick,
        }
    }
}
