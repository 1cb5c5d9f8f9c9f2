//! Host lifecycle state and events.

use crate::error::ErrorKind;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::fmt;

/// CoreHost lifecycle.
///
/// `NeedCore -> NeedGame -> Ready <-> Busy`, with `Error` reachable from any
/// failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoreState {
    #[default]
    NeedCore,
    NeedGame,
    Ready,
    /// Inside a call into the core.
    Busy,
    Error,
}

impl fmt::Display for CoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoreState::NeedCore => "NeedCore",
            CoreState::NeedGame => "NeedGame",
            CoreState::Ready => "Ready",
            CoreState::Busy => "Busy",
            CoreState::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Notifications sent on the host event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    StateChanged { from: CoreState, to: CoreState },
    Error(ErrorKind),
    /// The core sent SET_MESSAGE.
    Message { text: String, frames: u32 },
    /// The core asked to shut down.
    ShutdownRequested,
}

/// Bounded event channel that never blocks the sender.
///
/// When full, the oldest event is discarded to make room, so the most recent
/// transitions and errors are always delivered.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<HostEvent>,
    rx: Receiver<HostEvent>,
}

impl EventQueue {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn push(&self, event: HostEvent) {
        let mut event = event;
        loop {
            match self.tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.rx.try_recv();
                    event = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// A receiver sharing this queue. Each event goes to one receiver.
    pub fn receiver(&self) -> Receiver<HostEvent> {
        self.rx.clone()
    }
}
