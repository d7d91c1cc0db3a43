//! Move-attempt events from an outer UI layer.
//!
//! The UI raises a "move attempted" event for every cell the user picks.
//! While a turn is open the gate cancels attempts that are not legal for the
//! player to move, so listeners only ever see legal moves. A listener is a
//! single-use channel: it receives at most one event and is detached as soon
//! as that event is delivered.

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::debug;

use crate::board::Move;

/// What happened to a dispatched move attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Delivered to the waiting listener.
    Forwarded,
    /// Suppressed by the gate: not a legal move this turn.
    Cancelled,
    /// Passed the gate but nobody was listening.
    Unheard,
}

#[derive(Default)]
struct State {
    /// Legal moves of the open turn; `None` while no turn is open.
    gate: Option<Vec<Move>>,
    listener: Option<Sender<Move>>,
    closed: bool,
}

/// Shared event source. Clones refer to the same source.
#[derive(Clone, Default)]
pub struct MoveEvents {
    state: Arc<Mutex<State>>,
}

impl MoveEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a single-use listener, replacing any previous one.
    ///
    /// On a closed source the receiver is disconnected right away.
    pub fn once(&self) -> Receiver<Move> {
        let (tx, rx) = bounded(1);
        let mut state = self.lock();
        if !state.closed {
            state.listener = Some(tx);
        }
        rx
    }

    /// The UI is gone: detach the listener and refuse new ones.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.listener = None;
    }

    /// Only let `legal` moves through until [`close_turn`](Self::close_turn).
    pub fn open_turn(&self, legal: &[Move]) {
        self.lock().gate = Some(legal.to_vec());
    }

    /// Disarm the gate and detach any listener still waiting.
    pub fn close_turn(&self) {
        let mut state = self.lock();
        state.gate = None;
        state.listener = None;
    }

    /// Raise a move attempt.
    pub fn dispatch(&self, mv: Move) -> Dispatch {
        let mut state = self.lock();
        if let Some(legal) = &state.gate {
            if !legal.contains(&mv) {
                debug!("cancelled move attempt {mv}");
                return Dispatch::Cancelled;
            }
        }
        match state.listener.take() {
            Some(listener) if listener.send(mv).is_ok() => Dispatch::Forwarded,
            _ => Dispatch::Unheard,
        }
    }
}
