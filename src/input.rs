//! The turn-input lock.
//!
//! Turns may be requested from any thread; at most one is accepted between
//! two move ticks. The whole lock lives in one atomic byte so acceptance,
//! consumption and release are each a single compare-and-swap.

use crate::snake::Turn;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const OPEN: u8 = 0;
const PENDING_LEFT: u8 = 1;
const PENDING_RIGHT: u8 = 2;
// A turn was taken by the running tick; the lock stays shut until it ends.
const CONSUMED: u8 = 3;

#[derive(Debug, Default)]
pub struct TurnGate {
    state: AtomicU8,
}

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `turn` unless another turn is already pending or in use.
    pub fn request(&self, turn: Turn) -> bool {
        let code = match turn {
            Turn::Left => PENDING_LEFT,
            Turn::Right => PENDING_RIGHT,
        };
        self.state
            .compare_exchange(OPEN, code, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Takes the pending turn for the tick that is starting. The lock stays
    /// shut until [`TurnGate::release`].
    pub fn take(&self) -> Option<Turn> {
        for (code, turn) in [(PENDING_LEFT, Turn::Left), (PENDING_RIGHT, Turn::Right)] {
            if self
                .state
                .compare_exchange(code, CONSUMED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(turn);
            }
        }
        None
    }

    /// End of a move tick. A turn that arrived while the tick ran stays
    /// queued for the next one.
    pub fn release(&self) {
        let _ = self
            .state
            .compare_exchange(CONSUMED, OPEN, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Drops any pending turn; used when a new individual takes the board.
    pub fn clear(&self) {
        self.state.store(OPEN, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::Acquire) != OPEN
    }
}

/// Cloneable handle for delivering turns from another thread.
#[derive(Clone, Debug)]
pub struct InputHandle {
    gate: Arc<TurnGate>,
}

impl InputHandle {
    pub(crate) fn new(gate: Arc<TurnGate>) -> Self {
        Self { gate }
    }

    pub fn request_turn(&self, turn: Turn) -> bool {
        self.gate.request(turn)
    }
}
