use instant::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Armed,
    Cancelled,
    Fired,
}

/// One-shot deadline bounding how long a client waits for its connection
/// to the host to open.
///
/// Armed when a join starts, cancelled on open or on a connection error,
/// checked on poll. Firing and cancellation are both final; re-arming is
/// not supported, a new join creates a fresh guard.
#[derive(Debug)]
pub struct JoinTimeoutGuard {
    deadline: Instant,
    state: GuardState,
}

impl JoinTimeoutGuard {
    pub fn arm(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            state: GuardState::Armed,
        }
    }

    /// Cancel the guard. Idempotent; cancelling an already-fired or
    /// already-cancelled guard is a no-op.
    pub fn cancel(&mut self) {
        if self.state == GuardState::Armed {
            self.state = GuardState::Cancelled;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state == GuardState::Armed
    }

    /// Check the deadline. Returns true exactly once, on the poll that
    /// observes expiry.
    pub fn poll_expired(&mut self) -> bool {
        if self.state == GuardState::Armed && Instant::now() >= self.deadline {
            self.state = GuardState::Fired;
            true
        } else {
            false
        }
    }
}
