//! Wall-clock deadlines threaded through the message pump.

use std::time::{Duration, Instant};

/// A point in time after which an operation should stop blocking.
///
/// A `Deadline` built from `Duration::ZERO` is already expired and can be
/// used to poll without blocking. An unbounded deadline never expires and
/// is used by drain-only operations that must not block on the socket.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + timeout),
        }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Self { expires_at: None }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    /// Time left before expiry, or `None` for an unbounded deadline.
    /// Saturates at zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_deadline_is_expired() {
        let deadline = Deadline::new(Duration::ZERO);
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_future_deadline_is_not_expired() {
        let deadline = Deadline::new(Duration::from_secs(300));
        assert!(!deadline.is_expired());
        let remaining = deadline.remaining().expect("bounded deadline");
        assert!(remaining > Duration::from_secs(299));
        assert!(remaining <= Duration::from_secs(300));
    }

    #[test]
    fn test_unbounded_deadline_never_expires() {
        let deadline = Deadline::unbounded();
        assert!(!deadline.is_expired());
        assert!(deadline.remaining().is_none());
    }
}
