use crate::{Error, Result};
use std::time::{Duration, Instant};

/// Caller-supplied time budget, threaded through embedding and retrieval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No time limit
    pub const fn none() -> Self {
        Self { at: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
        }
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::after)
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            Err(Error::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_expires() {
        let d = Deadline::none();
        assert!(!d.is_expired());
        assert!(d.remaining().is_none());
        assert!(d.check().is_ok());
    }

    #[test]
    fn test_zero_timeout_is_expired() {
        let d = Deadline::after(Duration::ZERO);
        assert!(d.is_expired());
        assert!(matches!(d.check(), Err(Error::DeadlineExceeded)));
    }

    #[test]
    fn test_generous_timeout_not_expired() {
        let d = Deadline::from_timeout(Some(Duration::from_secs(60)));
        assert!(!d.is_expired());
        assert!(d.remaining().unwrap() > Duration::from_secs(50));
    }
}
