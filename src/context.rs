//! Per-call dial context.
//!
//! A [`DialContext`] travels with a single dial: the restricted dialer hands
//! the very same value to the resolver and to the connect primitive. Deriving
//! a context (`with_bypass`, `with_deadline`) returns a new value and leaves
//! the parent untouched, so a privileged call site can bypass address checks
//! without affecting any other call.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::Instant;

/// Request-scoped values for one dial.
#[derive(Debug, Clone, Default)]
pub struct DialContext {
    // Only settable through `with_bypass`.
    bypass: bool,
    deadline: Option<Instant>,
}

impl DialContext {
    /// An empty context: no bypass, no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context that skips address checks.
    ///
    /// Connections made under bypass still go to the IP address that was
    /// resolved and inspected, never to a host name that could re-resolve.
    pub fn with_bypass(&self) -> Self {
        Self {
            bypass: true,
            ..self.clone()
        }
    }

    /// Whether address checks are bypassed for this call.
    pub fn has_bypass(&self) -> bool {
        self.bypass
    }

    /// Derive a context that must complete by `deadline`.
    ///
    /// A deadline already set on `self` is kept if it is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Derive a context that must complete within `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline of this call, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run `fut`, failing with [`io::ErrorKind::TimedOut`] if the deadline
    /// passes first.
    pub async fn run<T, F>(&self, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))?,
            None => fut.await,
        }
    }
}

/// Derive a context that skips address checks. See [`DialContext::with_bypass`].
pub fn with_bypass(cx: &DialContext) -> DialContext {
    cx.with_bypass()
}

/// Whether `cx` skips address checks. See [`DialContext::has_bypass`].
pub fn has_bypass(cx: &DialContext) -> bool {
    cx.has_bypass()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_bypass() {
        assert!(!DialContext::new().has_bypass());
        assert!(DialContext::new().deadline().is_none());
    }

    #[test]
    fn test_with_bypass_does_not_mutate_parent() {
        let parent = DialContext::new();
        let child = with_bypass(&parent);
        assert!(has_bypass(&child));
        assert!(!has_bypass(&parent));
    }

    #[test]
    fn test_bypass_survives_further_derivation() {
        let cx = DialContext::new()
            .with_bypass()
            .with_timeout(Duration::from_secs(5));
        assert!(cx.has_bypass());
        assert!(cx.clone().has_bypass());
    }

    #[test]
    fn test_sibling_contexts_are_independent() {
        let parent = DialContext::new();
        let bypassed = parent.with_bypass();
        let sibling = parent.with_timeout(Duration::from_secs(1));
        assert!(bypassed.has_bypass());
        assert!(!sibling.has_bypass());
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let early = now + Duration::from_secs(1);
        let late = now + Duration::from_secs(10);

        let cx = DialContext::new().with_deadline(early).with_deadline(late);
        assert_eq!(cx.deadline(), Some(early));

        let cx = DialContext::new().with_deadline(late).with_deadline(early);
        assert_eq!(cx.deadline(), Some(early));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let cx = DialContext::new().with_timeout(Duration::from_millis(50));
        let result: io::Result<()> = cx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_run_without_deadline() {
        let result = DialContext::new().run(async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
