//! Request Context Module
//!
//! A lightweight cancellation and deadline token passed to every cache call.
//! The cache only inspects it once, on entry to an operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{CacheError, Result};

// == Cancel State ==
/// One link in a chain of cancellation flags. A context is cancelled when
/// its own flag or any ancestor's flag is set.
#[derive(Debug)]
struct CancelState {
    cancelled: AtomicBool,
    parent: Option<Arc<CancelState>>,
}

impl CancelState {
    fn is_cancelled(&self) -> bool {
        let mut state = Some(self);
        while let Some(s) = state {
            if s.cancelled.load(Ordering::Acquire) {
                return true;
            }
            state = s.parent.as_deref();
        }
        false
    }
}

// == Context ==
/// Caller-supplied context carrying an optional deadline and cancellation.
///
/// Cloning is cheap and clones observe the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<Arc<CancelState>>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a child context with the given deadline, keeping the earlier
    /// one if this context already has a deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Returns a child context that expires `timeout` from now.
    ///
    /// A timeout too large to represent adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Returns a cancellable child context and the handle that cancels it.
    ///
    /// Cancelling the child never affects this context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let state = Arc::new(CancelState {
            cancelled: AtomicBool::new(false),
            parent: self.cancel.clone(),
        });
        let ctx = Self {
            cancel: Some(Arc::clone(&state)),
            deadline: self.deadline,
        };
        (ctx, CancelHandle { state })
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context is done, or `None` if it is still live.
    ///
    /// Cancellation is reported ahead of an elapsed deadline.
    pub fn err(&self) -> Option<CacheError> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Some(CacheError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CacheError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Ok(())` while the context is live, otherwise the matching error.
    pub fn check(&self) -> Result<()> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// == Cancel Handle ==
/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Marks the context (and every context derived from it) as cancelled.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert_ok!(ctx.check());
    }

    #[test]
    fn test_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        assert_ok!(ctx.check());

        handle.cancel();

        assert!(handle.is_cancelled());
        assert_eq!(ctx.err(), Some(CacheError::Canceled));
        assert_eq!(assert_err!(ctx.clone().check()), CacheError::Canceled);
    }

    #[test]
    fn test_cancel_propagates_to_children_only() {
        let (parent, parent_handle) = Context::background().with_cancel();
        let (child, child_handle) = parent.with_cancel();

        child_handle.cancel();
        assert_eq!(child.err(), Some(CacheError::Canceled));
        assert!(parent.err().is_none());

        let (other_child, _) = parent.with_cancel();
        parent_handle.cancel();
        assert_eq!(other_child.err(), Some(CacheError::Canceled));
    }

    #[test]
    fn test_elapsed_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(CacheError::DeadlineExceeded));
    }

    #[test]
    fn test_future_deadline_is_live() {
        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        assert!(ctx.deadline().is_some());
        assert_ok!(ctx.check());
    }

    #[test]
    fn test_unbounded_timeout_adds_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert_ok!(ctx.check());

        let bounded = Context::background().with_timeout(Duration::from_secs(60));
        let ctx = bounded.with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), bounded.deadline());
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let early = now + Duration::from_secs(1);
        let late = now + Duration::from_secs(10);

        let ctx = Context::background().with_deadline(early).with_deadline(late);
        assert_eq!(ctx.deadline(), Some(early));

        let ctx = Context::background().with_deadline(late).with_deadline(early);
        assert_eq!(ctx.deadline(), Some(early));
    }

    #[test]
    fn test_canceled_takes_precedence_over_deadline() {
        let (ctx, handle) = Context::background()
            .with_deadline(Instant::now())
            .with_cancel();
        handle.cancel();
        assert_eq!(ctx.err(), Some(CacheError::Canceled));
    }
}
