//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cloneable stop signal shared between a caller and a running solve.
///
/// Solver loops poll [`CancelToken::is_cancelled`] at recursion nodes,
/// annealing iterations and merge chunks. A token may also carry a
/// wall-clock deadline, after which it reports cancellation on its own.
///
/// A child token ([`CancelToken::child_with_timeout`]) observes its parent
/// but has its own flag and deadline, so a stage time limit never cancels
/// the caller's token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that cancels itself once `budget` has elapsed from now.
    pub fn with_timeout(budget: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(budget),
            parent: None,
        }
    }

    /// Token cancelled when `self` is, or once `budget` has elapsed.
    pub fn child_with_timeout(&self, budget: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(budget),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// The token's own flag, for runners that only watch an `AtomicBool`.
    ///
    /// Deadlines and parents do not touch the flag by themselves; call
    /// [`CancelToken::poll`] to fold them into it.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Like [`CancelToken::is_cancelled`], but also raises the own flag
    /// when the deadline or a parent fired.
    pub fn poll(&self) -> bool {
        let cancelled = self.is_cancelled();
        if cancelled {
            self.flag.store(true, Ordering::Relaxed);
        }
        cancelled
    }

    /// Requests cancellation. Visible to every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}
