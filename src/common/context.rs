//! Cancellable execution scope shared by every call within one migration run

use crate::error::{MigrateError, Result};
use std::future::Future;
use tokio_util::sync::{CancellationToken, DropGuard};

/// A cancellable scope for one migration run.
///
/// Every HTTP request and every external process is awaited through
/// [`RunContext::run`], so cancelling the context (operator interrupt or
/// controller teardown) unwinds whatever is in flight.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a child scope. Cancelling the parent cancels the child, not the
    /// other way round.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Returns a guard that cancels this context when dropped.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Races `future` against cancellation.
    ///
    /// The future is dropped as soon as the context is cancelled, which aborts
    /// in-flight `reqwest` requests.
    pub async fn run<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(MigrateError::Cancelled),
            result = future => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = RunContext::new();
        let value = ctx.run(async { Ok::<_, MigrateError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_on_cancelled_context_does_not_poll() {
        let ctx = RunContext::new();
        ctx.cancel();

        let result = ctx
            .run(async { Err::<(), _>(MigrateError::Network("polled".to_string())) })
            .await;
        assert!(matches!(result, Err(MigrateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let ctx = RunContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_child_follows_parent_but_not_reverse() {
        let parent = RunContext::new();
        let child = parent.child();
        {
            let _guard = child.cancel_on_drop();
        }
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let second = parent.child();
        parent.cancel();
        assert!(second.is_cancelled());
    }
}
