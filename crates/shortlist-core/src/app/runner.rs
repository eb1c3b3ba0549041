//! TaskRunner - エンベロープを 1 つ実行し、失敗を外に漏らさない
//!
//! 作業単位の失敗はすべて `Outcome::Failure` になります:
//! - 単位が `Err(TaskError)` を返した
//! - 設定されたデッドラインを超えた
//! - panic した（future の生成中、または poll 中）

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::domain::{Outcome, TaskEnvelope, TaskError};
use crate::ports::Clock;

#[derive(Clone)]
pub struct TaskRunner {
    clock: Arc<dyn Clock>,
    timeout: Option<Duration>,
}

impl TaskRunner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timeout: None,
        }
    }

    /// Per-invocation deadline. `None` disables it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// `envelope` の中で `work` を実行
    ///
    /// エンベロープは `Running` を経て `Completed` か `Failed` に遷移し、
    /// 結果ログかエラーログにちょうど 1 件追記される。
    pub async fn run<T, F, Fut>(&self, envelope: &mut TaskEnvelope<T>, work: F) -> Outcome<T>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TaskError>>,
    {
        envelope.start(self.clock.now());
        debug!(
            task_id = envelope.id(),
            task_type = %envelope.kind(),
            "envelope running"
        );

        let result = self.execute(work).await;
        let at = self.clock.now();

        match result {
            Ok(payload) => {
                envelope.complete(payload.clone(), at);
                debug!(task_id = envelope.id(), "envelope completed");
                Outcome::success(payload, at)
            }
            Err(error) => {
                warn!(
                    task_id = envelope.id(),
                    task_type = %envelope.kind(),
                    error_kind = error.kind(),
                    error = %error,
                    "envelope failed"
                );
                envelope.fail(error.clone(), at);
                Outcome::failure(error, at)
            }
        }
    }

    async fn execute<T, F, Fut>(&self, work: F) -> Result<T, TaskError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TaskError>>,
    {
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(fut) => fut,
            Err(panic) => return Err(TaskError::Panicked(panic_message(panic.as_ref()))),
        };

        let guarded = AssertUnwindSafe(fut).catch_unwind();
        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(TaskError::TimedOut {
                        after_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => guarded.await,
        };

        joined.unwrap_or_else(|panic| Err(TaskError::Panicked(panic_message(panic.as_ref()))))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
