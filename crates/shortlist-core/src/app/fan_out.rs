//! FanOut - 複数のエンベロープを同時に起動し、すべてを join する
//!
//! 各単位は現在のタスク上で並行に実行されます（`join_all`）。
//! 途中で打ち切ることはなく、すべての単位が終端状態に達してから戻ります。
//! 出力はインデックスで回収するので、完了順に関係なく入力順を保ちます。

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, instrument};

use super::runner::TaskRunner;
use crate::domain::{EnvelopeSummary, Outcome, TaskEnvelope, TaskError, TaskKind};

/// One unit handed to the coordinator: its identifier and the work itself.
pub type Unit<F> = (String, F);

/// Result of one fan-out.
#[derive(Debug, Clone)]
pub struct FanOutReport<T> {
    /// `(identifier, payload)` of each successful unit, in input order.
    pub successes: Vec<(String, T)>,
    /// `(identifier, error)` of each failed unit, in input order.
    pub failures: Vec<(String, TaskError)>,
    /// Envelope summaries of every unit, in input order.
    pub summaries: Vec<EnvelopeSummary>,
}

impl<T> FanOutReport<T> {
    pub fn launched(&self) -> usize {
        self.summaries.len()
    }

    pub fn all_failed(&self) -> bool {
        !self.summaries.is_empty() && self.successes.is_empty()
    }
}

/// One unit's envelope summary and outcome.
#[derive(Debug, Clone)]
pub struct UnitOutcome<T> {
    pub id: String,
    pub summary: EnvelopeSummary,
    pub outcome: Outcome<T>,
}

#[derive(Clone)]
pub struct FanOut {
    runner: TaskRunner,
    /// Soft cap on units in flight across all fan-outs of this coordinator.
    limiter: Option<Arc<Semaphore>>,
}

impl FanOut {
    /// `max_concurrency = None` launches every unit immediately.
    pub fn new(runner: TaskRunner, max_concurrency: Option<usize>) -> Self {
        Self {
            runner,
            limiter: max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// すべての単位を実行し、入力順に各 Outcome を返す
    #[instrument(skip_all, fields(task_type = %kind, units = units.len()))]
    pub async fn fan_out_outcomes<T, F, Fut>(
        &self,
        kind: TaskKind,
        units: Vec<Unit<F>>,
    ) -> Vec<UnitOutcome<T>>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TaskError>>,
    {
        let launched = units.into_iter().map(|(id, work)| self.run_unit(kind, id, work));
        let outcomes = join_all(launched).await;

        let failed = outcomes.iter().filter(|u| !u.outcome.is_success()).count();
        info!(
            succeeded = outcomes.len() - failed,
            failed,
            "fan-out joined"
        );
        outcomes
    }

    /// すべての単位を実行し、成功と失敗に振り分ける
    pub async fn fan_out<T, F, Fut>(&self, kind: TaskKind, units: Vec<Unit<F>>) -> FanOutReport<T>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TaskError>>,
    {
        let outcomes = self.fan_out_outcomes(kind, units).await;

        let mut report = FanOutReport {
            successes: Vec::new(),
            failures: Vec::new(),
            summaries: Vec::with_capacity(outcomes.len()),
        };
        for unit in outcomes {
            report.summaries.push(unit.summary);
            match unit.outcome {
                Outcome::Success { payload, .. } => report.successes.push((unit.id, payload)),
                Outcome::Failure { error, .. } => report.failures.push((unit.id, error)),
            }
        }
        report
    }

    async fn run_unit<T, F, Fut>(&self, kind: TaskKind, id: String, work: F) -> UnitOutcome<T>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TaskError>>,
    {
        // The semaphore is never closed, so acquire cannot fail; a missing
        // permit would only lift the cap.
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let mut envelope = TaskEnvelope::new(id, kind, self.runner.clock().now());
        let outcome = self.runner.run(&mut envelope, work).await;

        UnitOutcome {
            id: envelope.id().to_string(),
            summary: envelope.summary(),
            outcome,
        }
    }
}
