use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::ingress::IngressReceiver;
use crate::pipeline::Pipeline;
use crate::signature::RenderDecision;
use crate::view::Page;

/// Longest a single drain may keep the render loop busy.
pub const DRAIN_BUDGET: Duration = Duration::from_millis(500);
/// Pause between detecting a change and signalling a render.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub processed: usize,
    /// `false` when the budget ran out with records still queued.
    pub exhausted: bool,
}

/// Drains the ingress queue into the pipeline and decides when the view re-renders.
#[derive(Debug, Clone)]
pub struct RenderScheduler<C = SystemClock> {
    clock: C,
    drain_budget: Duration,
    settle_delay: Duration,
}

impl RenderScheduler<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RenderScheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RenderScheduler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            drain_budget: DRAIN_BUDGET,
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn drain_budget(mut self, budget: Duration) -> Self {
        self.drain_budget = budget;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Process queued records until the queue is empty or the budget is spent.
    /// Whatever is left stays queued for the next cycle.
    pub fn drain(&self, pipeline: &mut Pipeline, ingress: &mut IngressReceiver) -> DrainReport {
        let started = self.clock.now();
        let mut processed = 0;

        while let Some(record) = ingress.try_pop() {
            pipeline.ingest(record);
            processed += 1;

            if self.clock.now().duration_since(started) > self.drain_budget {
                let exhausted = ingress.is_empty();
                if !exhausted {
                    tracing::debug!(processed, remaining = ingress.len(), "Drain budget spent");
                }
                return DrainReport { processed, exhausted };
            }
        }

        DrainReport { processed, exhausted: true }
    }

    /// One cycle: drain, compare fingerprints, and settle before asking for a render.
    pub async fn run_cycle(&self, pipeline: &mut Pipeline, ingress: &mut IngressReceiver, page: Page) -> RenderDecision {
        let report = self.drain(pipeline, ingress);
        let decision = pipeline.observe(page);

        if decision.should_render() {
            tracing::debug!(processed = report.processed, ?decision, "Render requested");
            tokio::time::sleep(self.settle_delay).await;
        }

        decision
    }
}
