//! Cycle scheduling
//!
//! Runs the engine once, or forever with a fixed pause between cycles. The
//! pause starts when a cycle ends; there is no jitter and no catch-up.

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::engine::{CycleReport, ReconcileEngine};

/// When cycles run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A single cycle
    Once,
    /// A cycle, then a pause of the given length, forever
    Every(Duration),
}

/// Drives a [`ReconcileEngine`] according to a [`Schedule`]
pub struct Scheduler<'a> {
    engine: &'a ReconcileEngine,
    schedule: Schedule,
}

impl<'a> Scheduler<'a> {
    /// Create a scheduler
    pub fn new(engine: &'a ReconcileEngine, schedule: Schedule) -> Self {
        Self { engine, schedule }
    }

    /// Run cycles until the schedule ends or `shutdown` resolves
    ///
    /// `shutdown` is only observed while sleeping between cycles; a cycle in
    /// progress always completes.
    ///
    /// # Returns
    ///
    /// The number of cycles that ran
    pub async fn run_until<S>(&self, shutdown: S) -> usize
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0;

        loop {
            let report = self.engine.run_cycle().await;
            cycles += 1;
            log_report(&report);

            let interval = match self.schedule {
                Schedule::Once => return cycles,
                Schedule::Every(interval) => interval,
            };

            info!("Sleep {} seconds", interval.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    return cycles;
                }
            }
        }
    }

    /// Run cycles until the schedule ends
    ///
    /// With [`Schedule::Every`] this never returns.
    pub async fn run(&self) -> usize {
        self.run_until(std::future::pending()).await
    }
}

fn log_report(report: &CycleReport) {
    if let Some(family) = report.aborted {
        info!("Cycle ended early: no current {} address", family);
    }
}
