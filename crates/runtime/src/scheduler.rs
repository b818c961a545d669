//! Cooperative driver for in-flight batch sweeps.

use reclaim_core::{ActorId, ReclaimEngine, Sweep, SweepKind, SweepReport, SweepStatus, WorldState};

/// A sweep that finished (or was cancelled) during [`SweepScheduler::advance`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FinishedSweep {
    pub requester: ActorId,
    pub kind: SweepKind,
    pub report: SweepReport,
}

/// Sweeps in start order. Each tick gives every sweep the same step budget.
#[derive(Debug, Default)]
pub(crate) struct SweepScheduler {
    active: Vec<Sweep>,
}

impl SweepScheduler {
    pub fn schedule(&mut self, sweep: Sweep) {
        self.active.push(sweep);
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn kinds(&self) -> impl Iterator<Item = SweepKind> + '_ {
        self.active.iter().map(Sweep::kind)
    }

    /// Steps every sweep up to `steps` times; finished sweeps leave the queue.
    pub fn advance(
        &mut self,
        engine: &mut ReclaimEngine,
        world: &mut WorldState,
        steps: usize,
    ) -> Vec<FinishedSweep> {
        let mut finished = Vec::new();
        self.active.retain_mut(|sweep| {
            for _ in 0..steps.max(1) {
                if let SweepStatus::Done(report) = engine.step_sweep(sweep, world) {
                    finished.push(FinishedSweep {
                        requester: sweep.requester(),
                        kind: sweep.kind(),
                        report,
                    });
                    return false;
                }
            }
            true
        });
        finished
    }
}
