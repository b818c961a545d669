//! Event types for different topics.

use reclaim_core::{
    ActorId, CostEntry, DisableReason, EntityId, SessionMode, StructureId, SweepKind,
    SweepReport,
};
use serde::{Deserialize, Serialize};

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Activated {
        actor: ActorId,
        mode: SessionMode,
        duration: f64,
    },
    Ended {
        actor: ActorId,
        reason: DisableReason,
        /// Successful uses during the session.
        removed: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemovalEvent {
    Removed {
        actor: ActorId,
        entity: EntityId,
        display_name: String,
        charged: Vec<CostEntry>,
        credited: Vec<CostEntry>,
        /// Refund credits the currency provider or hook refused.
        failed: Vec<CostEntry>,
        /// Refund stacks that did not fit and were dropped at the actor.
        overflow: usize,
    },
    Denied {
        actor: ActorId,
        entity: Option<EntityId>,
        code: String,
        message: String,
    },
    InsufficientFunds {
        actor: ActorId,
        missing: Vec<CostEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SweepEvent {
    Started {
        requester: ActorId,
        kind: SweepKind,
    },
    Rejected {
        requester: ActorId,
        kind: SweepKind,
    },
    Completed {
        requester: ActorId,
        kind: SweepKind,
        discovered: usize,
        removed: usize,
        disposed_stacks: usize,
        cancelled: bool,
    },
}

impl SweepEvent {
    pub(crate) fn completed(requester: ActorId, kind: SweepKind, report: &SweepReport) -> Self {
        Self::Completed {
            requester,
            kind,
            discovered: report.discovered,
            removed: report.removed,
            disposed_stacks: report.disposed_stacks,
            cancelled: report.cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaidEvent {
    Blocked {
        structure: Option<StructureId>,
        actors: Vec<ActorId>,
    },
    Pruned {
        removed: usize,
    },
}
