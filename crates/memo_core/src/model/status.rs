//! Service-order status sequence.
//!
//! # Responsibility
//! - Define the seven ordered workflow states of a service order.
//! - Own the adjacency rule used by the kanban board.
//!
//! # Invariants
//! - `ALL` is ordered; `index()` is the position in `ALL`.
//! - An order may only advance to the immediately-next state. Backward
//!   moves and skips are never valid transitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Assigned,
    InDiagnosis,
    AwaitingApproval,
    AwaitingParts,
    InExecution,
    Finalized,
}

impl OrderStatus {
    /// Every state in workflow order.
    pub const ALL: [OrderStatus; 7] = [
        Self::Open,
        Self::Assigned,
        Self::InDiagnosis,
        Self::AwaitingApproval,
        Self::AwaitingParts,
        Self::InExecution,
        Self::Finalized,
    ];

    /// Position of this state in the workflow sequence.
    pub fn index(self) -> usize {
        match self {
            Self::Open => 0,
            Self::Assigned => 1,
            Self::InDiagnosis => 2,
            Self::AwaitingApproval => 3,
            Self::AwaitingParts => 4,
            Self::InExecution => 5,
            Self::Finalized => 6,
        }
    }

    /// Immediately-next state, `None` for `Finalized`.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Returns whether `destination` is the single allowed successor.
    pub fn can_advance_to(self, destination: Self) -> bool {
        destination.index() == self.index() + 1
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Finalized
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "aberta",
            Self::Assigned => "designada",
            Self::InDiagnosis => "em_diagnostico",
            Self::AwaitingApproval => "aguardando_aprovacao",
            Self::AwaitingParts => "aguardando_pecas",
            Self::InExecution => "em_execucao",
            Self::Finalized => "finalizada",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Column title shown on the board.
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Aberta",
            Self::Assigned => "Designada",
            Self::InDiagnosis => "Em Diagnóstico",
            Self::AwaitingApproval => "Aguardando Aprovação",
            Self::AwaitingParts => "Aguardando Peças",
            Self::InExecution => "Em Execução",
            Self::Finalized => "Finalizada",
        }
    }
}
