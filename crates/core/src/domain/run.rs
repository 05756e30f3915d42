// Run Phase State Machine
//
// start -> navigating -> extracting -> {completed | failed}
// Failed is reachable from every non-terminal phase. Nothing moves backwards.

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Start,
    Navigating,
    Extracting,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed)
    }

    fn can_advance_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Start, Navigating)
                | (Navigating, Extracting)
                | (Extracting, Completed)
                | (Start | Navigating | Extracting, Failed)
        )
    }

    /// Move to `next`, rejecting backward or post-terminal moves
    pub fn advance(&mut self, next: RunPhase) -> Result<()> {
        if !self.can_advance_to(next) {
            return Err(DomainError::InvalidRunTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunPhase::Start => "start",
            RunPhase::Navigating => "navigating",
            RunPhase::Extracting => "extracting",
            RunPhase::Completed => "completed",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}
