// src/lifecycle.rs

//! The reference agent lifecycle: a concrete state set and policy for
//! goal-driven agent sessions. Sub-domain policies (persona evolution,
//! content pipelines) are instances of the same [`TransitionPolicy`] shape
//! over their own state sets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::policy::TransitionPolicy;

/// Lifecycle states of a goal-driven agent session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// Waiting for work.
    Idle,
    /// Session accepted, warming up.
    Init,
    /// Interpreting the goal statement.
    GoalParse,
    /// Producing or refining a plan.
    Planning,
    /// Carrying out plan steps.
    Executing,
    /// Checking results of execution.
    Validating,
    /// Producing the outward-facing report.
    Reporting,
    /// Goal achieved.
    Completed,
    /// Unrecoverable failure.
    Error,
    /// Session closed; no further transitions.
    Terminated,
}

impl AgentState {
    /// All lifecycle states, in declaration order.
    pub fn all() -> Vec<AgentState> {
        AgentState::iter().collect()
    }
}

/// The reference lifecycle policy.
///
/// `TERMINATED` is the only terminal state; `ERROR` and `IDLE` stay
/// reachable from every live state so a session can always be parked or
/// abandoned.
pub fn agent_lifecycle_policy() -> TransitionPolicy<AgentState> {
    use AgentState::*;
    TransitionPolicy::from_edges([
        (Idle, vec![Init, Error, Terminated]),
        (Init, vec![GoalParse, Error, Terminated, Idle]),
        (GoalParse, vec![Planning, Error, Terminated, Idle]),
        (Planning, vec![Planning, Executing, Error, Terminated, Idle]),
        (
            Executing,
            vec![Executing, Validating, Reporting, Error, Terminated, Idle],
        ),
        (
            Validating,
            vec![Validating, Completed, Reporting, Executing, Error, Terminated, Idle],
        ),
        (
            Reporting,
            vec![Validating, Reporting, Completed, Error, Terminated, Idle],
        ),
        (Completed, vec![Terminated, Idle]),
        (Error, vec![Terminated, Idle]),
        (Terminated, vec![]),
    ])
}
