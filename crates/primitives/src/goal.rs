use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActorId, GoalId, Timestamp};

/// Maximum number of incomplete goals an actor may hold at once.
pub const SLATE_CAPACITY: usize = 3;

/// A goal row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
	pub id: GoalId,
	#[serde(rename = "user_id")]
	pub owner: ActorId,
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub is_completed: bool,
	pub created_at: Timestamp,
	#[serde(default)]
	pub completed_at: Option<Timestamp>,
}

impl Goal {
	/// Lifecycle state derived from the completion flag.
	pub const fn state(&self) -> GoalState {
		if self.is_completed { GoalState::Completed } else { GoalState::Active }
	}

	/// Description text, with a missing description read as empty.
	pub fn description_or_empty(&self) -> &str {
		self.description.as_deref().unwrap_or_default()
	}
}

/// Insert payload for a new goal. The backend fills in id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGoal {
	#[serde(rename = "user_id")]
	pub owner: ActorId,
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl NewGoal {
	/// Builds an insert payload, trimming the title and dropping blank descriptions.
	pub fn new(owner: ActorId, title: &str, description: Option<&str>) -> Self {
		let description = description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_owned);
		Self {
			owner,
			title: title.trim().to_owned(),
			description,
		}
	}
}

/// Lifecycle of a goal. `Completed` and `Deleted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalState {
	Active,
	Completed,
	Deleted,
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("goal cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
	pub from: GoalState,
	pub to: GoalState,
}

impl GoalState {
	/// Validates a transition, returning the target state.
	pub fn transition(self, to: GoalState) -> Result<GoalState, TransitionError> {
		match (self, to) {
			(Self::Active, Self::Completed | Self::Deleted) => Ok(to),
			(from, to) => Err(TransitionError { from, to }),
		}
	}

	/// Returns true for states with no outgoing transitions.
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Deleted)
	}
}
