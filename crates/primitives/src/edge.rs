use serde::{Deserialize, Serialize};

use crate::{ActorId, GoalId};

/// Kind of engagement edge between an actor and a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
	Like,
	Follow,
}

impl EdgeKind {
	/// Short name used in logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Like => "like",
			Self::Follow => "follow",
		}
	}
}

/// A like or follow edge. At most one edge exists per `(goal_id, user_id)` and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
	pub goal_id: GoalId,
	#[serde(rename = "user_id")]
	pub actor: ActorId,
}

impl Edge {
	pub const fn new(goal_id: GoalId, actor: ActorId) -> Self {
		Self { goal_id, actor }
	}
}
