use serde::{Deserialize, Serialize};

use crate::{ActorId, CommentId, GoalId, Timestamp};

/// A comment on a goal. Comments are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
	pub id: CommentId,
	pub goal_id: GoalId,
	#[serde(rename = "user_id")]
	pub author: ActorId,
	pub content: String,
	pub created_at: Timestamp,
}

/// Insert payload for a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
	pub goal_id: GoalId,
	#[serde(rename = "user_id")]
	pub author: ActorId,
	pub content: String,
}
