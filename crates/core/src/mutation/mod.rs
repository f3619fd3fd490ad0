//! Optimistic like/follow toggles and comment posting.
//!
//! A toggle flips the cached membership and count immediately (`Pending`),
//! issues the remote insert or delete, then either keeps the optimistic value
//! (`Committed`) or restores the exact prior state (`RolledBack`). A second
//! toggle for the same goal and kind while one is pending is rejected with
//! [`Error::MutationPending`]; distinct goals and kinds never block each other.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use cairn_backend::{Collection, Filter};
use cairn_primitives::{ActorId, Comment, Edge, EdgeKind, GoalId, NewComment};
use tracing::{debug, info, warn};

use crate::engagement::{EdgeSnapshot, EngagementStore, PendingToggle};
use crate::records::{decode_row, edge_collection, encode};
use crate::{Context, Error, Result};

/// Result of an intent that needs a signed-in actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
	/// No actor was signed in; nothing happened.
	Skipped,
	Applied(T),
}

impl<T> Outcome<T> {
	pub const fn is_skipped(&self) -> bool {
		matches!(self, Self::Skipped)
	}

	pub fn applied(self) -> Option<T> {
		match self {
			Self::Skipped => None,
			Self::Applied(value) => Some(value),
		}
	}
}

/// Drives optimistic engagement mutations against the backend.
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
	ctx: Context,
	store: Arc<EngagementStore>,
}

impl MutationCoordinator {
	pub fn new(ctx: Context, store: Arc<EngagementStore>) -> Self {
		Self { ctx, store }
	}

	pub fn store(&self) -> &EngagementStore {
		&self.store
	}

	/// Likes or unlikes `goal` on behalf of `actor`.
	pub async fn toggle_like(&self, goal: GoalId, actor: Option<ActorId>) -> Result<Outcome<EdgeSnapshot>> {
		self.toggle(goal, EdgeKind::Like, actor).await
	}

	/// Follows or unfollows `goal` on behalf of `actor`.
	pub async fn toggle_follow(&self, goal: GoalId, actor: Option<ActorId>) -> Result<Outcome<EdgeSnapshot>> {
		let outcome = self.toggle(goal, EdgeKind::Follow, actor).await?;
		if let Outcome::Applied(state) = &outcome {
			if state.viewer_member {
				self.ctx.notices().success("Now following this goal");
			} else {
				self.ctx.notices().info("Stopped following this goal");
			}
		}
		Ok(outcome)
	}

	async fn toggle(&self, goal: GoalId, kind: EdgeKind, actor: Option<ActorId>) -> Result<Outcome<EdgeSnapshot>> {
		let Some(actor) = actor else {
			debug!(%goal, kind = kind.as_str(), "toggle skipped, no actor");
			return Ok(Outcome::Skipped);
		};

		// Membership must be known before flipping it.
		if !self.store.edge_loaded(goal, kind)
			&& let Err(err) = self.store.fetch_edges(goal, kind, Some(actor)).await
		{
			warn!(%goal, kind = kind.as_str(), %err, "toggle aborted, membership unknown");
			self.ctx.notices().error(format!("Couldn't update {}: {err}", kind.as_str()));
			return Err(err);
		}

		let pending = self.store.begin_toggle(goal, kind)?;
		match self.submit(&pending, actor).await {
			Ok(()) => {
				let state = self.store.resolve_toggle(&pending, true);
				debug!(%goal, kind = kind.as_str(), count = state.count, member = state.viewer_member, "toggle committed");
				Ok(Outcome::Applied(state))
			}
			Err(err) => {
				let state = self.store.resolve_toggle(&pending, false);
				warn!(%goal, kind = kind.as_str(), %err, count = state.count, "toggle rolled back");
				self.ctx.notices().error(format!("Couldn't update {}: {err}", kind.as_str()));
				Err(err)
			}
		}
	}

	async fn submit(&self, pending: &PendingToggle, actor: ActorId) -> Result<()> {
		let collection = edge_collection(pending.kind);
		let backend = self.ctx.backend();
		if pending.target {
			let record = encode(&Edge::new(pending.goal, actor))?;
			match self.ctx.call(backend.insert(collection, record)).await {
				// The edge already exists remotely, which is the state we wanted.
				Err(Error::Constraint { constraint }) => {
					debug!(goal = %pending.goal, %constraint, "edge already present");
					Ok(())
				}
				other => other.map(drop),
			}
		} else {
			let filter = Filter::new()
				.eq("goal_id", pending.goal.to_string())
				.eq("user_id", actor.to_string());
			let removed = self.ctx.call(backend.delete(collection, filter)).await?;
			if removed == 0 {
				debug!(goal = %pending.goal, "edge already absent");
			}
			Ok(())
		}
	}

	/// Posts a comment on `goal` and reloads the goal's comments.
	///
	/// Blank text is rejected before any remote call. On failure the text is
	/// kept as the goal's draft.
	pub async fn post_comment(&self, goal: GoalId, actor: Option<ActorId>, text: &str) -> Result<Outcome<Comment>> {
		let Some(actor) = actor else {
			return Ok(Outcome::Skipped);
		};
		let content = text.trim();
		if content.is_empty() {
			return Err(Error::Validation("comment cannot be empty"));
		}

		self.store.keep_draft(goal, text);
		let record = encode(&NewComment {
			goal_id: goal,
			author: actor,
			content: content.to_owned(),
		})?;

		let stored = match self.ctx.call(self.ctx.backend().insert(Collection::GoalComments, record)).await {
			Ok(stored) => stored,
			Err(err) => {
				warn!(%goal, %err, "comment insert failed");
				self.ctx.notices().error("Failed to add comment");
				return Err(err);
			}
		};

		self.store.set_draft(goal, "");
		self.store.load_comments(goal).await;
		self.ctx.notices().success("Comment added!");
		info!(%goal, "comment added");
		decode_row(stored).map(Outcome::Applied)
	}
}
