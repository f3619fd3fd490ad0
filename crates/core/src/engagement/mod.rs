//! Per-goal engagement cache.
//!
//! Tracks like and follow counts with the viewer's membership, the ordered
//! comment list and the viewer's unsent comment draft for every goal
//! currently rendered. Entries appear on the first successful fetch and are
//! evicted when the goal leaves the rendered set.
//!
//! Only this store and the [`MutationCoordinator`](crate::MutationCoordinator)
//! write the cache. Fetch failures never clear cached values: the store logs
//! the failure and keeps serving the last known state.

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use cairn_backend::{Collection, Direction, Query};
use cairn_primitives::{ActorId, Comment, Edge, EdgeKind, GoalId};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::records::{decode_rows, edge_collection};
use crate::{Context, Error, Result, profiles};

/// Lifecycle of the latest like/follow mutation on one goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPhase {
	#[default]
	Idle,
	Pending,
	Committed,
	RolledBack,
}

/// Count and viewer membership for one edge kind on one goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeSnapshot {
	pub count: usize,
	pub viewer_member: bool,
	pub phase: MutationPhase,
}

/// A comment with its author's resolved display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
	pub comment: Comment,
	pub author: Option<String>,
}

impl CommentEntry {
	/// Author name for display, `"anonymous"` when unresolved.
	pub fn author_label(&self) -> &str {
		self.author.as_deref().unwrap_or("anonymous")
	}
}

/// Read-only engagement view of one goal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngagementSnapshot {
	pub likes: EdgeSnapshot,
	pub follows: EdgeSnapshot,
	/// Newest first.
	pub comments: Vec<CommentEntry>,
	pub comment_count: usize,
	/// Unsent comment text.
	pub draft: String,
}

#[derive(Debug, Default)]
struct Entry {
	likes: EdgeSnapshot,
	follows: EdgeSnapshot,
	/// Set once the kind has been fetched; until then its snapshot is a placeholder.
	likes_loaded: bool,
	follows_loaded: bool,
	comments: Vec<CommentEntry>,
	draft: String,
}

impl Entry {
	fn edge(&self, kind: EdgeKind) -> &EdgeSnapshot {
		match kind {
			EdgeKind::Like => &self.likes,
			EdgeKind::Follow => &self.follows,
		}
	}

	fn edge_mut(&mut self, kind: EdgeKind) -> &mut EdgeSnapshot {
		match kind {
			EdgeKind::Like => &mut self.likes,
			EdgeKind::Follow => &mut self.follows,
		}
	}

	fn is_loaded(&self, kind: EdgeKind) -> bool {
		match kind {
			EdgeKind::Like => self.likes_loaded,
			EdgeKind::Follow => self.follows_loaded,
		}
	}

	fn mark_loaded(&mut self, kind: EdgeKind) {
		match kind {
			EdgeKind::Like => self.likes_loaded = true,
			EdgeKind::Follow => self.follows_loaded = true,
		}
	}

	fn snapshot(&self) -> EngagementSnapshot {
		EngagementSnapshot {
			likes: self.likes,
			follows: self.follows,
			comments: self.comments.clone(),
			comment_count: self.comments.len(),
			draft: self.draft.clone(),
		}
	}
}

/// An optimistic toggle applied to the cache and awaiting resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingToggle {
	pub goal: GoalId,
	pub kind: EdgeKind,
	/// Membership the toggle moves to.
	pub target: bool,
	prior: EdgeSnapshot,
}

/// Cache of engagement state keyed by goal id.
#[derive(Debug)]
pub struct EngagementStore {
	ctx: Context,
	entries: RwLock<HashMap<GoalId, Entry>>,
}

impl EngagementStore {
	pub fn new(ctx: Context) -> Self {
		Self {
			ctx,
			entries: RwLock::new(HashMap::new()),
		}
	}

	/// Fetches like edges for `goal` and caches count and viewer membership.
	pub async fn load_likes(&self, goal: GoalId, viewer: Option<ActorId>) -> EdgeSnapshot {
		self.load_edges(goal, EdgeKind::Like, viewer).await
	}

	/// Fetches follow edges for `goal` and caches count and viewer membership.
	pub async fn load_follows(&self, goal: GoalId, viewer: Option<ActorId>) -> EdgeSnapshot {
		self.load_edges(goal, EdgeKind::Follow, viewer).await
	}

	async fn load_edges(&self, goal: GoalId, kind: EdgeKind, viewer: Option<ActorId>) -> EdgeSnapshot {
		match self.fetch_edges(goal, kind, viewer).await {
			Ok(state) => state,
			Err(err) => {
				warn!(%goal, kind = kind.as_str(), %err, "engagement load failed, keeping cached state");
				self.edge_snapshot(goal, kind)
			}
		}
	}

	/// Like [`Self::load_likes`] for either kind, but returns fetch failures.
	pub(crate) async fn fetch_edges(&self, goal: GoalId, kind: EdgeKind, viewer: Option<ActorId>) -> Result<EdgeSnapshot> {
		let query = Query::new(edge_collection(kind)).eq("goal_id", goal.to_string());
		let rows = self.ctx.call(self.ctx.backend().query(query)).await?;

		let edges: Vec<Edge> = decode_rows(edge_collection(kind), rows);
		let count = edges.iter().map(|e| e.actor).collect::<HashSet<_>>().len();
		let viewer_member = viewer.is_some_and(|v| edges.iter().any(|e| e.actor == v));

		let mut entries = self.entries.write();
		let entry = entries.entry(goal).or_default();
		entry.mark_loaded(kind);
		let state = entry.edge_mut(kind);
		if state.phase == MutationPhase::Pending {
			debug!(%goal, kind = kind.as_str(), "mutation pending, load result discarded");
			return Ok(*state);
		}
		state.count = count;
		state.viewer_member = viewer_member;
		Ok(*state)
	}

	/// Returns true once `kind` has been fetched for `goal` since it was cached.
	pub(crate) fn edge_loaded(&self, goal: GoalId, kind: EdgeKind) -> bool {
		self.entries.read().get(&goal).is_some_and(|e| e.is_loaded(kind))
	}

	/// Fetches comments for `goal`, newest first, with author names resolved.
	pub async fn load_comments(&self, goal: GoalId) -> Vec<CommentEntry> {
		let query = Query::new(Collection::GoalComments)
			.eq("goal_id", goal.to_string())
			.order_by("created_at", Direction::Descending);
		let rows = match self.ctx.call(self.ctx.backend().query(query)).await {
			Ok(rows) => rows,
			Err(err) => {
				warn!(%goal, %err, "comment load failed, keeping cached comments");
				return self.comments(goal);
			}
		};

		let mut comments: Vec<Comment> = decode_rows(Collection::GoalComments, rows);
		comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		let names = profiles::usernames(&self.ctx, comments.iter().map(|c| c.author)).await;
		let comments: Vec<CommentEntry> = comments
			.into_iter()
			.map(|comment| CommentEntry {
				author: names.get(&comment.author).cloned(),
				comment,
			})
			.collect();

		self.entries.write().entry(goal).or_default().comments = comments.clone();
		comments
	}

	/// Loads likes, follows and comments concurrently.
	pub async fn load_all(&self, goal: GoalId, viewer: Option<ActorId>) -> EngagementSnapshot {
		tokio::join!(
			self.load_likes(goal, viewer),
			self.load_follows(goal, viewer),
			self.load_comments(goal),
		);
		self.snapshot(goal)
	}

	/// Cached engagement for `goal`, or an empty snapshot when not cached.
	pub fn snapshot(&self, goal: GoalId) -> EngagementSnapshot {
		self.entries.read().get(&goal).map(Entry::snapshot).unwrap_or_default()
	}

	pub fn edge_snapshot(&self, goal: GoalId, kind: EdgeKind) -> EdgeSnapshot {
		self.entries
			.read()
			.get(&goal)
			.map(|e| *e.edge(kind))
			.unwrap_or_default()
	}

	pub fn comments(&self, goal: GoalId) -> Vec<CommentEntry> {
		self.entries
			.read()
			.get(&goal)
			.map(|e| e.comments.clone())
			.unwrap_or_default()
	}

	pub fn contains(&self, goal: GoalId) -> bool {
		self.entries.read().contains_key(&goal)
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Drops the entry for a goal that left the rendered set.
	pub fn evict(&self, goal: GoalId) {
		if self.entries.write().remove(&goal).is_some() {
			debug!(%goal, "engagement evicted");
		}
	}

	/// Keeps only entries for `rendered` goals.
	pub fn retain(&self, rendered: &HashSet<GoalId>) {
		let mut entries = self.entries.write();
		let before = entries.len();
		entries.retain(|goal, _| rendered.contains(goal));
		let evicted = before - entries.len();
		if evicted > 0 {
			debug!(evicted, remaining = entries.len(), "engagement retained rendered goals");
		}
	}

	/// Unsent comment text for `goal`.
	pub fn draft(&self, goal: GoalId) -> String {
		self.entries
			.read()
			.get(&goal)
			.map(|e| e.draft.clone())
			.unwrap_or_default()
	}

	/// Stores unsent comment text. Ignored for goals that are not cached.
	pub fn set_draft(&self, goal: GoalId, text: &str) {
		if let Some(entry) = self.entries.write().get_mut(&goal) {
			entry.draft = text.to_owned();
		}
	}

	/// Stores comment text being submitted, caching the goal if needed so a
	/// failed submission keeps it.
	pub(crate) fn keep_draft(&self, goal: GoalId, text: &str) {
		self.entries.write().entry(goal).or_default().draft = text.to_owned();
	}

	/// Applies an optimistic toggle, moving the edge to `Pending`.
	///
	/// Rejected while another toggle of the same kind on this goal is pending.
	pub(crate) fn begin_toggle(&self, goal: GoalId, kind: EdgeKind) -> Result<PendingToggle> {
		let mut entries = self.entries.write();
		let state = entries.entry(goal).or_default().edge_mut(kind);
		if state.phase == MutationPhase::Pending {
			return Err(Error::MutationPending { goal, kind });
		}

		let prior = *state;
		let target = !prior.viewer_member;
		state.viewer_member = target;
		state.count = if target { prior.count + 1 } else { prior.count.saturating_sub(1) };
		state.phase = MutationPhase::Pending;
		debug!(%goal, kind = kind.as_str(), target, count = state.count, "toggle pending");

		Ok(PendingToggle { goal, kind, target, prior })
	}

	/// Resolves a pending toggle: keeps the optimistic value on success,
	/// restores the exact prior count and membership on failure.
	pub(crate) fn resolve_toggle(&self, pending: &PendingToggle, committed: bool) -> EdgeSnapshot {
		let mut entries = self.entries.write();
		let Some(entry) = entries.get_mut(&pending.goal) else {
			debug!(goal = %pending.goal, "toggle resolved after eviction");
			return EdgeSnapshot {
				phase: if committed { MutationPhase::Committed } else { MutationPhase::RolledBack },
				..pending.prior
			};
		};

		let state = entry.edge_mut(pending.kind);
		if committed {
			state.phase = MutationPhase::Committed;
		} else {
			state.count = pending.prior.count;
			state.viewer_member = pending.prior.viewer_member;
			state.phase = MutationPhase::RolledBack;
		}
		*state
	}
}
