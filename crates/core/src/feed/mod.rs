//! Community feed composition.
//!
//! The feed merges two sources in a fixed order: live goals owned by other
//! actors (newest first, bounded by the configured window) and the built-in
//! [`supplemental`] examples. Entries are deduplicated by goal id only, the
//! first occurrence winning, then filtered by the current search query.
//!
//! Views are pure projections of the cached sources and the query; only
//! [`FeedComposer::refresh`] touches the backend.

pub mod supplemental;

use std::collections::HashSet;

use cairn_backend::{Collection, Direction, Query};
use cairn_config::FeedConfig;
use cairn_primitives::{ActorId, Goal, GoalId, Timestamp};
use chrono_humanize::HumanTime;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::records::decode_rows;
use crate::{Context, Result, profiles};

/// A goal as rendered in the feed, with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
	pub goal: Goal,
	pub author: Option<String>,
}

impl FeedEntry {
	pub const fn id(&self) -> GoalId {
		self.goal.id
	}

	/// Author name for display, `"anonymous"` when unresolved.
	pub fn author_name(&self) -> &str {
		self.author.as_deref().unwrap_or("anonymous")
	}

	/// Case-insensitive substring match on author, title or description.
	///
	/// `needle` must already be lowercase. Missing fields read as empty.
	pub fn matches(&self, needle: &str) -> bool {
		if needle.is_empty() {
			return true;
		}
		[self.author.as_deref().unwrap_or_default(), self.goal.title.as_str(), self.goal.description_or_empty()]
			.iter()
			.any(|field| field.to_lowercase().contains(needle))
	}

	/// Humanized creation time relative to `now`, e.g. "2 days ago".
	pub fn age_label(&self, now: Timestamp) -> String {
		HumanTime::from(self.goal.created_at - now).to_string()
	}
}

/// Why a feed view has no entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
	/// The search query filtered out every entry.
	NoMatches { query: String },
	/// There is nothing to show at all.
	NoGoals,
}

impl std::fmt::Display for EmptyState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NoMatches { query } => write!(f, "No goals found matching \"{query}\""),
			Self::NoGoals => f.write_str("No community goals yet"),
		}
	}
}

/// Filtered feed produced for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
	pub query: String,
	pub entries: Vec<FeedEntry>,
	/// Set when `entries` is empty.
	pub empty_state: Option<EmptyState>,
}

impl FeedView {
	pub fn ids(&self) -> HashSet<GoalId> {
		self.entries.iter().map(FeedEntry::id).collect()
	}
}

/// Concatenates sources in order, keeping the first entry for each goal id.
pub fn merge(sources: impl IntoIterator<Item = Vec<FeedEntry>>) -> Vec<FeedEntry> {
	let mut seen = HashSet::new();
	sources
		.into_iter()
		.flatten()
		.filter(|entry| seen.insert(entry.id()))
		.collect()
}

/// Entries matching `query` case-insensitively, in feed order.
pub fn filter<'a>(entries: &'a [FeedEntry], query: &str) -> impl Iterator<Item = &'a FeedEntry> + use<'a> {
	let needle = query.to_lowercase();
	entries.iter().filter(move |entry| entry.matches(&needle))
}

#[derive(Debug, Default)]
struct FeedState {
	/// `None` until the first successful fetch.
	live: Option<Vec<FeedEntry>>,
	query: String,
}

/// Maintains the community feed for one viewer.
#[derive(Debug)]
pub struct FeedComposer {
	ctx: Context,
	viewer: Option<ActorId>,
	config: FeedConfig,
	state: RwLock<FeedState>,
}

impl FeedComposer {
	pub fn new(ctx: Context, viewer: Option<ActorId>, config: FeedConfig) -> Self {
		Self {
			ctx,
			viewer,
			config,
			state: RwLock::new(FeedState::default()),
		}
	}

	/// Re-fetches live goals not owned by the viewer.
	///
	/// Returns the number of live entries. Without a viewer nothing is
	/// fetched. On failure the previous live entries are kept.
	pub async fn refresh(&self) -> Result<usize> {
		let Some(viewer) = self.viewer else {
			debug!("feed refresh skipped, no viewer");
			return Ok(0);
		};

		let query = Query::new(Collection::Goals)
			.neq("user_id", viewer.to_string())
			.order_by("created_at", Direction::Descending)
			.limit(self.config.window);
		let rows = match self.ctx.call(self.ctx.backend().query(query)).await {
			Ok(rows) => rows,
			Err(err) => {
				warn!(%err, "feed refresh failed, keeping previous entries");
				return Err(err);
			}
		};

		let goals: Vec<Goal> = decode_rows(Collection::Goals, rows);
		let names = profiles::usernames(&self.ctx, goals.iter().map(|g| g.owner)).await;
		let live: Vec<FeedEntry> = goals
			.into_iter()
			.map(|goal| FeedEntry {
				author: names.get(&goal.owner).cloned(),
				goal,
			})
			.collect();

		let count = live.len();
		self.state.write().live = Some(live);
		debug!(live = count, "feed refreshed");
		Ok(count)
	}

	pub fn set_query(&self, query: &str) {
		self.state.write().query = query.to_owned();
	}

	pub fn query(&self) -> String {
		self.state.read().query.clone()
	}

	/// Whether at least one live fetch has succeeded.
	pub fn is_loaded(&self) -> bool {
		self.state.read().live.is_some()
	}

	/// Merged, deduplicated entries before filtering.
	pub fn entries(&self) -> Vec<FeedEntry> {
		let state = self.state.read();
		let live = state.live.clone().unwrap_or_default();
		let fill = self.config.supplemental && (state.live.is_none() || live.len() < self.config.fill_below);
		drop(state);

		if fill {
			merge([live, supplemental::entries()])
		} else {
			merge([live])
		}
	}

	/// Entries matching `query`, independent of the stored query.
	pub fn search(&self, query: &str) -> Vec<FeedEntry> {
		filter(&self.entries(), query).cloned().collect()
	}

	/// The feed filtered by the stored query.
	pub fn view(&self) -> FeedView {
		let query = self.query();
		let all = self.entries();
		let entries: Vec<FeedEntry> = filter(&all, &query).cloned().collect();

		let empty_state = match (entries.is_empty(), query.is_empty()) {
			(false, _) => None,
			(true, false) if !all.is_empty() => Some(EmptyState::NoMatches { query: query.clone() }),
			(true, _) => Some(EmptyState::NoGoals),
		};
		FeedView {
			query,
			entries,
			empty_state,
		}
	}
}
