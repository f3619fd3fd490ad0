//! One viewer session over a backend.

use std::sync::Arc;

use cairn_backend::Backend;
use cairn_config::Config;
use cairn_primitives::{ActorId, Comment, Goal, GoalId, Profile};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::bridge::{BridgeHandle, ChangeBridge, RefreshTarget};
use crate::engagement::{EdgeSnapshot, EngagementSnapshot, EngagementStore};
use crate::feed::{FeedComposer, FeedView};
use crate::mutation::{MutationCoordinator, Outcome};
use crate::notice::NoticeBoard;
use crate::slate::{SlateManager, SlateView};
use crate::{Context, Result, profiles};

/// Bundles the engagement store, mutation coordinator, feed, slate and
/// change bridge for one optional signed-in actor.
pub struct Client {
	ctx: Context,
	actor: Option<ActorId>,
	store: Arc<EngagementStore>,
	mutations: MutationCoordinator,
	feed: Arc<FeedComposer>,
	slate: Arc<SlateManager>,
	profile: RwLock<Option<Profile>>,
	bridge: Mutex<Option<BridgeHandle>>,
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("actor", &self.actor)
			.field("cached_goals", &self.store.len())
			.field("bridge", &self.bridge.lock().is_some())
			.finish_non_exhaustive()
	}
}

impl Client {
	pub fn new(backend: Arc<dyn Backend>, actor: Option<ActorId>, config: &Config) -> Self {
		let ctx = Context::new(backend, config.mutation.timeout());
		let store = Arc::new(EngagementStore::new(ctx.clone()));
		Self {
			mutations: MutationCoordinator::new(ctx.clone(), Arc::clone(&store)),
			feed: Arc::new(FeedComposer::new(ctx.clone(), actor, config.feed.clone())),
			slate: Arc::new(SlateManager::new(ctx.clone(), actor)),
			store,
			actor,
			ctx,
			profile: RwLock::new(None),
			bridge: Mutex::new(None),
		}
	}

	/// Loads the viewer's profile, fetches slate and feed, and starts
	/// following goal changes.
	///
	/// Fetch failures are logged and leave the views empty; failing to
	/// subscribe is returned.
	pub async fn start(&self) -> Result<()> {
		if let Some(actor) = self.actor {
			match profiles::fetch(&self.ctx, actor).await {
				Ok(profile) => *self.profile.write() = profile,
				Err(err) => warn!(%actor, %err, "profile load failed"),
			}
		}
		if let Err(err) = self.refresh().await {
			warn!(%err, "initial refresh incomplete");
		}

		let targets: Vec<Arc<dyn RefreshTarget>> = vec![self.slate.clone(), self.feed.clone()];
		let handle = ChangeBridge::start(&self.ctx, targets)?;
		// Replacing a previous handle stops its bridge.
		*self.bridge.lock() = Some(handle);
		debug!(actor = ?self.actor, "client started");
		Ok(())
	}

	/// Stops the change bridge.
	pub async fn shutdown(&self) {
		let handle = self.bridge.lock().take();
		if let Some(handle) = handle {
			handle.shutdown().await;
		}
	}

	/// Re-fetches slate and feed, returning the first failure.
	pub async fn refresh(&self) -> Result<()> {
		let (slate, feed) = tokio::join!(self.slate.refresh(), self.feed.refresh());
		slate.and(feed).map(drop)
	}

	/// Completed bridge refresh rounds, if the bridge is running.
	pub fn refresh_generation(&self) -> Option<u64> {
		self.bridge.lock().as_ref().map(BridgeHandle::generation)
	}

	/// Waits for the bridge to complete `min` refresh rounds.
	pub async fn wait_for_refresh(&self, min: u64) -> Option<u64> {
		let watcher = self.bridge.lock().as_ref().map(BridgeHandle::watcher);
		match watcher {
			Some(watcher) => Some(watcher.wait_for(min).await),
			None => None,
		}
	}

	pub const fn actor(&self) -> Option<ActorId> {
		self.actor
	}

	pub const fn context(&self) -> &Context {
		&self.ctx
	}

	pub fn profile(&self) -> Option<Profile> {
		self.profile.read().clone()
	}

	pub fn notices(&self) -> &NoticeBoard {
		self.ctx.notices()
	}

	pub fn slate(&self) -> SlateView {
		self.slate.view()
	}

	/// The filtered feed. Engagement for goals no longer shown is evicted.
	pub fn feed(&self) -> FeedView {
		let view = self.feed.view();
		self.store.retain(&view.ids());
		view
	}

	pub fn set_query(&self, query: &str) {
		self.feed.set_query(query);
	}

	pub fn engagement(&self, goal: GoalId) -> EngagementSnapshot {
		self.store.snapshot(goal)
	}

	/// Loads likes, follows and comments for a goal being shown.
	pub async fn open_goal(&self, goal: GoalId) -> EngagementSnapshot {
		self.store.load_all(goal, self.actor).await
	}

	/// Drops cached engagement for a goal no longer shown.
	pub fn close_goal(&self, goal: GoalId) {
		self.store.evict(goal);
	}

	pub fn set_draft(&self, goal: GoalId, text: &str) {
		self.store.set_draft(goal, text);
	}

	pub async fn create_goal(&self, title: &str, description: Option<&str>) -> Result<Goal> {
		self.slate.create_goal(title, description).await
	}

	pub async fn complete_goal(&self, goal: GoalId) -> Result<()> {
		self.slate.complete_goal(goal).await
	}

	pub async fn delete_goal(&self, goal: GoalId) -> Result<()> {
		self.slate.delete_goal(goal).await
	}

	pub async fn toggle_like(&self, goal: GoalId) -> Result<Outcome<EdgeSnapshot>> {
		self.mutations.toggle_like(goal, self.actor).await
	}

	pub async fn toggle_follow(&self, goal: GoalId) -> Result<Outcome<EdgeSnapshot>> {
		self.mutations.toggle_follow(goal, self.actor).await
	}

	pub async fn post_comment(&self, goal: GoalId, text: &str) -> Result<Outcome<Comment>> {
		self.mutations.post_comment(goal, self.actor, text).await
	}
}
