//! The viewer's personal slate of active goals.
//!
//! A slate holds at most [`SLATE_CAPACITY`] incomplete goals. The backend
//! enforces the limit; the manager also checks its last known count before
//! submitting so an obviously full slate costs no round trip. Goals leave the
//! slate by completion or deletion, both terminal.


use cairn_backend::{Collection, Direction, Filter, Query, Row};
use cairn_primitives::{ActorId, Goal, GoalId, GoalState, NewGoal, SLATE_CAPACITY};
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::records::{decode_row, decode_rows, encode};
use crate::{Context, Error, Result};

/// Active goals plus the number of free slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlateView {
	/// Newest first.
	pub active: Vec<Goal>,
	pub empty_slots: usize,
}

impl SlateView {
	fn new(active: Vec<Goal>) -> Self {
		let empty_slots = SLATE_CAPACITY.saturating_sub(active.len());
		Self { active, empty_slots }
	}

	pub fn is_full(&self) -> bool {
		self.empty_slots == 0
	}
}

/// Owns the viewer's slate and its create/complete/delete intents.
#[derive(Debug)]
pub struct SlateManager {
	ctx: Context,
	owner: Option<ActorId>,
	/// `None` until the first successful refresh.
	active: RwLock<Option<Vec<Goal>>>,
}

impl SlateManager {
	pub fn new(ctx: Context, owner: Option<ActorId>) -> Self {
		Self {
			ctx,
			owner,
			active: RwLock::new(None),
		}
	}

	/// Re-fetches the owner's incomplete goals, newest first.
	///
	/// On failure the previous slate is kept.
	pub async fn refresh(&self) -> Result<usize> {
		let Some(owner) = self.owner else {
			return Ok(0);
		};

		let query = Query::new(Collection::Goals)
			.eq("user_id", owner.to_string())
			.eq("is_completed", false)
			.order_by("created_at", Direction::Descending);
		let rows = match self.ctx.call(self.ctx.backend().query(query)).await {
			Ok(rows) => rows,
			Err(err) => {
				warn!(%err, "slate refresh failed, keeping previous slate");
				return Err(err);
			}
		};

		let goals: Vec<Goal> = decode_rows(Collection::Goals, rows);
		let count = goals.len();
		*self.active.write() = Some(goals);
		debug!(active = count, "slate refreshed");
		Ok(count)
	}

	pub fn view(&self) -> SlateView {
		SlateView::new(self.active.read().clone().unwrap_or_default())
	}

	fn active_goal(&self, id: GoalId) -> Option<Goal> {
		self.active
			.read()
			.as_ref()
			.and_then(|goals| goals.iter().find(|g| g.id == id).cloned())
	}

	fn known_active(&self) -> Option<usize> {
		self.active.read().as_ref().map(Vec::len)
	}

	/// Creates a goal on the owner's slate.
	pub async fn create_goal(&self, title: &str, description: Option<&str>) -> Result<Goal> {
		let owner = self.owner.ok_or(Error::SignedOut)?;
		if title.trim().is_empty() {
			return Err(Error::Validation("goal title cannot be empty"));
		}
		if self.known_active().is_some_and(|n| n >= SLATE_CAPACITY) {
			debug!(%owner, "slate full, create rejected locally");
			return Err(self.report(Error::Capacity { limit: SLATE_CAPACITY }));
		}

		let record = encode(&NewGoal::new(owner, title, description))?;
		let stored = match self.ctx.call(self.ctx.backend().insert(Collection::Goals, record)).await {
			Ok(stored) => stored,
			Err(Error::Constraint { constraint }) => {
				debug!(%owner, %constraint, "create rejected by store");
				return Err(self.report(Error::Capacity { limit: SLATE_CAPACITY }));
			}
			Err(err) => return Err(self.report(err)),
		};

		let goal: Goal = decode_row(stored)?;
		self.refresh_after_write().await;
		self.ctx.notices().success("Goal created!");
		info!(goal = %goal.id, "goal created");
		Ok(goal)
	}

	/// Marks an active goal completed. Completed goals are permanent.
	pub async fn complete_goal(&self, id: GoalId) -> Result<()> {
		let owner = self.owner.ok_or(Error::SignedOut)?;
		self.current_state(owner, id).await?.transition(GoalState::Completed)?;

		let mut patch = Row::new();
		patch.insert("is_completed".into(), Value::Bool(true));
		patch.insert(
			"completed_at".into(),
			Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
		);
		let changed = self
			.ctx
			.call(self.ctx.backend().update(Collection::Goals, owned(owner, id), patch))
			.await
			.map_err(|err| self.report(err))?;
		if changed == 0 {
			return Err(Error::UnknownGoal(id));
		}

		self.refresh_after_write().await;
		self.ctx.notices().success("Goal completed! Written in stone forever!");
		info!(goal = %id, "goal completed");
		Ok(())
	}

	/// Permanently removes an active goal.
	pub async fn delete_goal(&self, id: GoalId) -> Result<()> {
		let owner = self.owner.ok_or(Error::SignedOut)?;
		self.current_state(owner, id).await?.transition(GoalState::Deleted)?;

		let removed = self
			.ctx
			.call(self.ctx.backend().delete(Collection::Goals, owned(owner, id)))
			.await
			.map_err(|err| self.report(err))?;
		if removed == 0 {
			return Err(Error::UnknownGoal(id));
		}

		self.refresh_after_write().await;
		self.ctx.notices().success("Goal removed");
		info!(goal = %id, "goal deleted");
		Ok(())
	}

	/// Lifecycle state of one of the owner's goals, from the slate when
	/// present, otherwise from the store.
	async fn current_state(&self, owner: ActorId, id: GoalId) -> Result<GoalState> {
		if let Some(goal) = self.active_goal(id) {
			return Ok(goal.state());
		}
		let query = Query::new(Collection::Goals)
			.eq("id", id.to_string())
			.eq("user_id", owner.to_string())
			.limit(1);
		let rows = self.ctx.call(self.ctx.backend().query(query)).await?;
		decode_rows::<Goal>(Collection::Goals, rows)
			.first()
			.map(Goal::state)
			.ok_or(Error::UnknownGoal(id))
	}

	async fn refresh_after_write(&self) {
		if let Err(err) = self.refresh().await {
			debug!(%err, "slate refresh after write failed");
		}
	}

	fn report(&self, err: Error) -> Error {
		self.ctx.notices().error(err.to_string());
		err
	}
}

fn owned(owner: ActorId, id: GoalId) -> Filter {
	Filter::new().eq("id", id.to_string()).eq("user_id", owner.to_string())
}
