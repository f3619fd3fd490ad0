//! In-process [`Backend`] implementation.
//!
//! Holds rows per collection, applies column defaults and generated fields
//! on insert, enforces registered [`Constraint`]s, fans change events out to
//! subscribers and supports fault injection for exercising failure paths.

mod fault;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
pub use fault::{Fault, Operation};
use fault::FaultPlan;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{Backend, ChangeEvent, ChangeOp, ChangeSender, Collection, Error, Filter, Query, Result, Row, Subscription};

/// Store-side rule checked on insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
	/// No two rows may share the same values for `fields`.
	Unique {
		name: String,
		collection: Collection,
		fields: Vec<String>,
	},
	/// At most `limit` rows per `owner_field` value may have a falsy `flag_field`.
	MaxActive {
		name: String,
		collection: Collection,
		owner_field: String,
		flag_field: String,
		limit: usize,
	},
}

impl Constraint {
	pub fn name(&self) -> &str {
		match self {
			Self::Unique { name, .. } | Self::MaxActive { name, .. } => name,
		}
	}

	pub const fn collection(&self) -> Collection {
		match self {
			Self::Unique { collection, .. } | Self::MaxActive { collection, .. } => *collection,
		}
	}

	fn admits(&self, existing: &[Row], candidate: &Row) -> bool {
		let null = Value::Null;
		let get = |row: &Row, field: &str| -> Value { row.get(field).unwrap_or(&null).clone() };
		match self {
			Self::Unique { fields, .. } => !existing
				.iter()
				.any(|row| fields.iter().all(|f| get(row, f) == get(candidate, f))),
			Self::MaxActive {
				owner_field,
				flag_field,
				limit,
				..
			} => {
				if is_truthy(&get(candidate, flag_field)) {
					return true;
				}
				let owner = get(candidate, owner_field);
				let active = existing
					.iter()
					.filter(|row| get(row, owner_field) == owner && !is_truthy(&get(row, flag_field)))
					.count();
				active < *limit
			}
		}
	}
}

fn is_truthy(value: &Value) -> bool {
	matches!(value, Value::Bool(true))
}

#[derive(Default)]
struct Tables {
	rows: HashMap<Collection, Vec<Row>>,
}

/// In-memory store with constraints, change fan-out and fault injection.
#[derive(Clone, Default)]
pub struct MemoryBackend {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	tables: RwLock<Tables>,
	constraints: RwLock<Vec<Constraint>>,
	defaults: RwLock<HashMap<Collection, Row>>,
	subscribers: Mutex<Vec<ChangeSender>>,
	faults: FaultPlan,
}

impl std::fmt::Debug for MemoryBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let tables = self.inner.tables.read();
		let sizes: HashMap<_, _> = tables.rows.iter().map(|(c, rows)| (*c, rows.len())).collect();
		f.debug_struct("MemoryBackend")
			.field("rows", &sizes)
			.field("constraints", &self.inner.constraints.read().len())
			.field("subscribers", &self.inner.subscribers.lock().len())
			.finish()
	}
}

impl MemoryBackend {
	/// Creates an empty store with no constraints.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store with the goal board's schema rules:
	/// one like/follow per actor and goal, unique profiles, and at most
	/// three incomplete goals per owner.
	pub fn with_standard_schema() -> Self {
		let backend = Self::new();
		for (name, collection) in [("goal_likes_goal_user_key", Collection::GoalLikes), ("goal_follows_goal_user_key", Collection::GoalFollows)] {
			backend.add_constraint(Constraint::Unique {
				name: name.into(),
				collection,
				fields: vec!["goal_id".into(), "user_id".into()],
			});
		}
		backend.add_constraint(Constraint::Unique {
			name: "profiles_pkey".into(),
			collection: Collection::Profiles,
			fields: vec!["id".into()],
		});
		backend.add_constraint(Constraint::MaxActive {
			name: "goals_active_limit".into(),
			collection: Collection::Goals,
			owner_field: "user_id".into(),
			flag_field: "is_completed".into(),
			limit: 3,
		});

		let mut goal_defaults = Row::new();
		goal_defaults.insert("description".into(), Value::Null);
		goal_defaults.insert("is_completed".into(), Value::Bool(false));
		goal_defaults.insert("completed_at".into(), Value::Null);
		backend.set_defaults(Collection::Goals, goal_defaults);
		backend
	}

	/// Registers an insert-time constraint.
	pub fn add_constraint(&self, constraint: Constraint) {
		self.inner.constraints.write().push(constraint);
	}

	/// Sets column defaults applied to inserted rows missing those fields.
	pub fn set_defaults(&self, collection: Collection, defaults: Row) {
		self.inner.defaults.write().insert(collection, defaults);
	}

	/// Loads rows verbatim, bypassing constraints and change events.
	pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Row>) {
		let mut tables = self.inner.tables.write();
		tables.rows.entry(collection).or_default().extend(rows);
	}

	/// Snapshot of every row in a collection, in insertion order.
	pub fn rows(&self, collection: Collection) -> Vec<Row> {
		self.inner
			.tables
			.read()
			.rows
			.get(&collection)
			.cloned()
			.unwrap_or_default()
	}

	/// Number of rows in a collection.
	pub fn len(&self, collection: Collection) -> usize {
		self.inner.tables.read().rows.get(&collection).map_or(0, Vec::len)
	}

	/// Returns true when the collection holds no rows.
	pub fn is_empty(&self, collection: Collection) -> bool {
		self.len(collection) == 0
	}

	/// Arms a fault for the next `operation` on `collection`.
	pub fn inject(&self, collection: Collection, operation: Operation, fault: Fault) {
		self.inner.faults.push(collection, operation, fault, Some(1));
	}

	/// Arms a fault for every subsequent `operation` on `collection` until cleared.
	pub fn inject_always(&self, collection: Collection, operation: Operation, fault: Fault) {
		self.inner.faults.push(collection, operation, fault, None);
	}

	/// Removes all armed faults.
	pub fn clear_faults(&self) {
		self.inner.faults.clear();
	}

	/// Number of live subscribers across all collections.
	pub fn subscriber_count(&self) -> usize {
		let mut subs = self.inner.subscribers.lock();
		subs.retain(|s| !s.is_closed());
		subs.len()
	}

	fn publish(&self, collection: Collection, operation: ChangeOp) {
		let event = ChangeEvent { collection, operation };
		let mut subs = self.inner.subscribers.lock();
		subs.retain(|s| s.collection() != collection || s.send(event));
		trace!(%collection, ?operation, subscribers = subs.len(), "memory_backend.publish");
	}

	fn prepare_insert(&self, collection: Collection, mut record: Row) -> Row {
		if let Some(defaults) = self.inner.defaults.read().get(&collection) {
			for (field, value) in defaults {
				record.entry(field.clone()).or_insert_with(|| value.clone());
			}
		}
		record
			.entry("id")
			.or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
		record
			.entry("created_at")
			.or_insert_with(|| Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));
		record
	}
}

#[async_trait]
impl Backend for MemoryBackend {
	async fn query(&self, query: Query) -> Result<Vec<Row>> {
		self.inner.faults.apply(query.collection, Operation::Query).await?;

		let tables = self.inner.tables.read();
		let mut matched: Vec<(usize, &Row)> = tables
			.rows
			.get(&query.collection)
			.map(|rows| rows.iter().enumerate().filter(|(_, r)| query.filter.matches(r)).collect())
			.unwrap_or_default();

		if let Some(order) = &query.order {
			// Ties resolve by insertion order in the requested direction.
			matched.sort_by(|(ia, a), (ib, b)| {
				order.compare(a, b).then_with(|| match order.direction {
					crate::Direction::Ascending => ia.cmp(ib),
					crate::Direction::Descending => ib.cmp(ia),
				})
			});
		}

		let limit = query.limit.unwrap_or(usize::MAX);
		let rows: Vec<Row> = matched.into_iter().take(limit).map(|(_, r)| r.clone()).collect();
		trace!(collection = %query.collection, rows = rows.len(), "memory_backend.query");
		Ok(rows)
	}

	async fn insert(&self, collection: Collection, record: Row) -> Result<Row> {
		self.inner.faults.apply(collection, Operation::Insert).await?;

		let record = self.prepare_insert(collection, record);
		{
			let mut tables = self.inner.tables.write();
			let existing = tables.rows.entry(collection).or_default();
			let constraints = self.inner.constraints.read();
			if let Some(violated) = constraints
				.iter()
				.filter(|c| c.collection() == collection)
				.find(|c| !c.admits(existing, &record))
			{
				debug!(%collection, constraint = violated.name(), "memory_backend.insert rejected");
				return Err(Error::ConstraintViolation {
					constraint: violated.name().to_owned(),
				});
			}
			existing.push(record.clone());
		}

		self.publish(collection, ChangeOp::Insert);
		Ok(record)
	}

	async fn update(&self, collection: Collection, filter: Filter, patch: Row) -> Result<usize> {
		self.inner.faults.apply(collection, Operation::Update).await?;

		let changed = {
			let mut tables = self.inner.tables.write();
			let mut changed = 0;
			for row in tables.rows.entry(collection).or_default().iter_mut() {
				if filter.matches(row) {
					for (field, value) in &patch {
						row.insert(field.clone(), value.clone());
					}
					changed += 1;
				}
			}
			changed
		};

		if changed > 0 {
			self.publish(collection, ChangeOp::Update);
		}
		Ok(changed)
	}

	async fn delete(&self, collection: Collection, filter: Filter) -> Result<usize> {
		self.inner.faults.apply(collection, Operation::Delete).await?;

		let removed = {
			let mut tables = self.inner.tables.write();
			let rows = tables.rows.entry(collection).or_default();
			let before = rows.len();
			rows.retain(|row| !filter.matches(row));
			before - rows.len()
		};

		if removed > 0 {
			self.publish(collection, ChangeOp::Delete);
		}
		Ok(removed)
	}

	fn subscribe(&self, collection: Collection) -> Result<Subscription> {
		if let Some(fault) = self.inner.faults.take(collection, Operation::Subscribe) {
			return Err(fault.into_error());
		}
		let (sender, subscription) = Subscription::channel(collection);
		self.inner.subscribers.lock().push(sender);
		debug!(%collection, "memory_backend.subscribe");
		Ok(subscription)
	}
}
