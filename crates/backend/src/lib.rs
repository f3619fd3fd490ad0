//! Backend store abstraction for cairn.
//!
//! The relational store and its push-change service are external
//! collaborators. This crate defines the interface the engagement engine
//! consumes from them:
//!
//! - [`Backend`]: `query`/`insert`/`update`/`delete` on named [`Collection`]s
//!   with predicate [`Filter`]s, ordering and limits, plus
//!   [`Backend::subscribe`] for change events.
//! - [`Subscription`]: a cancellable stream of [`ChangeEvent`]s.
//! - [`MemoryBackend`]: an in-process implementation with the product's
//!   constraints, used as a test double and by the CLI driver.

pub mod memory;
pub mod query;
pub mod subscription;

use async_trait::async_trait;

pub use memory::{Constraint, Fault, MemoryBackend, Operation};
pub use query::{Collection, Direction, Filter, Order, Predicate, Query, Row};
pub use subscription::{ChangeEvent, ChangeOp, ChangeSender, Subscription};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The store could not be reached or the call failed in transit.
	#[error("transport failure: {0}")]
	Transport(String),
	/// A write was rejected by a store-side constraint.
	#[error("constraint violated: {constraint}")]
	ConstraintViolation {
		/// Name of the violated constraint.
		constraint: String,
	},
	/// The submitted record was not an object or could not be encoded.
	#[error("invalid record: {0}")]
	InvalidRecord(String),
	/// The change subscription was closed by the store.
	#[error("subscription closed")]
	Closed,
}

impl Error {
	/// Returns true when the store rejected the write on a business rule.
	pub const fn is_constraint_violation(&self) -> bool {
		matches!(self, Self::ConstraintViolation { .. })
	}
}

/// CRUD and change-subscription interface of the remote store.
///
/// Every call either yields a result or a failure; implementations must not
/// report both. Change events are delivered at least once, with no ordering
/// guarantee across distinct rows.
#[async_trait]
pub trait Backend: Send + Sync {
	/// Selects rows matching the query.
	async fn query(&self, query: Query) -> Result<Vec<Row>>;

	/// Inserts one record and returns the stored row, including generated fields.
	async fn insert(&self, collection: Collection, record: Row) -> Result<Row>;

	/// Applies `patch` to every row matching `filter`, returning the number of rows changed.
	async fn update(&self, collection: Collection, filter: Filter, patch: Row) -> Result<usize>;

	/// Deletes every row matching `filter`, returning the number of rows removed.
	async fn delete(&self, collection: Collection, filter: Filter) -> Result<usize>;

	/// Subscribes to change events on a collection.
	fn subscribe(&self, collection: Collection) -> Result<Subscription>;
}
