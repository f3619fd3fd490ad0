use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{Collection, Error, Result};

/// Backend call kinds a fault can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	Query,
	Insert,
	Update,
	Delete,
	Subscribe,
}

/// Injected misbehavior for one backend call.
#[derive(Debug, Clone)]
pub enum Fault {
	/// Fail with a transport error carrying the message.
	Fail(String),
	/// Fail with a constraint violation of the named constraint.
	Reject(String),
	/// Never resolve.
	Stall,
	/// Wait until the gate is notified, then proceed normally.
	Gate(Arc<Notify>),
}

impl Fault {
	/// Shorthand for a transport failure.
	pub fn fail(message: impl Into<String>) -> Self {
		Self::Fail(message.into())
	}

	pub(crate) fn into_error(self) -> Error {
		match self {
			Self::Fail(message) => Error::Transport(message),
			Self::Reject(constraint) => Error::ConstraintViolation { constraint },
			Self::Stall | Self::Gate(_) => Error::Transport("subscription unavailable".into()),
		}
	}
}

struct Armed {
	collection: Collection,
	operation: Operation,
	fault: Fault,
	remaining: Option<usize>,
}

#[derive(Default)]
pub(super) struct FaultPlan {
	armed: Mutex<Vec<Armed>>,
}

impl FaultPlan {
	pub(super) fn push(&self, collection: Collection, operation: Operation, fault: Fault, remaining: Option<usize>) {
		self.armed.lock().push(Armed {
			collection,
			operation,
			fault,
			remaining,
		});
	}

	pub(super) fn clear(&self) {
		self.armed.lock().clear();
	}

	/// Takes the first fault armed for this call, consuming one use.
	pub(super) fn take(&self, collection: Collection, operation: Operation) -> Option<Fault> {
		let mut armed = self.armed.lock();
		let idx = armed
			.iter()
			.position(|a| a.collection == collection && a.operation == operation)?;
		let fault = armed[idx].fault.clone();
		match armed[idx].remaining {
			Some(n) if n <= 1 => {
				armed.remove(idx);
			}
			Some(n) => armed[idx].remaining = Some(n - 1),
			None => {}
		}
		Some(fault)
	}

	/// Applies any armed fault to an in-flight call.
	pub(super) async fn apply(&self, collection: Collection, operation: Operation) -> Result<()> {
		let Some(fault) = self.take(collection, operation) else {
			return Ok(());
		};
		tracing::debug!(%collection, ?operation, ?fault, "memory_backend.fault");
		match fault {
			Fault::Gate(gate) => {
				gate.notified().await;
				Ok(())
			}
			Fault::Stall => std::future::pending().await,
			other => Err(other.into_error()),
		}
	}
}
