//! Error taxonomy surfaced to the presentation layer.

use std::time::Duration;

use cairn_primitives::{EdgeKind, GoalId, TransitionError};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad failure classes, each with its own user-facing treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The store was unreachable or the call failed in transit. Prior state is retained.
	Transport,
	/// A business rule rejected the change.
	Constraint,
	/// Input was rejected locally; no remote call was made.
	Validation,
	/// Another mutation on the same target is still in flight.
	Conflict,
}

/// Failures returned by intents and refreshes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("network error: {0}")]
	Transport(String),
	#[error("no response within {0:?}")]
	TimedOut(Duration),
	#[error("unexpected data from the server: {0}")]
	Decode(String),
	#[error("You can only have {limit} active goals at a time")]
	Capacity { limit: usize },
	#[error("rejected by the server ({constraint})")]
	Constraint { constraint: String },
	#[error("{0}")]
	Validation(&'static str),
	#[error("sign in to do that")]
	SignedOut,
	#[error("goal {0} is not on your slate")]
	UnknownGoal(GoalId),
	#[error(transparent)]
	InvalidTransition(#[from] TransitionError),
	#[error("a {} change for goal {goal} is still in progress", .kind.as_str())]
	MutationPending { goal: GoalId, kind: EdgeKind },
}

impl Error {
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Transport(_) | Self::TimedOut(_) | Self::Decode(_) => ErrorKind::Transport,
			Self::Capacity { .. } | Self::Constraint { .. } => ErrorKind::Constraint,
			Self::Validation(_) | Self::SignedOut | Self::UnknownGoal(_) | Self::InvalidTransition(_) => ErrorKind::Validation,
			Self::MutationPending { .. } => ErrorKind::Conflict,
		}
	}
}

impl From<cairn_backend::Error> for Error {
	fn from(err: cairn_backend::Error) -> Self {
		match err {
			cairn_backend::Error::ConstraintViolation { constraint } => Self::Constraint { constraint },
			cairn_backend::Error::InvalidRecord(reason) => Self::Decode(reason),
			other => Self::Transport(other.to_string()),
		}
	}
}
