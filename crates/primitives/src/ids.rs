use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Generates a fresh random identifier.
			pub fn new() -> Self {
				Self(Uuid::new_v4())
			}

			/// Wraps an existing UUID.
			pub const fn from_uuid(uuid: Uuid) -> Self {
				Self(uuid)
			}

			/// Builds a stable identifier from a small integer, used for fixture data.
			pub const fn from_u128(value: u128) -> Self {
				Self(Uuid::from_u128(value))
			}

			/// Returns the underlying UUID.
			pub const fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl Default for $name {
			fn default() -> Self {
				Self::new()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				self.0.fmt(f)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id!(
	/// Identifier of a goal row.
	GoalId
);
define_id!(
	/// Opaque identifier of a signed-in actor.
	ActorId
);
define_id!(
	/// Identifier of a comment row.
	CommentId
);
