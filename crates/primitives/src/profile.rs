use serde::{Deserialize, Serialize};

use crate::ActorId;

/// Public profile of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	pub id: ActorId,
	pub username: String,
	#[serde(default)]
	pub avatar_url: Option<String>,
}
