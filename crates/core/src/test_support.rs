//! Fixtures shared by the unit tests.

use std::sync::Arc;
use std::time::Duration;

use cairn_backend::{Collection, MemoryBackend, Row};
use cairn_primitives::{ActorId, CommentId, GoalId};
use serde_json::{Value, json};

use crate::Context;

pub const ALICE: ActorId = ActorId::from_u128(0xa1);
pub const BOB: ActorId = ActorId::from_u128(0xb0);
pub const CAROL: ActorId = ActorId::from_u128(0xc0);

pub const fn goal_id(n: u128) -> GoalId {
	GoalId::from_u128(0x6000 + n)
}

pub fn row(value: Value) -> Row {
	match value {
		Value::Object(map) => map,
		other => panic!("expected object, got {other}"),
	}
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn context(backend: &MemoryBackend) -> Context {
	init_tracing();
	Context::new(Arc::new(backend.clone()), Duration::from_secs(10))
}

pub fn seed_profile(backend: &MemoryBackend, actor: ActorId, username: &str) {
	backend.seed(
		Collection::Profiles,
		[row(json!({ "id": actor.to_string(), "username": username }))],
	);
}

pub fn seed_goal(backend: &MemoryBackend, id: GoalId, owner: ActorId, title: &str, created_at: &str) {
	backend.seed(
		Collection::Goals,
		[row(json!({
			"id": id.to_string(),
			"user_id": owner.to_string(),
			"title": title,
			"description": null,
			"is_completed": false,
			"created_at": created_at,
			"completed_at": null,
		}))],
	);
}

pub fn seed_edge(backend: &MemoryBackend, collection: Collection, goal: GoalId, actor: ActorId) {
	backend.seed(
		collection,
		[row(json!({ "goal_id": goal.to_string(), "user_id": actor.to_string() }))],
	);
}

pub fn seed_comment(backend: &MemoryBackend, goal: GoalId, author: ActorId, content: &str, created_at: &str) {
	backend.seed(
		Collection::GoalComments,
		[row(json!({
			"id": comment_id(content).to_string(),
			"goal_id": goal.to_string(),
			"user_id": author.to_string(),
			"content": content,
			"created_at": created_at,
		}))],
	);
}

fn comment_id(content: &str) -> CommentId {
	let n = content.bytes().fold(0u128, |acc, b| acc.wrapping_mul(31).wrapping_add(u128::from(b)));
	CommentId::from_u128(n)
}
