use std::collections::HashSet;

use cairn_backend::{Collection, Fault, MemoryBackend, Operation};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::*;

fn store(backend: &MemoryBackend) -> EngagementStore {
	EngagementStore::new(context(backend))
}

#[tokio::test]
async fn likes_count_edges_and_viewer_membership() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalLikes, goal, ALICE);
	seed_edge(&backend, Collection::GoalLikes, goal, BOB);
	seed_edge(&backend, Collection::GoalLikes, goal_id(2), CAROL);

	let store = store(&backend);
	let likes = store.load_likes(goal, Some(ALICE)).await;
	assert_eq!(likes.count, 2);
	assert!(likes.viewer_member);
	assert_eq!(likes.phase, MutationPhase::Idle);

	let likes = store.load_likes(goal, Some(CAROL)).await;
	assert!(!likes.viewer_member);

	let likes = store.load_likes(goal, None).await;
	assert_eq!(likes.count, 2);
	assert!(!likes.viewer_member);
}

#[tokio::test]
async fn follows_are_tracked_separately_from_likes() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalFollows, goal, BOB);

	let store = store(&backend);
	let follows = store.load_follows(goal, Some(BOB)).await;
	assert_eq!(follows.count, 1);
	assert!(follows.viewer_member);
	assert_eq!(store.edge_snapshot(goal, EdgeKind::Like), EdgeSnapshot::default());
}

#[tokio::test]
async fn failed_load_keeps_cached_state() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalLikes, goal, ALICE);

	let store = store(&backend);
	let before = store.load_likes(goal, Some(ALICE)).await;

	seed_edge(&backend, Collection::GoalLikes, goal, BOB);
	backend.inject(Collection::GoalLikes, Operation::Query, Fault::fail("offline"));
	let after = store.load_likes(goal, Some(ALICE)).await;

	assert_eq!(after, before);
	assert_eq!(store.snapshot(goal).likes.count, 1);
}

#[tokio::test]
async fn failed_first_load_creates_no_entry() {
	let backend = MemoryBackend::new();
	backend.inject(Collection::GoalLikes, Operation::Query, Fault::fail("offline"));

	let store = store(&backend);
	let likes = store.load_likes(goal_id(1), Some(ALICE)).await;
	assert_eq!(likes, EdgeSnapshot::default());
	assert!(!store.contains(goal_id(1)));
}

#[tokio::test]
async fn comments_load_newest_first_with_authors() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	seed_profile(&backend, ALICE, "alice");
	seed_comment(&backend, goal, ALICE, "first", "2025-01-10T08:00:00Z");
	seed_comment(&backend, goal, BOB, "second", "2025-01-12T08:00:00Z");
	seed_comment(&backend, goal_id(2), ALICE, "elsewhere", "2025-01-13T08:00:00Z");

	let store = store(&backend);
	let comments = store.load_comments(goal).await;

	let texts: Vec<_> = comments.iter().map(|c| c.comment.content.as_str()).collect();
	assert_eq!(texts, ["second", "first"]);
	assert_eq!(comments[0].author_label(), "anonymous");
	assert_eq!(comments[1].author_label(), "alice");
	assert_eq!(store.snapshot(goal).comment_count, 2);
}

#[tokio::test]
async fn comments_survive_profile_lookup_failure() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	seed_profile(&backend, ALICE, "alice");
	seed_comment(&backend, goal, ALICE, "hello", "2025-01-10T08:00:00Z");
	backend.inject(Collection::Profiles, Operation::Query, Fault::fail("offline"));

	let comments = store(&backend).load_comments(goal).await;
	assert_eq!(comments.len(), 1);
	assert_eq!(comments[0].author, None);
}

#[tokio::test]
async fn load_all_fills_every_field() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalLikes, goal, ALICE);
	seed_edge(&backend, Collection::GoalFollows, goal, BOB);
	seed_comment(&backend, goal, BOB, "go!", "2025-01-10T08:00:00Z");

	let snapshot = store(&backend).load_all(goal, Some(ALICE)).await;
	assert_eq!(snapshot.likes.count, 1);
	assert!(snapshot.likes.viewer_member);
	assert_eq!(snapshot.follows.count, 1);
	assert!(!snapshot.follows.viewer_member);
	assert_eq!(snapshot.comment_count, 1);
}

#[tokio::test]
async fn load_does_not_overwrite_pending_toggle() {
	let backend = MemoryBackend::new();
	let goal = goal_id(1);
	let store = store(&backend);
	store.load_likes(goal, Some(ALICE)).await;

	let pending = store.begin_toggle(goal, EdgeKind::Like).unwrap();
	assert!(pending.target);

	// Someone else's like lands while ours is in flight.
	seed_edge(&backend, Collection::GoalLikes, goal, BOB);
	let during = store.load_likes(goal, Some(ALICE)).await;
	assert_eq!(during.count, 1);
	assert!(during.viewer_member);
	assert_eq!(during.phase, MutationPhase::Pending);

	// Follow loads are unaffected by the pending like.
	seed_edge(&backend, Collection::GoalFollows, goal, BOB);
	assert_eq!(store.load_follows(goal, Some(ALICE)).await.count, 1);
}

#[test]
fn second_toggle_is_rejected_while_pending() {
	let store = store(&MemoryBackend::new());
	let goal = goal_id(1);
	let pending = store.begin_toggle(goal, EdgeKind::Like).unwrap();

	let err = store.begin_toggle(goal, EdgeKind::Like).unwrap_err();
	assert_eq!(err, Error::MutationPending { goal, kind: EdgeKind::Like });

	// Other kinds and goals are independent.
	assert!(store.begin_toggle(goal, EdgeKind::Follow).is_ok());
	assert!(store.begin_toggle(goal_id(2), EdgeKind::Like).is_ok());

	store.resolve_toggle(&pending, true);
	assert!(store.begin_toggle(goal, EdgeKind::Like).is_ok());
}

#[test]
fn rollback_restores_exact_prior_state() {
	let store = store(&MemoryBackend::new());
	let goal = goal_id(1);

	let first = store.begin_toggle(goal, EdgeKind::Like).unwrap();
	store.resolve_toggle(&first, true);
	assert_eq!(
		store.edge_snapshot(goal, EdgeKind::Like),
		EdgeSnapshot {
			count: 1,
			viewer_member: true,
			phase: MutationPhase::Committed,
		}
	);

	let second = store.begin_toggle(goal, EdgeKind::Like).unwrap();
	assert!(!second.target);
	assert_eq!(store.edge_snapshot(goal, EdgeKind::Like).count, 0);

	let resolved = store.resolve_toggle(&second, false);
	assert_eq!(
		resolved,
		EdgeSnapshot {
			count: 1,
			viewer_member: true,
			phase: MutationPhase::RolledBack,
		}
	);
}

#[test]
fn resolve_after_eviction_does_not_recreate_entry() {
	let store = store(&MemoryBackend::new());
	let goal = goal_id(1);
	let pending = store.begin_toggle(goal, EdgeKind::Follow).unwrap();
	store.evict(goal);

	let resolved = store.resolve_toggle(&pending, true);
	assert_eq!(resolved.phase, MutationPhase::Committed);
	assert!(!store.contains(goal));
}

#[tokio::test]
async fn retain_evicts_goals_outside_rendered_set() {
	let backend = MemoryBackend::new();
	let store = store(&backend);
	for n in 1..=3 {
		store.load_likes(goal_id(n), None).await;
	}
	assert_eq!(store.len(), 3);

	let rendered: HashSet<_> = [goal_id(1), goal_id(3)].into_iter().collect();
	store.retain(&rendered);
	assert!(store.contains(goal_id(1)));
	assert!(!store.contains(goal_id(2)));

	store.evict(goal_id(1));
	store.evict(goal_id(3));
	assert!(store.is_empty());
}

#[tokio::test]
async fn drafts_live_with_cached_entries() {
	let backend = MemoryBackend::new();
	let store = store(&backend);
	let goal = goal_id(1);

	store.set_draft(goal, "ignored");
	assert_eq!(store.draft(goal), "");

	store.load_comments(goal).await;
	store.set_draft(goal, "keep going");
	assert_eq!(store.snapshot(goal).draft, "keep going");

	store.evict(goal);
	assert_eq!(store.draft(goal), "");
}

#[tokio::test]
async fn edge_kinds_are_marked_loaded_independently() {
	let backend = MemoryBackend::new();
	let store = store(&backend);
	let goal = goal_id(1);

	store.load_comments(goal).await;
	assert!(store.contains(goal));
	assert!(!store.edge_loaded(goal, EdgeKind::Like));

	store.load_likes(goal, Some(ALICE)).await;
	assert!(store.edge_loaded(goal, EdgeKind::Like));
	assert!(!store.edge_loaded(goal, EdgeKind::Follow));

	store.evict(goal);
	assert!(!store.edge_loaded(goal, EdgeKind::Like));
}

#[tokio::test]
async fn failed_edge_fetch_leaves_kind_unloaded() {
	let backend = MemoryBackend::new();
	let store = store(&backend);
	let goal = goal_id(1);
	backend.inject(Collection::GoalFollows, Operation::Query, Fault::fail("offline"));

	assert!(store.fetch_edges(goal, EdgeKind::Follow, Some(ALICE)).await.is_err());
	assert!(!store.edge_loaded(goal, EdgeKind::Follow));
}
