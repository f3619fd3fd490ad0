use std::sync::Arc;
use std::time::Duration;

use cairn_backend::{Collection, Fault, MemoryBackend, Operation};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tokio::sync::Notify;

use super::*;
use crate::engagement::MutationPhase;
use crate::notice::NoticeLevel;
use crate::test_support::*;

fn coordinator(backend: &MemoryBackend) -> MutationCoordinator {
	let ctx = context(backend);
	MutationCoordinator::new(ctx.clone(), Arc::new(EngagementStore::new(ctx)))
}

fn like_rows(backend: &MemoryBackend, goal: GoalId) -> usize {
	backend
		.rows(Collection::GoalLikes)
		.iter()
		.filter(|r| r["goal_id"] == goal.to_string().as_str())
		.count()
}

#[tokio::test]
async fn toggle_without_actor_is_skipped() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);

	let outcome = coordinator.toggle_like(goal_id(1), None).await.unwrap();
	assert!(outcome.is_skipped());
	assert!(backend.is_empty(Collection::GoalLikes));
	assert!(!coordinator.store().contains(goal_id(1)));
}

#[tokio::test]
async fn like_then_unlike_round_trips() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);

	let liked = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap().applied().unwrap();
	assert_eq!(
		liked,
		EdgeSnapshot {
			count: 1,
			viewer_member: true,
			phase: MutationPhase::Committed,
		}
	);
	assert_eq!(like_rows(&backend, goal), 1);

	let unliked = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap().applied().unwrap();
	assert_eq!(unliked.count, 0);
	assert!(!unliked.viewer_member);
	assert_eq!(like_rows(&backend, goal), 0);
}

#[tokio::test]
async fn failed_unlike_rolls_back_to_liked() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);

	coordinator.toggle_like(goal, Some(ALICE)).await.unwrap();
	backend.inject(Collection::GoalLikes, Operation::Delete, Fault::fail("offline"));

	let err = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap_err();
	assert_eq!(err.kind(), crate::ErrorKind::Transport);

	let state = coordinator.store().edge_snapshot(goal, EdgeKind::Like);
	assert_eq!((state.count, state.viewer_member), (1, true));
	assert_eq!(state.phase, MutationPhase::RolledBack);
	assert_eq!(like_rows(&backend, goal), 1);

	let notice = coordinator.ctx.notices().latest().unwrap();
	assert_eq!(notice.level, NoticeLevel::Error);
}

#[tokio::test]
async fn failed_like_restores_prior_count() {
	let backend = MemoryBackend::with_standard_schema();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalLikes, goal, BOB);
	seed_edge(&backend, Collection::GoalLikes, goal, CAROL);

	let coordinator = coordinator(&backend);
	let before = coordinator.store().load_likes(goal, Some(ALICE)).await;
	backend.inject(Collection::GoalLikes, Operation::Insert, Fault::fail("offline"));

	assert!(coordinator.toggle_like(goal, Some(ALICE)).await.is_err());
	let after = coordinator.store().edge_snapshot(goal, EdgeKind::Like);
	assert_eq!((after.count, after.viewer_member), (before.count, before.viewer_member));
}

#[tokio::test]
async fn uncached_goal_loads_membership_before_toggling() {
	let backend = MemoryBackend::with_standard_schema();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalLikes, goal, ALICE);

	let coordinator = coordinator(&backend);
	let state = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap().applied().unwrap();
	assert_eq!((state.count, state.viewer_member), (0, false));
	assert_eq!(like_rows(&backend, goal), 0);
}

fn follow_rows(backend: &MemoryBackend, goal: GoalId) -> usize {
	backend
		.rows(Collection::GoalFollows)
		.iter()
		.filter(|r| r["goal_id"] == goal.to_string().as_str())
		.count()
}

#[tokio::test]
async fn follow_after_like_loads_follow_edges() {
	let backend = MemoryBackend::with_standard_schema();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalFollows, goal, BOB);
	seed_edge(&backend, Collection::GoalFollows, goal, CAROL);

	let coordinator = coordinator(&backend);
	coordinator.toggle_like(goal, Some(ALICE)).await.unwrap();
	let state = coordinator.toggle_follow(goal, Some(ALICE)).await.unwrap().applied().unwrap();
	assert_eq!((state.count, state.viewer_member), (3, true));
	assert_eq!(follow_rows(&backend, goal), 3);
}

#[tokio::test]
async fn like_after_comment_load_starts_from_server_membership() {
	let backend = MemoryBackend::with_standard_schema();
	let goal = goal_id(1);
	seed_edge(&backend, Collection::GoalLikes, goal, ALICE);

	let coordinator = coordinator(&backend);
	coordinator.store().load_comments(goal).await;
	let state = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap().applied().unwrap();
	assert_eq!((state.count, state.viewer_member), (0, false));
	assert_eq!(like_rows(&backend, goal), 0);
}

#[tokio::test]
async fn toggle_with_unknown_membership_is_not_applied() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	coordinator.store().load_comments(goal).await;
	backend.inject(Collection::GoalLikes, Operation::Query, Fault::fail("offline"));

	let err = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap_err();
	assert_eq!(err.kind(), crate::ErrorKind::Transport);
	assert_eq!(like_rows(&backend, goal), 0);
	assert_eq!(coordinator.store().edge_snapshot(goal, EdgeKind::Like), EdgeSnapshot::default());
	assert_eq!(coordinator.ctx.notices().latest().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn duplicate_like_on_server_counts_as_committed() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	coordinator.store().load_likes(goal, Some(ALICE)).await;

	// Liked from another session after our load.
	seed_edge(&backend, Collection::GoalLikes, goal, ALICE);
	let state = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap().applied().unwrap();
	assert!(state.viewer_member);
	assert_eq!(like_rows(&backend, goal), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_mutation_times_out_and_rolls_back() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	backend.inject(Collection::GoalFollows, Operation::Insert, Fault::Stall);

	let err = coordinator.toggle_follow(goal, Some(ALICE)).await.unwrap_err();
	assert_eq!(err, Error::TimedOut(Duration::from_secs(10)));

	let state = coordinator.store().edge_snapshot(goal, EdgeKind::Follow);
	assert_eq!((state.count, state.viewer_member), (0, false));
	assert_eq!(state.phase, MutationPhase::RolledBack);
}

#[tokio::test]
async fn concurrent_toggle_on_same_goal_is_rejected() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	let gate = Arc::new(Notify::new());
	backend.inject(Collection::GoalLikes, Operation::Insert, Fault::Gate(Arc::clone(&gate)));

	let first = tokio::spawn({
		let coordinator = coordinator.clone();
		async move { coordinator.toggle_like(goal, Some(ALICE)).await }
	});
	while coordinator.store().edge_snapshot(goal, EdgeKind::Like).phase != MutationPhase::Pending {
		tokio::task::yield_now().await;
	}

	let err = coordinator.toggle_like(goal, Some(ALICE)).await.unwrap_err();
	assert_eq!(err, Error::MutationPending { goal, kind: EdgeKind::Like });

	// A different goal proceeds independently.
	assert!(coordinator.toggle_like(goal_id(2), Some(ALICE)).await.is_ok());

	gate.notify_one();
	let state = first.await.unwrap().unwrap().applied().unwrap();
	assert_eq!((state.count, state.viewer_member), (1, true));
}

#[tokio::test]
async fn follow_posts_direction_specific_notices() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);

	coordinator.toggle_follow(goal, Some(ALICE)).await.unwrap();
	assert_eq!(coordinator.ctx.notices().latest().unwrap().message, "Now following this goal");

	coordinator.toggle_follow(goal, Some(ALICE)).await.unwrap();
	assert_eq!(coordinator.ctx.notices().latest().unwrap().message, "Stopped following this goal");
}

#[tokio::test]
async fn blank_comment_is_rejected_locally() {
	let backend = MemoryBackend::with_standard_schema();
	backend.inject_always(Collection::GoalComments, Operation::Insert, Fault::fail("must not be called"));
	let coordinator = coordinator(&backend);

	let err = coordinator.post_comment(goal_id(1), Some(ALICE), "   ").await.unwrap_err();
	assert_eq!(err, Error::Validation("comment cannot be empty"));
	assert!(coordinator.ctx.notices().is_empty());
}

#[tokio::test]
async fn comment_without_actor_is_skipped() {
	let backend = MemoryBackend::with_standard_schema();
	let outcome = coordinator(&backend).post_comment(goal_id(1), None, "hi").await.unwrap();
	assert!(outcome.is_skipped());
	assert!(backend.is_empty(Collection::GoalComments));
}

#[tokio::test]
async fn posted_comment_clears_draft_and_reloads() {
	let backend = MemoryBackend::with_standard_schema();
	seed_profile(&backend, ALICE, "alice");
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	coordinator.store().load_comments(goal).await;
	coordinator.store().set_draft(goal, " You got this ");

	let comment = coordinator
		.post_comment(goal, Some(ALICE), " You got this ")
		.await
		.unwrap()
		.applied()
		.unwrap();
	assert_eq!(comment.content, "You got this");

	let snapshot = coordinator.store().snapshot(goal);
	assert_eq!(snapshot.draft, "");
	assert_eq!(snapshot.comment_count, 1);
	assert_eq!(snapshot.comments[0].author_label(), "alice");
	assert_eq!(coordinator.ctx.notices().latest().unwrap().message, "Comment added!");
}

#[tokio::test]
async fn failed_comment_keeps_draft() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	coordinator.store().load_comments(goal).await;
	backend.inject(Collection::GoalComments, Operation::Insert, Fault::fail("offline"));

	assert!(coordinator.post_comment(goal, Some(ALICE), "Keep going").await.is_err());
	assert_eq!(coordinator.store().draft(goal), "Keep going");
	assert_eq!(coordinator.store().snapshot(goal).comment_count, 0);

	let notice = coordinator.ctx.notices().latest().unwrap();
	assert_eq!((notice.level, notice.message.as_str()), (NoticeLevel::Error, "Failed to add comment"));
}

#[tokio::test]
async fn failed_comment_on_unopened_goal_keeps_draft() {
	let backend = MemoryBackend::with_standard_schema();
	let coordinator = coordinator(&backend);
	let goal = goal_id(1);
	backend.inject(Collection::GoalComments, Operation::Insert, Fault::fail("offline"));

	assert!(coordinator.post_comment(goal, Some(ALICE), "Go go").await.is_err());
	assert_eq!(coordinator.store().draft(goal), "Go go");
}

proptest! {
	#[test]
	fn like_count_matches_edges_at_quiescence(steps in prop::collection::vec((0u128..3, any::<bool>()), 1..24)) {
		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_time()
			.build()
			.unwrap();
		runtime.block_on(async {
			let backend = MemoryBackend::with_standard_schema();
			let coordinator = coordinator(&backend);

			for (goal, fail) in &steps {
				let goal = goal_id(*goal);
				if *fail {
					for op in [Operation::Insert, Operation::Delete] {
						backend.inject(Collection::GoalLikes, op, Fault::fail("offline"));
					}
				}
				let _ = coordinator.toggle_like(goal, Some(ALICE)).await;
				backend.clear_faults();
			}

			for n in 0..3 {
				let goal = goal_id(n);
				let cached = coordinator.store().edge_snapshot(goal, EdgeKind::Like);
				let rows = like_rows(&backend, goal);
				prop_assert_eq!(cached.count, rows);
				prop_assert_eq!(cached.viewer_member, rows == 1);
			}
			Ok::<(), TestCaseError>(())
		})?;
	}
}
