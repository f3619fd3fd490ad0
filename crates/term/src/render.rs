//! Plain-text rendering of views and notices.

use std::fmt::Write as _;

use cairn_core::{EdgeSnapshot, EngagementSnapshot, FeedView, MutationPhase, Notice, NoticeLevel, SlateView};
use cairn_primitives::{Goal, SLATE_CAPACITY, Timestamp};

pub fn slate(view: &SlateView) -> String {
	let mut out = format!("Your slate ({}/{SLATE_CAPACITY})\n", view.active.len());
	for goal in &view.active {
		goal_line(&mut out, goal);
	}
	for _ in 0..view.empty_slots {
		out.push_str("  ( open slot )\n");
	}
	out
}

pub fn feed(view: &FeedView, now: Timestamp) -> String {
	let mut out = String::new();
	if !view.query.is_empty() {
		let _ = writeln!(out, "Search: {}", view.query);
	}
	if let Some(empty) = &view.empty_state {
		let _ = writeln!(out, "{empty}");
		return out;
	}
	for entry in &view.entries {
		let status = if entry.goal.is_completed { " [done]" } else { "" };
		let _ = writeln!(
			out,
			"{} by @{}, {}{status}",
			entry.goal.title,
			entry.author_name(),
			entry.age_label(now)
		);
		if let Some(description) = entry.goal.description.as_deref() {
			let _ = writeln!(out, "    {description}");
		}
		let _ = writeln!(out, "    id {}", entry.id());
	}
	out
}

/// Counts, viewer membership and comments for one goal.
pub fn engagement(snapshot: &EngagementSnapshot) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "{}", edge("like", "likes", &snapshot.likes));
	let _ = writeln!(out, "{}", edge("follower", "followers", &snapshot.follows));
	let _ = writeln!(out, "{} comment(s)", snapshot.comment_count);
	for entry in &snapshot.comments {
		let _ = writeln!(out, "  @{}: {}", entry.author_label(), entry.comment.content);
	}
	out
}

fn edge(one: &str, many: &str, snapshot: &EdgeSnapshot) -> String {
	let noun = if snapshot.count == 1 { one } else { many };
	let mut line = format!("{} {noun}", snapshot.count);
	if snapshot.viewer_member {
		line.push_str(" (including you)");
	}
	if snapshot.phase == MutationPhase::RolledBack {
		line.push_str(" [reverted]");
	}
	line
}

pub fn notices(notices: &[Notice]) -> String {
	notices
		.iter()
		.map(|notice| {
			let tag = match notice.level {
				NoticeLevel::Success => "ok",
				NoticeLevel::Info => "info",
				NoticeLevel::Error => "error",
			};
			format!("[{tag}] {}\n", notice.message)
		})
		.collect()
}

fn goal_line(out: &mut String, goal: &Goal) {
	let _ = writeln!(out, "  * {}", goal.title);
	if let Some(description) = goal.description.as_deref() {
		let _ = writeln!(out, "    {description}");
	}
	let _ = writeln!(out, "    id {}", goal.id);
}
