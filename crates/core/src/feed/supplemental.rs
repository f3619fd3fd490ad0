//! Built-in example goals shown while the live community feed is empty or sparse.

use cairn_primitives::{ActorId, Goal, GoalId, Timestamp};

use super::FeedEntry;

struct Example {
	id: u128,
	owner: u128,
	author: &'static str,
	title: &'static str,
	description: &'static str,
	created_at: i64,
}

const EXAMPLES: [Example; 9] = [
	Example {
		id: 1,
		owner: 0x101,
		author: "sarah_chen",
		title: "Run a marathon",
		description: "Training for my first marathon in 6 months",
		created_at: 1_736_935_200,
	},
	Example {
		id: 2,
		owner: 0x101,
		author: "sarah_chen",
		title: "Learn Spanish",
		description: "Practice 30 minutes daily with Duolingo",
		created_at: 1_736_868_600,
	},
	Example {
		id: 3,
		owner: 0x102,
		author: "mike_rodriguez",
		title: "Launch my startup",
		description: "Working on a sustainable fashion brand",
		created_at: 1_736_758_800,
	},
	Example {
		id: 4,
		owner: 0x102,
		author: "mike_rodriguez",
		title: "Read 52 books",
		description: "One book per week this year",
		created_at: 1_736_707_500,
	},
	Example {
		id: 5,
		owner: 0x103,
		author: "emma_johnson",
		title: "Master piano",
		description: "Learning Chopin nocturnes",
		created_at: 1_736_605_200,
	},
	Example {
		id: 6,
		owner: 0x104,
		author: "alex_kumar",
		title: "Build a SaaS product",
		description: "Creating a project management tool",
		created_at: 1_736_506_800,
	},
	Example {
		id: 7,
		owner: 0x104,
		author: "alex_kumar",
		title: "Get fit",
		description: "Gym 4x per week and meal prep",
		created_at: 1_736_411_400,
	},
	Example {
		id: 8,
		owner: 0x105,
		author: "lisa_park",
		title: "Travel to 10 countries",
		description: "Exploring Europe this summer",
		created_at: 1_736_352_000,
	},
	Example {
		id: 9,
		owner: 0x105,
		author: "lisa_park",
		title: "Write a novel",
		description: "50,000 words by end of year",
		created_at: 1_736_255_700,
	},
];

/// The example entries, newest first, with stable synthetic ids.
pub fn entries() -> Vec<FeedEntry> {
	EXAMPLES
		.iter()
		.map(|ex| FeedEntry {
			goal: Goal {
				id: GoalId::from_u128(ex.id),
				owner: ActorId::from_u128(ex.owner),
				title: ex.title.to_owned(),
				description: Some(ex.description.to_owned()),
				is_completed: false,
				created_at: Timestamp::from_timestamp(ex.created_at, 0).unwrap_or_default(),
				completed_at: None,
			},
			author: Some(ex.author.to_owned()),
		})
		.collect()
}
