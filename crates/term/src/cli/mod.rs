//! CLI schema and parsing helpers for the cairn binary.


use std::path::PathBuf;

use cairn_primitives::GoalId;
use clap::{Parser, Subcommand};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(about = "Commit to three goals, cheer on everyone else's")]
#[command(version)]
pub struct Cli {
	/// Configuration file (defaults to the platform config dir)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Username to act as
	#[arg(long, short = 'a', value_name = "NAME", default_value = "you", global = true)]
	pub actor: String,

	/// Browse signed out
	#[arg(long, conflicts_with = "actor", global = true)]
	pub guest: bool,

	/// JSON file mapping collection names to rows, loaded into the store
	#[arg(long, value_name = "FILE", global = true)]
	pub seed: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// Show the community feed
	Feed {
		/// Only goals whose author, title or description contains this
		#[arg(long, short = 'q')]
		query: Option<String>,
	},
	/// Show your active goals
	Slate,
	/// Add a goal to your slate
	Create {
		#[arg(long, short = 't')]
		title: String,
		#[arg(long, short = 'd')]
		description: Option<String>,
	},
	/// Mark a goal completed
	Complete {
		#[arg(value_parser = parse_goal_id)]
		goal: GoalId,
	},
	/// Remove a goal from your slate
	Delete {
		#[arg(value_parser = parse_goal_id)]
		goal: GoalId,
	},
	/// Like or unlike a goal
	Like {
		#[arg(value_parser = parse_goal_id)]
		goal: GoalId,
	},
	/// Follow or unfollow a goal
	Follow {
		#[arg(value_parser = parse_goal_id)]
		goal: GoalId,
	},
	/// Comment on a goal
	Comment {
		#[arg(value_parser = parse_goal_id)]
		goal: GoalId,
		text: String,
	},
	/// Show a goal's likes, follows and comments
	Show {
		#[arg(value_parser = parse_goal_id)]
		goal: GoalId,
	},
	/// Walk through filling a slate and hitting the three-goal limit
	Demo,
}

impl Cli {
	/// The acting username, `None` when browsing as a guest.
	pub fn actor_name(&self) -> Option<&str> {
		(!self.guest).then_some(self.actor.as_str())
	}
}

/// Parses a goal id: a full UUID, or a small number as shorthand for the
/// built-in example goals (`1` through `9`).
pub fn parse_goal_id(s: &str) -> Result<GoalId, String> {
	if let Ok(n) = s.parse::<u128>() {
		return Ok(GoalId::from_u128(n));
	}
	s.parse::<GoalId>().map_err(|e| format!("invalid goal id `{s}`: {e}"))
}
