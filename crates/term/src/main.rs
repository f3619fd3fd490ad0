//! Cairn command-line driver.
//!
//! Runs one viewer session against an in-memory store seeded with the example
//! authors (and optionally a JSON seed file), executes a single command, then
//! prints the resulting view and any notices.

mod cli;
mod render;
mod seed;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use cairn_backend::MemoryBackend;
use cairn_config::Config;
use cairn_core::{Client, EdgeSnapshot, Outcome};
use cairn_primitives::GoalId;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Cli, Command};

/// Example goal used by the demo walkthrough.
const DEMO_FEED_GOAL: GoalId = GoalId::from_u128(1);

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	let config = Config::load_or_default(cli.config.as_deref())?;
	setup_tracing(&config.log.filter, cli.verbose);

	let backend = MemoryBackend::with_standard_schema();
	seed::apply_default(&backend);
	if let Some(path) = &cli.seed {
		let rows = seed::apply_file(&backend, path)?;
		info!(rows, path = %path.display(), "seed loaded");
	}

	let actor = match cli.actor_name() {
		Some(name) => Some(seed::resolve_actor(&backend, name).with_context(|| format!("no profile named `{name}`"))?),
		None => None,
	};
	debug!(?actor, "session actor");

	let client = Client::new(Arc::new(backend), actor, &config);
	client.start().await?;
	let result = run(&client, cli.command).await;
	print!("{}", render::notices(&client.notices().drain()));
	client.shutdown().await;
	result
}

async fn run(client: &Client, command: Command) -> Result<()> {
	match command {
		Command::Feed { query } => {
			if let Some(query) = query {
				client.set_query(&query);
			}
			print!("{}", render::feed(&client.feed(), Utc::now()));
		}
		Command::Slate => print!("{}", render::slate(&client.slate())),
		Command::Create { title, description } => {
			client.create_goal(&title, description.as_deref()).await?;
			print!("{}", render::slate(&client.slate()));
		}
		Command::Complete { goal } => {
			client.complete_goal(goal).await?;
			print!("{}", render::slate(&client.slate()));
		}
		Command::Delete { goal } => {
			client.delete_goal(goal).await?;
			print!("{}", render::slate(&client.slate()));
		}
		Command::Like { goal } => {
			client.open_goal(goal).await;
			report_toggle("like", client.toggle_like(goal).await?);
			show(client, goal).await;
		}
		Command::Follow { goal } => {
			client.open_goal(goal).await;
			report_toggle("follow", client.toggle_follow(goal).await?);
			show(client, goal).await;
		}
		Command::Comment { goal, text } => {
			client.open_goal(goal).await;
			if client.post_comment(goal, &text).await?.is_skipped() {
				println!("Sign in to comment on goals");
			}
			show(client, goal).await;
		}
		Command::Show { goal } => show(client, goal).await,
		Command::Demo => demo(client).await?,
	}
	Ok(())
}

fn report_toggle(verb: &str, outcome: Outcome<EdgeSnapshot>) {
	if outcome.is_skipped() {
		println!("Sign in to {verb} goals");
	}
}

async fn show(client: &Client, goal: GoalId) {
	let snapshot = client.open_goal(goal).await;
	print!("{}", render::engagement(&snapshot));
}

/// Fills the slate, runs into the limit, frees a slot and cheers on an
/// example goal.
async fn demo(client: &Client) -> Result<()> {
	for title in ["Run a marathon", "Learn Spanish", "Read 52 books", "Write a novel"] {
		if let Err(err) = client.create_goal(title, None).await {
			println!("{title}: {err}");
		}
	}
	let slate = client.slate();
	print!("{}", render::slate(&slate));

	if let Some(oldest) = slate.active.last() {
		println!("\nCompleting \"{}\"", oldest.title);
		client.complete_goal(oldest.id).await?;
		client.create_goal("Write a novel", None).await?;
		print!("{}", render::slate(&client.slate()));
	}

	println!();
	client.open_goal(DEMO_FEED_GOAL).await;
	client.toggle_like(DEMO_FEED_GOAL).await?;
	client.post_comment(DEMO_FEED_GOAL, "You got this!").await?;
	print!("{}", render::engagement(&client.engagement(DEMO_FEED_GOAL)));

	println!();
	print!("{}", render::feed(&client.feed(), Utc::now()));
	Ok(())
}

fn setup_tracing(filter: &str, verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("cairn=debug,cairn_core=trace,cairn_backend=debug,info")
		} else {
			EnvFilter::new(filter)
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();
}
