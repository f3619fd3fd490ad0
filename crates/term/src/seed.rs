//! Seed data for the in-memory store the CLI runs against.

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use cairn_backend::{Collection, MemoryBackend, Row};
use cairn_primitives::{ActorId, Profile};
use serde_json::{Map, Value, json};

/// The local user plus the authors of the built-in example goals.
const PROFILES: [(u128, &str); 6] = [
	(0x1, "you"),
	(0x101, "sarah_chen"),
	(0x102, "mike_rodriguez"),
	(0x103, "emma_johnson"),
	(0x104, "alex_kumar"),
	(0x105, "lisa_park"),
];

/// Loads the default profiles into `backend`.
pub fn apply_default(backend: &MemoryBackend) {
	let rows = PROFILES.iter().filter_map(|(id, name)| {
		as_row(json!({ "id": ActorId::from_u128(*id).to_string(), "username": name }))
	});
	backend.seed(Collection::Profiles, rows);
}

/// Loads a JSON object mapping collection names to arrays of rows.
///
/// Rows are stored verbatim, so goal rows need their `id` and `created_at`.
/// Returns the number of rows loaded.
pub fn apply_file(backend: &MemoryBackend, path: &Path) -> Result<usize> {
	let text = std::fs::read_to_string(path).with_context(|| format!("reading seed file {}", path.display()))?;
	let document: Map<String, Value> =
		serde_json::from_str(&text).with_context(|| format!("parsing seed file {}", path.display()))?;
	apply(backend, document)
}

fn apply(backend: &MemoryBackend, document: Map<String, Value>) -> Result<usize> {
	let mut loaded = 0;
	for (name, rows) in document {
		let collection: Collection = name.parse().map_err(anyhow::Error::msg)?;
		let Value::Array(rows) = rows else {
			bail!("seed entry `{name}` must be an array of rows");
		};
		let mut batch = Vec::with_capacity(rows.len());
		for (index, value) in rows.into_iter().enumerate() {
			let Some(row) = as_row(value) else {
				bail!("seed entry `{name}`[{index}] is not an object");
			};
			batch.push(row);
		}
		loaded += batch.len();
		tracing::debug!(%collection, rows = batch.len(), "seeded");
		backend.seed(collection, batch);
	}
	Ok(loaded)
}

/// Finds the actor whose profile carries `username`.
pub fn resolve_actor(backend: &MemoryBackend, username: &str) -> Option<ActorId> {
	backend
		.rows(Collection::Profiles)
		.into_iter()
		.filter_map(|row| serde_json::from_value::<Profile>(Value::Object(row)).ok())
		.find(|profile| profile.username == username)
		.map(|profile| profile.id)
}

fn as_row(value: Value) -> Option<Row> {
	match value {
		Value::Object(map) => Some(map),
		_ => None,
	}
}
