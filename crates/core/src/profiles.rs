//! Display-name resolution through the `profiles` collection.

use std::collections::{BTreeSet, HashMap};

use cairn_backend::{Collection, Query};
use cairn_primitives::{ActorId, Profile};
use tracing::warn;

use crate::records::decode_rows;
use crate::{Context, Result};

/// Resolves usernames for `actors` with one query.
///
/// Resolution is best effort: on failure the map is empty and callers fall
/// back to anonymous display.
pub(crate) async fn usernames(ctx: &Context, actors: impl IntoIterator<Item = ActorId>) -> HashMap<ActorId, String> {
	let ids: BTreeSet<ActorId> = actors.into_iter().collect();
	if ids.is_empty() {
		return HashMap::new();
	}

	let query = Query::new(Collection::Profiles).is_in("id", ids.iter().map(ToString::to_string));
	match ctx.call(ctx.backend().query(query)).await {
		Ok(rows) => decode_rows::<Profile>(Collection::Profiles, rows)
			.into_iter()
			.map(|p| (p.id, p.username))
			.collect(),
		Err(err) => {
			warn!(%err, actors = ids.len(), "username lookup failed");
			HashMap::new()
		}
	}
}

/// Fetches one actor's profile.
pub(crate) async fn fetch(ctx: &Context, actor: ActorId) -> Result<Option<Profile>> {
	let rows = ctx
		.call(ctx.backend().query(Query::new(Collection::Profiles).eq("id", actor.to_string()).limit(1)))
		.await?;
	Ok(decode_rows::<Profile>(Collection::Profiles, rows).into_iter().next())
}
