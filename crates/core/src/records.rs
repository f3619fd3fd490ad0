//! Decoding of loosely typed rows into records at the fetch boundary.

use cairn_backend::{Collection, Row};
use cairn_primitives::{Comment, Edge, EdgeKind, Goal, Profile};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{Error, Result};

/// A record decodable from a backend row.
pub(crate) trait Record: DeserializeOwned {
	/// Field-level invariants serde cannot express.
	fn is_valid(&self) -> bool {
		true
	}
}

impl Record for Goal {
	fn is_valid(&self) -> bool {
		!self.title.trim().is_empty()
	}
}

impl Record for Comment {
	fn is_valid(&self) -> bool {
		!self.content.trim().is_empty()
	}
}

impl Record for Edge {}
impl Record for Profile {}

/// Decodes rows, skipping malformed or invalid ones.
pub(crate) fn decode_rows<T: Record>(collection: Collection, rows: Vec<Row>) -> Vec<T> {
	let total = rows.len();
	let records: Vec<T> = rows
		.into_iter()
		.filter_map(|row| match serde_json::from_value::<T>(Value::Object(row)) {
			Ok(record) if record.is_valid() => Some(record),
			Ok(_) => None,
			Err(err) => {
				warn!(%collection, %err, "skipping malformed row");
				None
			}
		})
		.collect();
	if records.len() != total {
		warn!(%collection, total, kept = records.len(), "dropped rows at decode");
	}
	records
}

/// Decodes a single row, e.g. the stored form returned by an insert.
pub(crate) fn decode_row<T: Record>(row: Row) -> Result<T> {
	let record: T = serde_json::from_value(Value::Object(row)).map_err(|e| Error::Decode(e.to_string()))?;
	if record.is_valid() {
		Ok(record)
	} else {
		Err(Error::Decode("record failed validation".into()))
	}
}

/// Encodes a payload as a row.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Row> {
	match serde_json::to_value(value) {
		Ok(Value::Object(row)) => Ok(row),
		Ok(other) => Err(Error::Decode(format!("expected an object, got {other}"))),
		Err(err) => Err(Error::Decode(err.to_string())),
	}
}

/// Collection holding edges of `kind`.
pub(crate) const fn edge_collection(kind: EdgeKind) -> Collection {
	match kind {
		EdgeKind::Like => Collection::GoalLikes,
		EdgeKind::Follow => Collection::GoalFollows,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn row(value: Value) -> Row {
		match value {
			Value::Object(map) => map,
			_ => unreachable!(),
		}
	}

	#[test]
	fn malformed_and_blank_rows_are_skipped() {
		let rows = vec![
			row(json!({
				"id": "00000000-0000-0000-0000-000000000001",
				"user_id": "00000000-0000-0000-0000-000000000101",
				"title": "Run a marathon",
				"created_at": "2025-01-15T10:00:00Z",
			})),
			row(json!({
				"id": "00000000-0000-0000-0000-000000000002",
				"user_id": "00000000-0000-0000-0000-000000000101",
				"title": "   ",
				"created_at": "2025-01-15T10:00:00Z",
			})),
			row(json!({ "id": "not-a-uuid", "title": "x" })),
		];

		let goals: Vec<Goal> = decode_rows(Collection::Goals, rows);
		assert_eq!(goals.len(), 1);
		assert_eq!(goals[0].title, "Run a marathon");
	}

	#[test]
	fn encode_rejects_non_objects() {
		assert!(encode(&"text").is_err());
		assert!(encode(&json!({ "a": 1 })).is_ok());
	}
}
