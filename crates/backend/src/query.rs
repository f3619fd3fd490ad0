//! Query model: collections, predicate filters, ordering and limits.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A loosely typed row as exchanged with the store.
pub type Row = serde_json::Map<String, Value>;

/// Named collections of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
	Goals,
	GoalLikes,
	GoalFollows,
	GoalComments,
	Profiles,
}

impl Collection {
	/// Every collection, in declaration order.
	pub const ALL: [Self; 5] = [Self::Goals, Self::GoalLikes, Self::GoalFollows, Self::GoalComments, Self::Profiles];

	/// Store-side name of the collection.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Goals => "goals",
			Self::GoalLikes => "goal_likes",
			Self::GoalFollows => "goal_follows",
			Self::GoalComments => "goal_comments",
			Self::Profiles => "profiles",
		}
	}
}

impl fmt::Display for Collection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Collection {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|c| c.as_str() == s)
			.ok_or_else(|| format!("unknown collection: {s}"))
	}
}

/// One condition on a row field. Missing fields read as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Eq(String, Value),
	Neq(String, Value),
	In(String, Vec<Value>),
}

impl Predicate {
	/// Evaluates the predicate against a row.
	pub fn matches(&self, row: &Row) -> bool {
		match self {
			Self::Eq(field, value) => field_value(row, field) == value,
			Self::Neq(field, value) => field_value(row, field) != value,
			Self::In(field, values) => {
				let actual = field_value(row, field);
				values.iter().any(|v| v == actual)
			}
		}
	}
}

fn field_value<'a>(row: &'a Row, field: &str) -> &'a Value {
	row.get(field).unwrap_or(&Value::Null)
}

/// Conjunction of predicates. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
	predicates: Vec<Predicate>,
}

impl Filter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requires `field == value`.
	pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.predicates.push(Predicate::Eq(field.into(), value.into()));
		self
	}

	/// Requires `field != value`.
	pub fn neq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.predicates.push(Predicate::Neq(field.into(), value.into()));
		self
	}

	/// Requires `field` to equal one of `values`.
	pub fn is_in<V: Into<Value>>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
		self.predicates
			.push(Predicate::In(field.into(), values.into_iter().map(Into::into).collect()));
		self
	}

	pub fn predicates(&self) -> &[Predicate] {
		&self.predicates
	}

	/// Returns true when every predicate matches.
	pub fn matches(&self, row: &Row) -> bool {
		self.predicates.iter().all(|p| p.matches(row))
	}
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
	#[default]
	Ascending,
	Descending,
}

/// Ordering on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
	pub field: String,
	pub direction: Direction,
}

impl Order {
	/// Compares two rows on the order field, honoring direction.
	pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
		let ord = compare_values(field_value(a, &self.field), field_value(b, &self.field));
		match self.direction {
			Direction::Ascending => ord,
			Direction::Descending => ord.reverse(),
		}
	}
}

/// Total order over JSON scalars used for sorting.
///
/// Strings that both parse as RFC 3339 timestamps compare chronologically so
/// mixed precision (`...00Z` vs `...00.123Z`) still sorts correctly. `null`
/// sorts first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
	match (a, b) {
		(Value::Null, Value::Null) => Ordering::Equal,
		(Value::Null, _) => Ordering::Less,
		(_, Value::Null) => Ordering::Greater,
		(Value::Bool(x), Value::Bool(y)) => x.cmp(y),
		(Value::Number(x), Value::Number(y)) => {
			let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
			x.partial_cmp(&y).unwrap_or(Ordering::Equal)
		}
		(Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
			(Some(x), Some(y)) => x.cmp(&y),
			_ => x.cmp(y),
		},
		_ => a.to_string().cmp(&b.to_string()),
	}
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

/// A select against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	pub collection: Collection,
	pub filter: Filter,
	pub order: Option<Order>,
	pub limit: Option<usize>,
}

impl Query {
	/// Selects every row of a collection.
	pub fn new(collection: Collection) -> Self {
		Self {
			collection,
			filter: Filter::new(),
			order: None,
			limit: None,
		}
	}

	pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.filter = self.filter.eq(field, value);
		self
	}

	pub fn neq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.filter = self.filter.neq(field, value);
		self
	}

	pub fn is_in<V: Into<Value>>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
		self.filter = self.filter.is_in(field, values);
		self
	}

	/// Orders results by `field`.
	pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
		self.order = Some(Order {
			field: field.into(),
			direction,
		});
		self
	}

	/// Caps the number of returned rows.
	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);
		self
	}
}
