//! Core records for the goal board: identifiers, goals, engagement edges,
//! comments and profiles.
//!
//! Field names follow the backend's row layout so records decode directly
//! from fetched rows.

/// Comment records.
pub mod comment;
/// Like and follow edges.
pub mod edge;
/// Goal records and lifecycle.
pub mod goal;
/// Identifier newtypes.
pub mod ids;
/// Actor profiles.
pub mod profile;

pub use comment::{Comment, NewComment};
pub use edge::{Edge, EdgeKind};
pub use goal::{Goal, GoalState, NewGoal, SLATE_CAPACITY, TransitionError};
pub use ids::{ActorId, CommentId, GoalId};
pub use profile::Profile;

/// Timestamp type used by every record.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
