//! Client-side engagement state synchronization for the cairn goal board.
//!
//! Components, leaves first:
//!
//! - [`EngagementStore`]: per-goal cache of like/follow counts, viewer
//!   membership and comments.
//! - [`MutationCoordinator`]: optimistic like/follow toggles with rollback,
//!   and comment posting.
//! - [`FeedComposer`]: merges live community goals with the supplemental
//!   examples, deduplicates by id and filters by search query.
//! - [`SlateManager`]: the viewer's active goals and the three-goal capacity
//!   rule.
//! - [`ChangeBridge`]: refreshes slate and feed whenever the goal collection
//!   changes.
//!
//! [`Client`] bundles them into one viewer session. Every component reaches
//! the store through an explicitly passed [`Context`].

pub mod bridge;
pub mod client;
pub mod context;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod mutation;
pub mod notice;
mod profiles;
mod records;
pub mod slate;
#[cfg(test)]
mod test_support;

pub use bridge::{BridgeHandle, ChangeBridge, RefreshTarget, RefreshWatcher};
pub use client::Client;
pub use context::Context;
pub use engagement::{CommentEntry, EdgeSnapshot, EngagementSnapshot, EngagementStore, MutationPhase};
pub use error::{Error, ErrorKind, Result};
pub use feed::{EmptyState, FeedComposer, FeedEntry, FeedView};
pub use mutation::{MutationCoordinator, Outcome};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use slate::{SlateManager, SlateView};
