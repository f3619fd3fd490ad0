//! Task primitives shared by cairn's background loops.
//!
//! Every spawned task carries a [`TaskClass`] for observability and is
//! owned through a [`TaskHandle`] that cancels the task on shutdown or drop.

mod class;
mod spawn;
mod task;

pub use class::TaskClass;
use spawn::spawn;
pub use task::{TaskHandle, spawn_cancellable};
pub use tokio_util::sync::CancellationToken;
