//! Dependencies threaded into every component.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cairn_backend::Backend;

use crate::notice::NoticeBoard;
use crate::{Error, Result};

/// Backend handle, notice board and call bound shared by one session's components.
#[derive(Clone)]
pub struct Context {
	backend: Arc<dyn Backend>,
	notices: Arc<NoticeBoard>,
	timeout: Duration,
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context")
			.field("notices", &self.notices.len())
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

impl Context {
	pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
		Self {
			backend,
			notices: Arc::new(NoticeBoard::default()),
			timeout,
		}
	}

	/// Replaces the notice board, e.g. to share one across sessions.
	pub fn with_notices(mut self, notices: Arc<NoticeBoard>) -> Self {
		self.notices = notices;
		self
	}

	pub fn backend(&self) -> &dyn Backend {
		self.backend.as_ref()
	}

	pub fn notices(&self) -> &NoticeBoard {
		&self.notices
	}

	pub fn shared_notices(&self) -> Arc<NoticeBoard> {
		Arc::clone(&self.notices)
	}

	pub const fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Awaits a backend call, bounded by the configured timeout.
	pub async fn call<T, F>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = cairn_backend::Result<T>>,
	{
		match tokio::time::timeout(self.timeout, fut).await {
			Ok(result) => result.map_err(Error::from),
			Err(_) => Err(Error::TimedOut(self.timeout)),
		}
	}
}
