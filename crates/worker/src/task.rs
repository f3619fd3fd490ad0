use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::TaskClass;

/// Owned handle to a cancellable task.
///
/// Dropping the handle requests cancellation; [`TaskHandle::shutdown`] also
/// waits for the task to finish.
#[derive(Debug)]
pub struct TaskHandle {
	name: &'static str,
	cancel: CancellationToken,
	join: Option<JoinHandle<()>>,
}

/// Spawns `make(token)` as a task that observes `token` for cancellation.
pub fn spawn_cancellable<F, Fut>(class: TaskClass, name: &'static str, make: F) -> TaskHandle
where
	F: FnOnce(CancellationToken) -> Fut,
	Fut: Future<Output = ()> + Send + 'static,
{
	let cancel = CancellationToken::new();
	let join = crate::spawn(class, name, make(cancel.clone()));
	TaskHandle {
		name,
		cancel,
		join: Some(join),
	}
}

impl TaskHandle {
	pub const fn name(&self) -> &'static str {
		self.name
	}

	/// Requests cancellation without waiting.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Returns true once the task has exited.
	pub fn is_finished(&self) -> bool {
		self.join.as_ref().is_none_or(JoinHandle::is_finished)
	}

	/// Cancels the task and waits for it to exit.
	pub async fn shutdown(mut self) {
		self.cancel.cancel();
		if let Some(join) = self.join.take()
			&& let Err(err) = join.await
			&& err.is_panic()
		{
			tracing::warn!(task = self.name, "worker task panicked during shutdown");
		}
		tracing::debug!(task = self.name, "worker.shutdown");
	}
}

impl Drop for TaskHandle {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicBool, Ordering};

	use super::*;

	#[tokio::test]
	async fn shutdown_cancels_and_joins() {
		let exited = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&exited);
		let handle = spawn_cancellable(TaskClass::Background, "test", move |token| async move {
			token.cancelled().await;
			flag.store(true, Ordering::SeqCst);
		});

		assert!(!handle.is_cancelled());
		handle.shutdown().await;
		assert!(exited.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn drop_requests_cancellation() {
		let (tx, rx) = tokio::sync::oneshot::channel();
		let handle = spawn_cancellable(TaskClass::Background, "test", move |token| async move {
			token.cancelled().await;
			let _ = tx.send(());
		});

		drop(handle);
		assert!(rx.await.is_ok());
	}

	#[tokio::test]
	async fn background_task_reports_name_and_completion() {
		let handle = spawn_cancellable(TaskClass::Background, "change_bridge", |_token| async {});
		assert_eq!(handle.name(), "change_bridge");
		assert_eq!(TaskClass::Background.as_str(), "background");
		while !handle.is_finished() {
			tokio::task::yield_now().await;
		}
	}
}
