//! Change-notification bridge.
//!
//! Subscribes to the goal collection and refreshes every registered
//! [`RefreshTarget`] on each change event. Events carry no payload, so there
//! is nothing to diff: the targets simply re-fetch. Events already queued when
//! the bridge wakes are folded into the same refresh.
//!
//! Like, follow and comment collections are not watched; their counts are
//! refreshed when a goal is opened.


use std::sync::Arc;

use async_trait::async_trait;
use cairn_backend::{Collection, Subscription};
use cairn_worker::{CancellationToken, TaskClass, TaskHandle, spawn_cancellable};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::feed::FeedComposer;
use crate::slate::SlateManager;
use crate::{Context, Result};

/// A view model re-fetched when goals change.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
	/// Short name for logs.
	fn name(&self) -> &'static str;

	async fn refresh(&self) -> Result<()>;
}

#[async_trait]
impl RefreshTarget for SlateManager {
	fn name(&self) -> &'static str {
		"slate"
	}

	async fn refresh(&self) -> Result<()> {
		SlateManager::refresh(self).await.map(drop)
	}
}

#[async_trait]
impl RefreshTarget for FeedComposer {
	fn name(&self) -> &'static str {
		"feed"
	}

	async fn refresh(&self) -> Result<()> {
		FeedComposer::refresh(self).await.map(drop)
	}
}

/// Starts bridges between goal changes and refresh targets.
pub struct ChangeBridge;

impl ChangeBridge {
	/// Subscribes to goal changes and spawns the refresh loop.
	pub fn start(ctx: &Context, targets: Vec<Arc<dyn RefreshTarget>>) -> Result<BridgeHandle> {
		let subscription = ctx.backend().subscribe(Collection::Goals)?;
		let (generation_tx, generation_rx) = watch::channel(0u64);
		debug!(targets = targets.len(), "change bridge started");

		let task = spawn_cancellable(TaskClass::Background, "change_bridge", move |cancel| {
			run(subscription, targets, generation_tx, cancel)
		});
		Ok(BridgeHandle {
			task,
			watcher: RefreshWatcher { rx: generation_rx },
		})
	}
}

async fn run(
	mut subscription: Subscription,
	targets: Vec<Arc<dyn RefreshTarget>>,
	generation: watch::Sender<u64>,
	cancel: CancellationToken,
) {
	loop {
		let event = tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			event = subscription.recv() => event,
		};
		let Some(event) = event else {
			debug!("goal change stream closed");
			break;
		};

		let mut coalesced = 0usize;
		while subscription.try_recv().is_some() {
			coalesced += 1;
		}
		trace!(operation = ?event.operation, coalesced, "bridge.wake");

		for target in &targets {
			if let Err(err) = target.refresh().await {
				warn!(target = target.name(), %err, "bridge refresh failed");
			}
		}
		generation.send_modify(|g| *g += 1);
	}
	subscription.unsubscribe();
}

/// Observes completed refresh rounds without owning the bridge.
#[derive(Debug, Clone)]
pub struct RefreshWatcher {
	rx: watch::Receiver<u64>,
}

impl RefreshWatcher {
	/// Number of completed refresh rounds.
	pub fn generation(&self) -> u64 {
		*self.rx.borrow()
	}

	/// Waits until at least `min` refresh rounds have completed, or the
	/// bridge stopped. Returns the generation reached.
	pub async fn wait_for(&self, min: u64) -> u64 {
		let mut rx = self.rx.clone();
		let reached = rx.wait_for(|g| *g >= min).await.map(|g| *g);
		reached.unwrap_or_else(|_| *rx.borrow())
	}
}

/// Owner of a running bridge. Dropping it stops the bridge.
#[derive(Debug)]
pub struct BridgeHandle {
	task: TaskHandle,
	watcher: RefreshWatcher,
}

impl BridgeHandle {
	pub fn generation(&self) -> u64 {
		self.watcher.generation()
	}

	pub async fn wait_for(&self, min: u64) -> u64 {
		self.watcher.wait_for(min).await
	}

	pub fn watcher(&self) -> RefreshWatcher {
		self.watcher.clone()
	}

	pub fn is_running(&self) -> bool {
		!self.task.is_finished()
	}

	/// Stops the refresh loop and unsubscribes.
	pub async fn shutdown(self) {
		self.task.shutdown().await;
	}
}
