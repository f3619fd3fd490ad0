//! Cancellable change subscriptions.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::Collection;

/// Kind of change applied to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOp {
	Insert,
	Update,
	Delete,
}

/// Notification that a collection changed. Carries no row payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
	pub collection: Collection,
	pub operation: ChangeOp,
}

/// Store-side half of a subscription.
#[derive(Debug, Clone)]
pub struct ChangeSender {
	collection: Collection,
	tx: mpsc::UnboundedSender<ChangeEvent>,
	cancel: CancellationToken,
}

impl ChangeSender {
	pub const fn collection(&self) -> Collection {
		self.collection
	}

	/// Returns true once the subscriber unsubscribed or dropped its handle.
	pub fn is_closed(&self) -> bool {
		self.cancel.is_cancelled() || self.tx.is_closed()
	}

	/// Delivers an event. Returns false if the subscriber is gone.
	pub fn send(&self, event: ChangeEvent) -> bool {
		!self.is_closed() && self.tx.send(event).is_ok()
	}
}

/// Subscriber-side handle yielding change events for one collection.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription {
	collection: Collection,
	rx: mpsc::UnboundedReceiver<ChangeEvent>,
	cancel: CancellationToken,
}

impl Subscription {
	/// Creates a connected sender/subscription pair.
	pub fn channel(collection: Collection) -> (ChangeSender, Self) {
		let (tx, rx) = mpsc::unbounded_channel();
		let cancel = CancellationToken::new();
		let sender = ChangeSender {
			collection,
			tx,
			cancel: cancel.clone(),
		};
		(sender, Self { collection, rx, cancel })
	}

	pub const fn collection(&self) -> Collection {
		self.collection
	}

	/// Waits for the next event. Returns `None` after unsubscribe or once the
	/// store closes the stream.
	pub async fn recv(&mut self) -> Option<ChangeEvent> {
		if self.cancel.is_cancelled() {
			return None;
		}
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => None,
			event = self.rx.recv() => event,
		}
	}

	/// Returns an already queued event without waiting.
	pub fn try_recv(&mut self) -> Option<ChangeEvent> {
		if self.cancel.is_cancelled() {
			return None;
		}
		self.rx.try_recv().ok()
	}

	/// Stops delivery. Queued events are discarded.
	pub fn unsubscribe(&self) {
		if !self.cancel.is_cancelled() {
			tracing::debug!(collection = %self.collection, "backend.unsubscribe");
		}
		self.cancel.cancel();
	}

	pub fn is_active(&self) -> bool {
		!self.cancel.is_cancelled()
	}

	/// Token cancelled when this subscription ends.
	pub fn cancellation(&self) -> CancellationToken {
		self.cancel.clone()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EVENT: ChangeEvent = ChangeEvent {
		collection: Collection::Goals,
		operation: ChangeOp::Insert,
	};

	#[tokio::test]
	async fn delivers_until_unsubscribed() {
		let (sender, mut sub) = Subscription::channel(Collection::Goals);
		assert!(sender.send(EVENT));
		assert_eq!(sub.recv().await, Some(EVENT));

		sub.unsubscribe();
		assert!(!sender.send(EVENT));
		assert_eq!(sub.recv().await, None);
	}

	#[test]
	fn drop_closes_sender() {
		let (sender, sub) = Subscription::channel(Collection::Goals);
		drop(sub);
		assert!(sender.is_closed());
	}
}
