//! Dismissible user-facing notices.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Default number of notices retained before the oldest is discarded.
pub const DEFAULT_CAPACITY: usize = 16;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
	Success,
	Info,
	Error,
}

/// One message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub id: u64,
	pub level: NoticeLevel,
	pub message: String,
}

/// Bounded queue of notices. Overflow discards the oldest entry.
#[derive(Debug)]
pub struct NoticeBoard {
	capacity: usize,
	next_id: AtomicU64,
	entries: Mutex<VecDeque<Notice>>,
}

impl Default for NoticeBoard {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

impl NoticeBoard {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			capacity,
			next_id: AtomicU64::new(1),
			entries: Mutex::new(VecDeque::with_capacity(capacity)),
		}
	}

	/// Posts a notice and returns its id.
	pub fn post(&self, level: NoticeLevel, message: impl Into<String>) -> u64 {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut entries = self.entries.lock();
		if entries.len() == self.capacity {
			entries.pop_front();
		}
		entries.push_back(Notice {
			id,
			level,
			message: message.into(),
		});
		id
	}

	pub fn success(&self, message: impl Into<String>) -> u64 {
		self.post(NoticeLevel::Success, message)
	}

	pub fn info(&self, message: impl Into<String>) -> u64 {
		self.post(NoticeLevel::Info, message)
	}

	pub fn error(&self, message: impl Into<String>) -> u64 {
		self.post(NoticeLevel::Error, message)
	}

	/// Removes one notice. Returns false if it was already gone.
	pub fn dismiss(&self, id: u64) -> bool {
		let mut entries = self.entries.lock();
		let before = entries.len();
		entries.retain(|n| n.id != id);
		entries.len() != before
	}

	/// Current notices, oldest first.
	pub fn snapshot(&self) -> Vec<Notice> {
		self.entries.lock().iter().cloned().collect()
	}

	/// Takes every notice, oldest first.
	pub fn drain(&self) -> Vec<Notice> {
		self.entries.lock().drain(..).collect()
	}

	/// Most recent notice, if any.
	pub fn latest(&self) -> Option<Notice> {
		self.entries.lock().back().cloned()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}
