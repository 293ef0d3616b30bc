//! Unmount bookkeeping shared by the canvas effects and `on_cleanup`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Undo = Box<dyn FnOnce() + Send + Sync>;

/// Mounted flag plus the undo actions registered while mounted.
///
/// Clones share state. An action deferred after [`Teardown::run`] runs at once,
/// so a listener attached by a late effect is still removed.
#[derive(Clone, Default)]
pub struct Teardown {
	unmounted: Arc<AtomicBool>,
	pending: Arc<Mutex<Vec<Undo>>>,
}

impl Teardown {
	pub fn is_mounted(&self) -> bool {
		!self.unmounted.load(Ordering::Relaxed)
	}

	pub fn defer(&self, undo: impl FnOnce() + Send + Sync + 'static) {
		if self.is_mounted() {
			if let Ok(mut pending) = self.pending.lock() {
				pending.push(Box::new(undo));
				return;
			}
		}
		undo();
	}

	/// Mark unmounted and run every deferred action once.
	pub fn run(&self) {
		self.unmounted.store(true, Ordering::Relaxed);
		let pending = match self.pending.lock() {
			Ok(mut pending) => std::mem::take(&mut *pending),
			Err(_) => return,
		};
		for undo in pending {
			undo();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + Sync + 'static) {
		let count = Arc::new(AtomicUsize::new(0));
		let inner = count.clone();
		(count, move || {
			inner.fetch_add(1, Ordering::Relaxed);
		})
	}

	#[test]
	fn deferred_actions_run_once_on_unmount() {
		let teardown = Teardown::default();
		let (removed, remove) = counter();
		teardown.clone().defer(remove);
		assert!(teardown.is_mounted());
		assert_eq!(removed.load(Ordering::Relaxed), 0);

		teardown.run();
		assert!(!teardown.is_mounted());
		assert_eq!(removed.load(Ordering::Relaxed), 1);

		teardown.run();
		assert_eq!(removed.load(Ordering::Relaxed), 1);
	}

	#[test]
	fn defer_after_unmount_runs_immediately() {
		let teardown = Teardown::default();
		teardown.run();
		let (removed, remove) = counter();
		teardown.defer(remove);
		assert_eq!(removed.load(Ordering::Relaxed), 1);
	}
}
