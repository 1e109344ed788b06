//! Bounded pool of lock + condition-variable slots.
//!
//! Component `i` uses slot `i % len`, so the number of synchronization
//! objects stays fixed no matter how many components a circuit has. Slots are
//! shared by unrelated components: a wakeup only means "something on this
//! slot changed", and every waiter re-checks its own predicate under the lock.

use parking_lot::{Condvar, Mutex};

/// Default number of slots.
pub const DEFAULT_POOL_SIZE: usize = 128;

struct Slot {
    lock: Mutex<()>,
    cond: Condvar,
}

pub struct SlotPool {
    slots: Box<[Slot]>,
}

impl SlotPool {
    /// Pool with `size` slots (at least one).
    pub fn new(size: usize) -> Self {
        let slots = (0..size.max(1))
            .map(|_| Slot {
                lock: Mutex::new(()),
                cond: Condvar::new(),
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn slot_index(&self, component: usize) -> usize {
        component % self.slots.len()
    }

    fn slot(&self, component: usize) -> &Slot {
        &self.slots[self.slot_index(component)]
    }

    /// Block until `done` returns true. `done` is evaluated with the slot lock
    /// held, before the first wait and after every wakeup.
    pub fn wait_until(&self, component: usize, mut done: impl FnMut() -> bool) {
        let slot = self.slot(component);
        let mut guard = slot.lock.lock();
        while !done() {
            slot.cond.wait(&mut guard);
        }
    }

    /// Apply `update` under the slot lock, then wake every waiter on the slot.
    pub fn publish(&self, component: usize, update: impl FnOnce()) {
        let slot = self.slot(component);
        {
            let _guard = slot.lock.lock();
            update();
        }
        slot.cond.notify_all();
    }

    /// Wake every waiter on every slot.
    pub fn wake_all(&self) {
        for slot in self.slots.iter() {
            let _guard = slot.lock.lock();
            slot.cond.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_slot_mapping() {
        let pool = SlotPool::new(4);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.slot_index(1), 1);
        assert_eq!(pool.slot_index(5), 1);
        assert_eq!(SlotPool::new(0).len(), 1);
    }

    #[test]
    fn test_wait_returns_immediately_when_done() {
        let pool = SlotPool::new(2);
        pool.wait_until(3, || true);
    }

    #[test]
    fn test_shared_slot_wakeup_rechecks_predicate() {
        let pool = Arc::new(SlotPool::new(4));
        let mine = Arc::new(AtomicBool::new(false));
        let other = Arc::new(AtomicBool::new(false));
        let returned = Arc::new(AtomicBool::new(false));

        let waiter = {
            let pool = pool.clone();
            let mine = mine.clone();
            let returned = returned.clone();
            thread::spawn(move || {
                pool.wait_until(1, || mine.load(Ordering::Acquire));
                returned.store(true, Ordering::Release);
            })
        };

        // Component 5 shares slot 1: its completion wakes the waiter, which
        // must go back to sleep.
        pool.publish(5, || other.store(true, Ordering::Release));
        thread::sleep(Duration::from_millis(50));
        assert!(!returned.load(Ordering::Acquire));

        pool.publish(1, || mine.store(true, Ordering::Release));
        waiter.join().unwrap();
        assert!(returned.load(Ordering::Acquire));
    }

    #[test]
    fn test_wake_all_releases_external_condition() {
        let pool = Arc::new(SlotPool::new(3));
        let stop = Arc::new(AtomicBool::new(false));
        let waiters: Vec<_> = (0..6)
            .map(|component| {
                let pool = pool.clone();
                let stop = stop.clone();
                thread::spawn(move || pool.wait_until(component, || stop.load(Ordering::Acquire)))
            })
            .collect();

        stop.store(true, Ordering::Release);
        pool.wake_all();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
