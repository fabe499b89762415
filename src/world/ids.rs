//! Monotonic + recycling ID allocator shared by users, rooms, and games.

use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam::queue::SegQueue;

/// First ID ever handed out; also the value the counter resets to if it is
/// ever observed below this floor (misuse or wrap-around).
pub const FIRST_ID: u32 = 0x1000;

/// All `User`/`Room`/`Game` IDs are drawn from this single allocator.
pub struct IdAllocator {
    next: AtomicU32,
    recycled: SegQueue<u32>,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(FIRST_ID),
            recycled: SegQueue::new(),
        }
    }

    /// Returns a recycled id if one is available, otherwise the counter's
    /// current value (advancing it by one). Fatal once the counter wraps.
    pub fn next_id(&self) -> Result<u32, IdExhaustion> {
        if let Some(id) = self.recycled.pop() {
            return Ok(id);
        }

        loop {
            let current = self.next.load(Ordering::Acquire);
            let base = current.max(FIRST_ID);
            let advanced = base.checked_add(1).ok_or(IdExhaustion)?;
            if self
                .next
                .compare_exchange_weak(current, advanced, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(base);
            }
        }
    }

    pub fn recycle(&self, id: u32) {
        self.recycled.push(id);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("id space exhausted")]
pub struct IdExhaustion;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn ids_start_at_the_documented_floor() {
        let alloc = IdAllocator::new();
        assert_eq!(alloc.next_id().unwrap(), FIRST_ID);
        assert_eq!(alloc.next_id().unwrap(), FIRST_ID + 1);
    }

    #[test]
    fn recycled_ids_are_preferred_over_the_counter() {
        let alloc = IdAllocator::new();
        let a = alloc.next_id().unwrap();
        let _b = alloc.next_id().unwrap();
        alloc.recycle(a);
        assert_eq!(alloc.next_id().unwrap(), a);
    }

    #[test]
    fn concurrent_allocation_never_duplicates_an_id() {
        let alloc = Arc::new(IdAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = Arc::clone(&alloc);
            handles.push(thread::spawn(move || {
                (0..200).map(|_| alloc.next_id().unwrap()).collect::<Vec<_>>()
            }));
        }
        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "id {id} issued twice");
            }
        }
        assert_eq!(seen.len(), 8 * 200);
    }
}
