//! Page replacement policies for the buffer pool.

use crate::frame::FrameId;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Trait for page replacement algorithms.
pub trait Replacer: Send + Sync {
    /// Records that the given frame was accessed.
    fn record_access(&self, frame_id: FrameId);

    /// Marks a frame as evictable or pinned. Idempotent; untracked
    /// frames are ignored.
    fn set_evictable(&self, frame_id: FrameId, evictable: bool);

    /// Selects a victim frame and stops tracking it.
    ///
    /// Returns None if no tracked frame is evictable.
    fn evict(&self) -> Option<FrameId>;

    /// Stops tracking an evictable frame. No-op if the frame is
    /// untracked or not evictable.
    fn remove(&self, frame_id: FrameId);

    /// Returns the number of evictable tracked frames.
    fn size(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    /// Not known to the replacer.
    Untracked,
    /// Tracked but ineligible for eviction.
    Pinned,
    /// Tracked and eligible for eviction.
    Evictable,
}

#[derive(Debug, Clone, Copy)]
struct FrameInfo {
    /// Number of recorded accesses since tracking began.
    accesses: usize,
    state: TrackState,
}

struct LruKInner {
    /// Frames with fewer than k accesses, ordered by first access.
    history: VecDeque<FrameId>,
    /// Frames with at least k accesses, ordered by last access.
    cache: VecDeque<FrameId>,
    frames: Vec<FrameInfo>,
    evictable: usize,
}

/// LRU-K replacement policy.
///
/// Frames touched fewer than k times sit in a history queue and are
/// evicted first, in first-access order (their backward K-distance is
/// infinite). Frames touched k or more times sit in a cache queue
/// ordered by recency of last access. Newly tracked frames start out
/// non-evictable; the pool flips them once their pin count drops to
/// zero.
pub struct LruKReplacer {
    capacity: usize,
    k: usize,
    inner: Mutex<LruKInner>,
}

impl LruKReplacer {
    /// Creates a replacer tracking up to `capacity` frames with
    /// parameter `k`.
    pub fn new(capacity: usize, k: usize) -> Self {
        assert!(k >= 1, "k must be at least 1");
        Self {
            capacity,
            k,
            inner: Mutex::new(LruKInner {
                history: VecDeque::new(),
                cache: VecDeque::new(),
                frames: vec![
                    FrameInfo {
                        accesses: 0,
                        state: TrackState::Untracked,
                    };
                    capacity
                ],
                evictable: 0,
            }),
        }
    }

    /// Returns the tracking capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn drop_from_queue(queue: &mut VecDeque<FrameId>, frame_id: FrameId) {
        if let Some(pos) = queue.iter().position(|&f| f == frame_id) {
            queue.remove(pos);
        }
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&self, frame_id: FrameId) {
        let idx = frame_id.0 as usize;
        if idx >= self.capacity {
            return;
        }

        let mut inner = self.inner.lock();
        inner.frames[idx].accesses += 1;
        let accesses = inner.frames[idx].accesses;

        if accesses == 1 {
            inner.frames[idx].state = TrackState::Pinned;
            if self.k == 1 {
                inner.cache.push_back(frame_id);
            } else {
                inner.history.push_back(frame_id);
            }
        } else if accesses == self.k {
            // promotion: leave the history queue for the cache queue
            Self::drop_from_queue(&mut inner.history, frame_id);
            inner.cache.push_back(frame_id);
        } else if accesses > self.k {
            Self::drop_from_queue(&mut inner.cache, frame_id);
            inner.cache.push_back(frame_id);
        }
        // frames with 1 < accesses < k keep their history position:
        // the queue orders by first access
    }

    fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let idx = frame_id.0 as usize;
        if idx >= self.capacity {
            return;
        }

        let mut inner = self.inner.lock();
        match (inner.frames[idx].state, evictable) {
            (TrackState::Pinned, true) => {
                inner.frames[idx].state = TrackState::Evictable;
                inner.evictable += 1;
            }
            (TrackState::Evictable, false) => {
                inner.frames[idx].state = TrackState::Pinned;
                inner.evictable -= 1;
            }
            _ => {}
        }
    }

    fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        if inner.evictable == 0 {
            return None;
        }

        let from_history = inner
            .history
            .iter()
            .position(|&f| inner.frames[f.0 as usize].state == TrackState::Evictable);
        let victim = match from_history {
            Some(pos) => inner.history.remove(pos)?,
            None => {
                let pos = inner
                    .cache
                    .iter()
                    .position(|&f| inner.frames[f.0 as usize].state == TrackState::Evictable)?;
                inner.cache.remove(pos)?
            }
        };
        let idx = victim.0 as usize;
        inner.frames[idx] = FrameInfo {
            accesses: 0,
            state: TrackState::Untracked,
        };
        inner.evictable -= 1;
        Some(victim)
    }

    fn remove(&self, frame_id: FrameId) {
        let idx = frame_id.0 as usize;
        if idx >= self.capacity {
            return;
        }

        let mut inner = self.inner.lock();
        if inner.frames[idx].state != TrackState::Evictable {
            return;
        }

        if inner.frames[idx].accesses < self.k {
            Self::drop_from_queue(&mut inner.history, frame_id);
        } else {
            Self::drop_from_queue(&mut inner.cache, frame_id);
        }
        inner.frames[idx] = FrameInfo {
            accesses: 0,
            state: TrackState::Untracked,
        };
        inner.evictable -= 1;
    }

    fn size(&self) -> usize {
        self.inner.lock().evictable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evict_empty() {
        let replacer = LruKReplacer::new(10, 2);
        assert_eq!(replacer.capacity(), 10);
        assert_eq!(replacer.size(), 0);
        assert!(replacer.evict().is_none());
    }

    #[test]
    fn test_new_frames_start_pinned() {
        let replacer = LruKReplacer::new(10, 2);
        replacer.record_access(FrameId(0));
        assert_eq!(replacer.size(), 0);
        assert!(replacer.evict().is_none());

        replacer.set_evictable(FrameId(0), true);
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(FrameId(0)));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_history_before_cache() {
        // A frame touched once is evicted before a frame touched twice.
        let replacer = LruKReplacer::new(10, 2);
        replacer.record_access(FrameId(0));
        replacer.record_access(FrameId(0));
        replacer.record_access(FrameId(1));
        replacer.set_evictable(FrameId(0), true);
        replacer.set_evictable(FrameId(1), true);

        assert_eq!(replacer.evict(), Some(FrameId(1)));
        assert_eq!(replacer.evict(), Some(FrameId(0)));
    }

    #[test]
    fn test_history_orders_by_first_access() {
        let replacer = LruKReplacer::new(10, 3);
        replacer.record_access(FrameId(0));
        replacer.record_access(FrameId(1));
        // a second access below k keeps frame 0's history position
        replacer.record_access(FrameId(0));
        replacer.set_evictable(FrameId(0), true);
        replacer.set_evictable(FrameId(1), true);

        assert_eq!(replacer.evict(), Some(FrameId(0)));
        assert_eq!(replacer.evict(), Some(FrameId(1)));
    }

    #[test]
    fn test_cache_orders_by_last_access() {
        let replacer = LruKReplacer::new(10, 2);
        for f in [0, 1] {
            replacer.record_access(FrameId(f));
            replacer.record_access(FrameId(f));
            replacer.set_evictable(FrameId(f), true);
        }
        // both cached; refresh frame 0 so frame 1 becomes the victim
        replacer.record_access(FrameId(0));

        assert_eq!(replacer.evict(), Some(FrameId(1)));
        assert_eq!(replacer.evict(), Some(FrameId(0)));
    }

    #[test]
    fn test_eviction_scenario() {
        let replacer = LruKReplacer::new(7, 2);

        for f in 1..=6 {
            replacer.record_access(FrameId(f));
        }
        for f in 1..=5 {
            replacer.set_evictable(FrameId(f), true);
        }
        assert_eq!(replacer.size(), 5);

        // frame 1 reaches k accesses and moves to the cache queue
        replacer.record_access(FrameId(1));

        // toggling evictability is idempotent
        replacer.set_evictable(FrameId(1), false);
        assert_eq!(replacer.size(), 4);
        replacer.set_evictable(FrameId(1), true);
        replacer.set_evictable(FrameId(1), true);
        assert_eq!(replacer.size(), 5);

        // history frames go first, in first-access order; 6 is pinned
        for expected in [2, 3, 4, 5] {
            assert_eq!(replacer.evict(), Some(FrameId(expected)));
        }
        assert_eq!(replacer.size(), 1);

        replacer.set_evictable(FrameId(6), true);
        assert_eq!(replacer.evict(), Some(FrameId(6)));
        assert_eq!(replacer.evict(), Some(FrameId(1)));
        assert!(replacer.evict().is_none());
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_evict_with_no_evictable_candidates() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId(0));
        replacer.record_access(FrameId(1));

        // all pinned: evict must fail without disturbing the count
        assert!(replacer.evict().is_none());
        assert_eq!(replacer.size(), 0);

        replacer.set_evictable(FrameId(1), true);
        assert_eq!(replacer.evict(), Some(FrameId(1)));
    }

    #[test]
    fn test_remove_requires_evictable() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId(0));

        // pinned: no-op
        replacer.remove(FrameId(0));
        replacer.set_evictable(FrameId(0), true);
        assert_eq!(replacer.size(), 1);

        replacer.remove(FrameId(0));
        assert_eq!(replacer.size(), 0);
        assert!(replacer.evict().is_none());

        // untracked: no-op
        replacer.remove(FrameId(0));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_removed_frame_restarts_history() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId(0));
        replacer.record_access(FrameId(0));
        replacer.set_evictable(FrameId(0), true);
        replacer.remove(FrameId(0));

        // re-tracked frames start from a fresh access count
        replacer.record_access(FrameId(1));
        replacer.record_access(FrameId(0));
        replacer.set_evictable(FrameId(0), true);
        replacer.set_evictable(FrameId(1), true);
        assert_eq!(replacer.evict(), Some(FrameId(1)));
        assert_eq!(replacer.evict(), Some(FrameId(0)));
    }

    #[test]
    fn test_out_of_range_frames_ignored() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId(100));
        replacer.set_evictable(FrameId(100), true);
        replacer.remove(FrameId(100));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_k_equal_one_behaves_like_lru() {
        let replacer = LruKReplacer::new(4, 1);
        for f in 0..3 {
            replacer.record_access(FrameId(f));
            replacer.set_evictable(FrameId(f), true);
        }
        replacer.record_access(FrameId(0));

        assert_eq!(replacer.evict(), Some(FrameId(1)));
        assert_eq!(replacer.evict(), Some(FrameId(2)));
        assert_eq!(replacer.evict(), Some(FrameId(0)));
    }
}
