//! Swap-on-publish hand-off between the layout thread and the render loop.
//!
//! The writer builds a new immutable snapshot and replaces the current
//! `Arc` under a short lock; readers clone the `Arc` and keep drawing from
//! it for as long as they like. Snapshots are never mutated in place.
//! A version counter lets a reader skip the lock when nothing changed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use quill_text::GlyphGeometry;

/// Slot carrying the latest published value of `T`.
#[derive(Debug, Default)]
pub struct PublishSlot<T> {
    version: AtomicU64,
    current: Mutex<Arc<T>>,
}

/// Slot for the geometry of the line being edited.
pub type GeometrySlot = PublishSlot<GlyphGeometry>;

impl<T> PublishSlot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            version: AtomicU64::new(0),
            current: Mutex::new(Arc::new(initial)),
        }
    }

    /// Replace the current snapshot. Returns the new version.
    pub fn publish(&self, value: T) -> u64 {
        let value = Arc::new(value);
        // Poisoning cannot leave a partial snapshot behind.
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let old = std::mem::replace(&mut *current, value);
        let version = self.version.fetch_add(1, Ordering::Release) + 1;
        drop(current);
        // The old snapshot is freed outside the lock, or by its last reader.
        drop(old);
        version
    }

    /// Current version and snapshot, read together.
    pub fn snapshot(&self) -> (u64, Arc<T>) {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        (self.version.load(Ordering::Acquire), Arc::clone(&current))
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<T> {
        self.snapshot().1
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

/// Reader-side cache: holds the last snapshot seen and refreshes it only
/// when the slot's version moved.
#[derive(Debug)]
pub struct SlotReader<T> {
    slot: Arc<PublishSlot<T>>,
    seen: u64,
    cached: Arc<T>,
}

impl<T> SlotReader<T> {
    pub fn new(slot: Arc<PublishSlot<T>>) -> Self {
        let (seen, cached) = slot.snapshot();
        Self { slot, seen, cached }
    }

    /// Pull the latest snapshot if one was published. Returns `true` when
    /// the cached value changed.
    pub fn sync(&mut self) -> bool {
        if self.slot.version() == self.seen {
            return false;
        }
        let (seen, cached) = self.slot.snapshot();
        self.seen = seen;
        self.cached = cached;
        true
    }

    pub fn current(&self) -> &Arc<T> {
        &self.cached
    }

    pub fn version(&self) -> u64 {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn geometry(quads: usize) -> GlyphGeometry {
        GlyphGeometry {
            vertices: vec![0.0; quads * 16],
            indices: (0..quads)
                .flat_map(|q| {
                    let b = (q * 4) as u16;
                    [b, b + 1, b + 2, b + 2, b + 3, b]
                })
                .collect(),
        }
    }

    #[test]
    fn test_publish_bumps_version() {
        let slot = GeometrySlot::default();
        assert_eq!(slot.version(), 0);
        assert!(slot.load().is_empty());

        assert_eq!(slot.publish(geometry(2)), 1);
        assert_eq!(slot.publish(geometry(3)), 2);
        let (version, snapshot) = slot.snapshot();
        assert_eq!(version, 2);
        assert_eq!(snapshot.quad_count(), 3);
    }

    #[test]
    fn test_old_snapshot_survives_publish() {
        let slot = GeometrySlot::new(geometry(1));
        let held = slot.load();
        slot.publish(geometry(5));
        assert_eq!(held.quad_count(), 1);
        assert_eq!(slot.load().quad_count(), 5);
    }

    #[test]
    fn test_reader_syncs_only_on_change() {
        let slot = Arc::new(GeometrySlot::new(geometry(1)));
        let mut reader = SlotReader::new(Arc::clone(&slot));
        assert!(!reader.sync());
        assert_eq!(reader.current().quad_count(), 1);

        slot.publish(geometry(4));
        assert!(reader.sync());
        assert_eq!(reader.version(), 1);
        assert_eq!(reader.current().quad_count(), 4);
        assert!(!reader.sync());
    }

    #[test]
    fn test_concurrent_publish_and_read() {
        let slot = Arc::new(GeometrySlot::new(geometry(0)));

        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for n in 1..=200 {
                    slot.publish(geometry(n % 7));
                }
            })
        };

        let reader = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..1000 {
                    let (version, snapshot) = slot.snapshot();
                    assert!(version >= last);
                    // Every snapshot is a complete geometry.
                    assert_eq!(snapshot.vertex_count(), snapshot.quad_count() * 4);
                    last = version;
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(slot.version(), 200);
        assert_eq!(slot.load().quad_count(), 200 % 7);
    }
}
