//! 2-element LRU cache of chunk availability during propagation.

use lumen_utils::ChunkPos;

/// Remembers whether the two most recently queried chunks are loaded.
///
/// Flood fills hit the same one or two chunks over and over; caching spares a
/// world lookup per neighbour. Availability must not change while a cache is
/// alive, so one cache lives for exactly one pass over the world.
#[derive(Debug, Default)]
pub struct ChunkCache {
    slots: [Option<(ChunkPos, bool)>; 2],
    /// Which slot was used last.
    recent: usize,
}

impl ChunkCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached availability of `pos`, if present.
    pub fn get(&mut self, pos: ChunkPos) -> Option<bool> {
        let index = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Some((cached, _)) if *cached == pos))?;
        self.recent = index;
        self.slots[index].map(|(_, loaded)| loaded)
    }

    /// Records availability of `pos`, evicting the least recently used slot.
    pub fn insert(&mut self, pos: ChunkPos, loaded: bool) {
        let victim = 1 - self.recent;
        self.slots[victim] = Some((pos, loaded));
        self.recent = victim;
    }

    /// Availability of `pos`, asking `lookup` on a miss.
    pub fn get_or_insert_with(&mut self, pos: ChunkPos, lookup: impl FnOnce() -> bool) -> bool {
        if let Some(loaded) = self.get(pos) {
            return loaded;
        }
        let loaded = lookup();
        self.insert(pos, loaded);
        loaded
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.slots = [None, None];
        self.recent = 0;
    }
}
