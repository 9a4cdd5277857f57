//! The engine-owned map of chunk light and its persisted form.

use lumen_utils::{BlockPos, ChunkPos};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::chunk_light::ChunkLight;
use crate::{block::LightChannel, error::LightError};

/// Light of one chunk, detached from any world.
///
/// Both arrays hold one level per byte, index `x + z * 16 + (y - world_min_y) * 256`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSnapshot {
    /// Chunk the light belongs to.
    pub pos: ChunkPos,
    /// Exclusive top y the light was computed for.
    pub world_height: i32,
    /// Lowest y the light was computed for.
    pub world_min_y: i32,
    /// Block light levels.
    pub block_light: Vec<u8>,
    /// Sky light levels.
    pub sky_light: Vec<u8>,
}

#[inline]
fn snapshot_index(x: usize, y: i32, z: usize, min_y: i32) -> usize {
    x + z * 16 + (y - min_y) as usize * 256
}

/// Light for every chunk the engine has touched, plus the logical clock used to
/// stamp modifications.
#[derive(Debug)]
pub struct LightHolder {
    min_y: i32,
    height: i32,
    chunks: FxHashMap<ChunkPos, ChunkLight>,
    clock: u64,
}

impl LightHolder {
    /// An empty holder for a world covering `min_y..height`.
    #[must_use]
    pub fn new(min_y: i32, height: i32) -> Self {
        Self {
            min_y,
            height,
            chunks: FxHashMap::default(),
            clock: 0,
        }
    }

    /// Lowest y of the world.
    #[must_use]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Exclusive top y of the world.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `y` lies inside the world.
    #[must_use]
    pub fn contains_y(&self, y: i32) -> bool {
        (self.min_y..self.height).contains(&y)
    }

    /// Starts a new logical instant and returns it.
    pub fn advance_clock(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Whether light is stored for `pos`.
    #[must_use]
    pub fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Number of chunks with stored light.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no light is stored at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Stored light of a chunk.
    #[must_use]
    pub fn chunk(&self, pos: ChunkPos) -> Option<&ChunkLight> {
        self.chunks.get(&pos)
    }

    /// Stored light of a chunk, created dark if missing.
    pub fn get_or_create(&mut self, pos: ChunkPos) -> &mut ChunkLight {
        let (min_y, height) = (self.min_y, self.height);
        self.chunks
            .entry(pos)
            .or_insert_with(|| ChunkLight::new(pos, min_y, height))
    }

    /// Light at a world position. `None` when out of range or not stored.
    #[must_use]
    pub fn get(&self, channel: LightChannel, pos: BlockPos) -> Option<u8> {
        if !self.contains_y(pos.y()) {
            return None;
        }
        self.chunks
            .get(&pos.chunk_pos())
            .map(|chunk| chunk.get(channel, pos.local_x(), pos.y(), pos.local_z()))
    }

    /// Writes light at a world position, creating the chunk if needed.
    ///
    /// Out-of-range y is ignored. Returns whether the stored value changed.
    pub fn set(&mut self, channel: LightChannel, pos: BlockPos, level: u8) -> bool {
        if !self.contains_y(pos.y()) {
            return false;
        }
        let now = self.clock;
        self.get_or_create(pos.chunk_pos())
            .set(channel, pos.local_x(), pos.y(), pos.local_z(), level, now)
    }

    /// Chunks changed at or after `since`, ordered by position.
    #[must_use]
    pub fn modified_since(&self, since: u64) -> Vec<ChunkPos> {
        let mut modified: Vec<ChunkPos> = self
            .chunks
            .values()
            .filter(|chunk| chunk.modified_at() >= since)
            .map(ChunkLight::pos)
            .collect();
        modified.sort_unstable_by_key(|pos| (pos.x(), pos.z()));
        modified
    }

    /// Drops a chunk's light, returning it.
    pub fn unload_chunk(&mut self, pos: ChunkPos) -> Option<ChunkLight> {
        self.chunks.remove(&pos)
    }

    /// Copies a chunk's light into a snapshot.
    #[must_use]
    pub fn dump_chunk(&self, pos: ChunkPos) -> Option<LightSnapshot> {
        let chunk = self.chunks.get(&pos)?;
        let volume = 256 * (self.height - self.min_y).max(0) as usize;
        let mut block_light = vec![0; volume];
        let mut sky_light = vec![0; volume];
        for y in self.min_y..self.height {
            for z in 0..16 {
                for x in 0..16 {
                    let index = snapshot_index(x, y, z, self.min_y);
                    block_light[index] = chunk.get(LightChannel::Block, x, y, z);
                    sky_light[index] = chunk.get(LightChannel::Sky, x, y, z);
                }
            }
        }
        Some(LightSnapshot {
            pos,
            world_height: self.height,
            world_min_y: self.min_y,
            block_light,
            sky_light,
        })
    }

    /// Replaces a chunk's light with a snapshot taken for the same world dimensions.
    pub fn load_chunk(&mut self, snapshot: &LightSnapshot) -> Result<(), LightError> {
        let volume = 256 * (self.height - self.min_y).max(0) as usize;
        if snapshot.world_height != self.height
            || snapshot.world_min_y != self.min_y
            || snapshot.block_light.len() != volume
            || snapshot.sky_light.len() != volume
        {
            return Err(LightError::SnapshotMismatch {
                pos: snapshot.pos,
                snapshot_min_y: snapshot.world_min_y,
                snapshot_height: snapshot.world_height,
                world_min_y: self.min_y,
                world_height: self.height,
            });
        }

        let now = self.clock;
        let mut chunk = ChunkLight::new(snapshot.pos, self.min_y, self.height);
        for y in self.min_y..self.height {
            for z in 0..16 {
                for x in 0..16 {
                    let index = snapshot_index(x, y, z, self.min_y);
                    chunk.set(LightChannel::Block, x, y, z, snapshot.block_light[index], now);
                    chunk.set(LightChannel::Sky, x, y, z, snapshot.sky_light[index], now);
                }
            }
        }
        self.chunks.insert(snapshot.pos, chunk);
        Ok(())
    }
}
