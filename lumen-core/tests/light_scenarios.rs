#![allow(missing_docs)]
//! End-to-end lighting behaviour over an in-memory world.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::anyhow;
use lumen_core::{
    BlockProperties, ColumnUpdate, LightChannel, LightConfig, LightError, LightSnapshot,
    LightWorld, MemoryWorld, VoxelWorld,
    world::blocks::{AIR, GLOWSTONE, STONE, WATER},
};
use lumen_utils::{BlockPos, ChunkPos};

const ORIGIN: ChunkPos = ChunkPos::new(0, 0);
const EAST: ChunkPos = ChunkPos::new(1, 0);

fn block_only_world() -> Arc<MemoryWorld> {
    let world = MemoryWorld::new(0, 128).with_sky_light(false);
    world.load_chunk(ORIGIN);
    Arc::new(world)
}

async fn relight<W: VoxelWorld>(engine: &LightWorld<W>, chunks: &[ChunkPos]) {
    for &chunk in chunks {
        let update = engine
            .request_column_update(chunk)
            .await
            .expect("column is loaded");
        assert!(matches!(update, ColumnUpdate::Completed(_)));
    }
}

fn snapshots<W: VoxelWorld>(engine: &LightWorld<W>, chunks: &[ChunkPos]) -> Vec<LightSnapshot> {
    chunks
        .iter()
        .map(|&chunk| engine.dump_chunk(chunk).expect("chunk has light"))
        .collect()
}

fn block(engine: &LightWorld<MemoryWorld>, x: i32, y: i32, z: i32) -> Option<u8> {
    engine.block_light(BlockPos::new(x, y, z))
}

fn sky(engine: &LightWorld<MemoryWorld>, x: i32, y: i32, z: i32) -> Option<u8> {
    engine.sky_light(BlockPos::new(x, y, z))
}

/// Stone floor, a glowstone close to the east edge, a slab hanging over the
/// chunk border and a small pool. Split by chunk so halves can load separately.
fn build_west(world: &MemoryWorld) {
    world
        .fill(BlockPos::new(0, 50, 0), BlockPos::new(15, 59, 15), &STONE)
        .expect("in range");
    world
        .fill(BlockPos::new(12, 70, 4), BlockPos::new(15, 70, 10), &STONE)
        .expect("in range");
    world
        .fill(BlockPos::new(2, 60, 2), BlockPos::new(5, 62, 5), &WATER)
        .expect("in range");
    world
        .set_block(BlockPos::new(14, 60, 8), &GLOWSTONE)
        .expect("in range");
}

fn build_east(world: &MemoryWorld) {
    world
        .fill(BlockPos::new(16, 50, 0), BlockPos::new(31, 59, 15), &STONE)
        .expect("in range");
    world
        .fill(BlockPos::new(16, 70, 4), BlockPos::new(20, 70, 10), &STONE)
        .expect("in range");
    world
        .set_block(BlockPos::new(24, 64, 3), &GLOWSTONE)
        .expect("in range");
}

fn scene_world() -> Arc<MemoryWorld> {
    let world = MemoryWorld::new(0, 96);
    build_west(&world);
    build_east(&world);
    Arc::new(world)
}

#[tokio::test]
async fn scenario_a_single_emitter_attenuates_by_distance() {
    let world = block_only_world();
    world
        .set_block(BlockPos::new(5, 64, 5), &GLOWSTONE)
        .expect("in range");
    let engine = LightWorld::new(world);
    relight(&engine, &[ORIGIN]).await;

    assert_eq!(block(&engine, 5, 64, 5), Some(15));
    assert_eq!(block(&engine, 5, 64, 10), Some(10));
    assert_eq!(block(&engine, 5, 69, 5), Some(10));
    assert_eq!(block(&engine, 15, 100, 15), Some(0));
    assert_eq!(block(&engine, 5, 64, 25), None);

    // The immediate path reaches the same values.
    let immediate = LightWorld::new(block_only_world());
    immediate
        .set_block(BlockPos::new(5, 64, 5), GLOWSTONE)
        .expect("in range");
    assert_eq!(block(&immediate, 5, 64, 10), Some(10));
    assert_eq!(
        snapshots(&immediate, &[ORIGIN]),
        snapshots(&engine, &[ORIGIN])
    );
}

#[tokio::test]
async fn scenario_b_light_goes_around_an_obstruction() {
    let engine = LightWorld::new(block_only_world());
    engine
        .set_block(BlockPos::new(5, 64, 5), GLOWSTONE)
        .expect("in range");
    assert_eq!(block(&engine, 5, 64, 6), Some(14));
    engine
        .set_block(BlockPos::new(5, 64, 6), STONE)
        .expect("in range");

    assert_eq!(block(&engine, 5, 64, 6), Some(0));
    assert_eq!(block(&engine, 5, 64, 7), Some(11));

    relight(&engine, &[ORIGIN]).await;
    assert_eq!(block(&engine, 5, 64, 6), Some(0));
    assert_eq!(block(&engine, 5, 64, 7), Some(11));
}

#[tokio::test]
async fn scenario_c_filtering_medium_costs_its_filter() {
    let engine = LightWorld::new(block_only_world());
    engine
        .set_block(BlockPos::new(5, 64, 5), GLOWSTONE)
        .expect("in range");
    assert_eq!(block(&engine, 5, 63, 5), Some(14));

    engine
        .set_block(BlockPos::new(5, 63, 5), WATER)
        .expect("in range");
    assert_eq!(block(&engine, 5, 63, 5), Some(13));
    assert_eq!(block(&engine, 5, 62, 5), Some(12));
}

#[tokio::test]
async fn scenario_d_overlapping_emitters_take_the_maximum() {
    let world = block_only_world();
    world
        .set_block(BlockPos::new(2, 64, 5), &GLOWSTONE)
        .expect("in range");
    world
        .set_block(BlockPos::new(9, 64, 5), &GLOWSTONE)
        .expect("in range");
    let engine = LightWorld::new(world);
    relight(&engine, &[ORIGIN]).await;

    assert_eq!(block(&engine, 5, 64, 5), Some(12));
    assert_eq!(block(&engine, 6, 64, 5), Some(12));
    assert_eq!(block(&engine, 5, 65, 5), Some(11));
}

#[tokio::test]
async fn scenario_e_deferred_edge_matches_loading_both_chunks() {
    let reference = LightWorld::new(scene_world());
    relight(&reference, &[ORIGIN, EAST]).await;

    let world = MemoryWorld::new(0, 96);
    build_west(&world);
    let world = Arc::new(world);
    let engine = LightWorld::new(Arc::clone(&world));
    relight(&engine, &[ORIGIN]).await;

    assert!(engine.pending_light_for(EAST) > 0);
    assert_eq!(block(&engine, 16, 60, 8), None);

    build_east(&world);
    relight(&engine, &[EAST]).await;

    assert_eq!(engine.pending_light_for(EAST), 0);
    assert_eq!(block(&engine, 16, 60, 8), Some(13));
    assert_eq!(
        snapshots(&engine, &[ORIGIN, EAST]),
        snapshots(&reference, &[ORIGIN, EAST])
    );
}

#[tokio::test]
async fn sky_light_fills_open_air_and_bends_under_overhangs() {
    let engine = LightWorld::new(scene_world());
    relight(&engine, &[ORIGIN, EAST]).await;

    assert_eq!(sky(&engine, 0, 95, 0), Some(15));
    assert_eq!(sky(&engine, 0, 60, 0), Some(15));
    assert_eq!(sky(&engine, 0, 59, 0), Some(0));
    // Under the slab, counted from the open column at x = 11.
    assert_eq!(sky(&engine, 12, 69, 7), Some(14));
    assert_eq!(sky(&engine, 14, 69, 7), Some(12));
    assert_eq!(sky(&engine, 12, 65, 7), Some(14));
    // The pool sits on the floor, so the open sky reaches its bottom.
    for y in 60..=62 {
        assert_eq!(sky(&engine, 3, y, 3), Some(15));
    }
}

#[tokio::test]
async fn directional_hints_do_not_change_the_result() {
    let chunks = [ORIGIN, EAST];
    let hinted = LightWorld::with_config(
        scene_world(),
        LightConfig {
            directional_hints: true,
            ..LightConfig::default()
        },
    );
    let plain = LightWorld::with_config(
        scene_world(),
        LightConfig {
            directional_hints: false,
            ..LightConfig::default()
        },
    );
    relight(&hinted, &chunks).await;
    relight(&plain, &chunks).await;
    assert_eq!(snapshots(&hinted, &chunks), snapshots(&plain, &chunks));

    for engine in [&hinted, &plain] {
        engine
            .set_block(BlockPos::new(8, 60, 8), STONE)
            .expect("in range");
        engine
            .set_block(BlockPos::new(13, 70, 6), AIR)
            .expect("in range");
    }
    assert_eq!(snapshots(&hinted, &chunks), snapshots(&plain, &chunks));
}

#[tokio::test]
async fn heightmap_and_scan_agree() {
    let chunks = [ORIGIN, EAST];
    let scanned = LightWorld::new(scene_world());

    let world = MemoryWorld::new(0, 96).with_heightmap(true);
    build_west(&world);
    build_east(&world);
    let mapped = LightWorld::new(Arc::new(world));

    relight(&scanned, &chunks).await;
    relight(&mapped, &chunks).await;
    assert_eq!(snapshots(&scanned, &chunks), snapshots(&mapped, &chunks));
}

#[tokio::test]
async fn column_update_is_idempotent() {
    let chunks = [ORIGIN, EAST];
    let engine = LightWorld::new(scene_world());
    relight(&engine, &chunks).await;
    let first = snapshots(&engine, &chunks);

    relight(&engine, &chunks).await;
    assert_eq!(snapshots(&engine, &chunks), first);
}

#[tokio::test]
async fn neighbour_updates_never_darken_a_lit_column() {
    let engine = LightWorld::new(scene_world());
    relight(&engine, &[ORIGIN]).await;
    let before = snapshots(&engine, &[ORIGIN]);

    relight(&engine, &[EAST]).await;
    let after = snapshots(&engine, &[ORIGIN]);

    for (old, new) in before[0].block_light.iter().zip(&after[0].block_light) {
        assert!(new >= old);
    }
    for (old, new) in before[0].sky_light.iter().zip(&after[0].sky_light) {
        assert!(new >= old);
    }
}

#[tokio::test]
async fn placing_and_removing_an_emitter_restores_light() {
    let chunks = [ORIGIN, EAST];
    let engine = LightWorld::new(scene_world());
    relight(&engine, &chunks).await;
    let before = snapshots(&engine, &chunks);

    let pos = BlockPos::new(10, 65, 12);
    let affected = engine.set_block(pos, GLOWSTONE).expect("in range");
    assert!(affected.contains(&ORIGIN));
    assert_eq!(engine.block_light(pos), Some(15));
    engine.set_block(pos, AIR).expect("in range");

    assert_eq!(snapshots(&engine, &chunks), before);
}

#[tokio::test]
async fn light_values_stay_in_range() {
    let chunks = [ORIGIN, EAST];
    let engine = LightWorld::new(scene_world());
    relight(&engine, &chunks).await;
    for snapshot in snapshots(&engine, &chunks) {
        assert!(snapshot.block_light.iter().all(|&level| level <= 15));
        assert!(snapshot.sky_light.iter().all(|&level| level <= 15));
    }
}

#[tokio::test]
async fn deferred_changes_apply_together() {
    let immediate = LightWorld::new(block_only_world());
    let deferred = LightWorld::new(block_only_world());
    let changes = [
        (BlockPos::new(3, 64, 3), GLOWSTONE),
        (BlockPos::new(4, 64, 3), STONE),
        (BlockPos::new(3, 64, 3), AIR),
        (BlockPos::new(10, 64, 10), GLOWSTONE),
    ];

    for (pos, block) in changes {
        immediate.set_block(pos, block).expect("in range");
        deferred.set_block_deferred(pos, block).expect("in range");
    }
    assert_eq!(deferred.block_light(BlockPos::new(10, 64, 10)), None);

    let affected = deferred.run_light_updates().expect("world is healthy");
    assert_eq!(affected, vec![ORIGIN]);
    assert_eq!(
        snapshots(&deferred, &[ORIGIN]),
        snapshots(&immediate, &[ORIGIN])
    );
    assert!(deferred.run_light_updates().expect("nothing staged").is_empty());
}

#[tokio::test]
async fn out_of_range_positions_are_ignored() {
    let engine = LightWorld::new(block_only_world());
    for y in [-1, 128] {
        let affected = engine
            .set_block(BlockPos::new(0, y, 0), GLOWSTONE)
            .expect("ignored");
        assert!(affected.is_empty());
    }
    assert_eq!(engine.block_light(BlockPos::new(0, 128, 0)), None);
}

#[tokio::test]
async fn newer_request_supersedes_a_pending_one() {
    let world = block_only_world();
    world
        .set_block(BlockPos::new(8, 64, 8), &GLOWSTONE)
        .expect("in range");
    let engine = LightWorld::new(world);

    let (first, second) = futures::join!(
        engine.request_column_update(ORIGIN),
        engine.request_column_update(ORIGIN)
    );
    assert!(matches!(first, Ok(ColumnUpdate::Cancelled)));
    match second {
        Ok(ColumnUpdate::Completed(affected)) => assert_eq!(affected, vec![ORIGIN]),
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(engine.stats().cancelled_jobs, 1);
    assert_eq!(block(&engine, 8, 64, 9), Some(14));
}

#[tokio::test]
async fn requests_for_different_columns_all_complete() {
    let engine = LightWorld::new(scene_world());
    let (west, east) = futures::join!(
        engine.request_column_update(ORIGIN),
        engine.request_column_update(EAST)
    );
    assert!(matches!(west, Ok(ColumnUpdate::Completed(_))));
    assert!(matches!(east, Ok(ColumnUpdate::Completed(_))));
}

#[tokio::test]
async fn unloaded_column_is_an_error() {
    let engine = LightWorld::new(block_only_world());
    let err = engine
        .request_column_update(ChunkPos::new(7, 7))
        .await
        .expect_err("not loaded");
    assert!(matches!(err, LightError::ChunkNotLoaded(pos) if pos == ChunkPos::new(7, 7)));
}

#[tokio::test]
async fn single_block_update_goes_through_the_scheduler() {
    let engine = LightWorld::new(block_only_world());
    let update = engine
        .set_block_and_update(BlockPos::new(4, 64, 4), GLOWSTONE)
        .await
        .expect("loaded");
    assert_eq!(update, ColumnUpdate::Completed(vec![ORIGIN]));
    assert_eq!(block(&engine, 4, 64, 5), Some(14));

    // Swapping a block for an identical one has nothing to relight.
    let update = engine
        .set_block_and_update(BlockPos::new(4, 64, 4), GLOWSTONE)
        .await
        .expect("loaded");
    assert_eq!(update, ColumnUpdate::Completed(Vec::new()));
}

#[tokio::test]
async fn unloading_drops_deferred_entries_and_keeps_light() {
    let engine = LightWorld::new(block_only_world());
    engine
        .set_block(BlockPos::new(15, 64, 8), GLOWSTONE)
        .expect("in range");
    relight(&engine, &[ORIGIN]).await;
    assert!(engine.pending_light_for(EAST) > 0);

    engine.unload_column(ORIGIN);
    assert_eq!(engine.pending_light_for(EAST), 0);
    assert_eq!(block(&engine, 15, 64, 8), Some(15));
    assert!(engine.dump_chunk(ORIGIN).is_some());
}

#[tokio::test]
async fn reloaded_column_retracts_light_it_spread_before_unloading() {
    let world = block_only_world();
    world.load_chunk(EAST);
    world
        .set_block(BlockPos::new(15, 10, 8), &GLOWSTONE)
        .expect("in range");
    let engine = LightWorld::new(Arc::clone(&world));
    relight(&engine, &[ORIGIN, EAST]).await;
    assert_eq!(block(&engine, 16, 10, 8), Some(14));

    engine.unload_column(ORIGIN);
    world.unload_chunk(ORIGIN);
    world.load_chunk(ORIGIN);
    relight(&engine, &[ORIGIN]).await;

    assert_eq!(block(&engine, 15, 10, 8), Some(0));
    assert_eq!(block(&engine, 16, 10, 8), Some(0));
    assert_eq!(block(&engine, 20, 10, 8), Some(0));
}

#[tokio::test]
async fn snapshot_reload_skips_recomputation() {
    let engine = LightWorld::new(scene_world());
    relight(&engine, &[ORIGIN, EAST]).await;
    let snapshot = engine.dump_chunk(ORIGIN).expect("lit");

    let json = serde_json::to_string(&snapshot).expect("serialize");
    let restored: LightSnapshot = serde_json::from_str(&json).expect("deserialize");

    let fresh = LightWorld::new(scene_world());
    assert_eq!(sky(&fresh, 0, 95, 0), None);
    fresh.load_chunk(&restored).expect("same world");
    assert_eq!(sky(&fresh, 0, 95, 0), Some(15));
    assert_eq!(fresh.dump_chunk(ORIGIN), Some(snapshot));

    let foreign = LightSnapshot {
        world_height: 256,
        ..restored
    };
    assert!(matches!(
        fresh.load_chunk(&foreign),
        Err(LightError::SnapshotMismatch { .. })
    ));
}

#[tokio::test]
async fn write_back_copies_light_into_the_world() {
    let world = block_only_world();
    world
        .set_block(BlockPos::new(6, 64, 6), &GLOWSTONE)
        .expect("in range");
    let engine = LightWorld::with_config(
        Arc::clone(&world),
        LightConfig {
            write_back_light: true,
            ..LightConfig::default()
        },
    );
    relight(&engine, &[ORIGIN]).await;

    let pos = BlockPos::new(6, 64, 9);
    assert_eq!(world.block_light(pos), Some(12));
    assert_eq!(world.block_light(pos), engine.block_light(pos));
}

#[tokio::test]
async fn debug_slice_marks_missing_chunks() {
    let engine = LightWorld::new(block_only_world());
    engine
        .set_block(BlockPos::new(1, 64, 5), GLOWSTONE)
        .expect("in range");

    let slice = engine.light_levels_string(-1, 4, 64, 3, 5, LightChannel::Block);
    assert_eq!(
        slice,
        "| -- | 13 | 14 | 13 | 12 |\n| -- | 14 | 15 | 14 | 13 |"
    );
}

#[tokio::test]
async fn stats_track_work() {
    let engine = LightWorld::new(scene_world());
    relight(&engine, &[ORIGIN]).await;
    let stats = engine.stats();
    let columns = stats
        .operation(lumen_core::stats::COLUMN_UPDATE)
        .expect("recorded");
    assert_eq!(columns.calls, 1);
    assert!(stats.voxels_visited > 0);
    assert!(stats.to_string().contains("column_update"));
}

/// A world whose block reads can be made to fail, optionally with one voxel
/// that never has block data.
struct FlakyWorld {
    inner: MemoryWorld,
    failing: AtomicBool,
    missing: Option<BlockPos>,
}

impl VoxelWorld for FlakyWorld {
    fn world_height(&self) -> i32 {
        self.inner.world_height()
    }

    fn world_min_y(&self) -> i32 {
        self.inner.world_min_y()
    }

    fn supports_sky_light(&self) -> bool {
        self.inner.supports_sky_light()
    }

    fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.inner.has_chunk(pos)
    }

    fn block(&self, pos: BlockPos) -> anyhow::Result<Option<BlockProperties>> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(anyhow!("backing store unavailable"));
        }
        if self.missing == Some(pos) {
            return Ok(None);
        }
        self.inner.block(pos)
    }

    fn set_block(&self, pos: BlockPos, block: &BlockProperties) -> anyhow::Result<()> {
        self.inner.set_block(pos, block)
    }
}

#[tokio::test]
async fn accessor_failures_surface_and_a_retry_repairs() {
    let inner = MemoryWorld::new(0, 64).with_sky_light(false);
    inner
        .set_block(BlockPos::new(5, 30, 5), &GLOWSTONE)
        .expect("in range");
    let world = Arc::new(FlakyWorld {
        inner,
        failing: AtomicBool::new(true),
        missing: None,
    });
    let engine = LightWorld::new(Arc::clone(&world));

    let err = engine
        .request_column_update(ORIGIN)
        .await
        .expect_err("reads fail");
    assert!(matches!(err, LightError::Accessor(_)));

    world.failing.store(false, Ordering::Relaxed);
    relight(&engine, &[ORIGIN]).await;
    assert_eq!(engine.block_light(BlockPos::new(5, 30, 8)), Some(12));
}

#[tokio::test]
async fn voxels_without_block_data_block_light() {
    let inner = MemoryWorld::new(0, 64).with_sky_light(false);
    inner
        .set_block(BlockPos::new(5, 30, 5), &GLOWSTONE)
        .expect("in range");
    let engine = LightWorld::new(Arc::new(FlakyWorld {
        inner,
        failing: AtomicBool::new(false),
        missing: Some(BlockPos::new(5, 30, 6)),
    }));
    relight(&engine, &[ORIGIN]).await;

    assert_eq!(engine.block_light(BlockPos::new(5, 30, 6)), Some(0));
    // Only the way around the gap is left.
    assert_eq!(engine.block_light(BlockPos::new(5, 30, 7)), Some(11));
    assert_eq!(engine.block_light(BlockPos::new(4, 30, 6)), Some(13));
}
