//! Performance counters of a `LightWorld`.

use std::{
    fmt::{self, Display},
    time::Duration,
};

use rustc_hash::FxHashMap;

/// Relighting a whole column.
pub const COLUMN_UPDATE: &str = "column_update";
/// Applying staged block changes.
pub const BLOCK_UPDATE: &str = "block_update";
/// One increase pass.
pub const INCREASE: &str = "increase";
/// One decrease pass.
pub const DECREASE: &str = "decrease";
/// Seeding sky light into a column.
pub const SKY_INIT: &str = "sky_init";

/// Calls and cumulative time of one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    /// How often the operation ran.
    pub calls: u64,
    /// Total time spent in it.
    pub total: Duration,
}

impl OperationStats {
    /// Mean time per call.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / u32::try_from(self.calls).unwrap_or(u32::MAX)
        }
    }
}

/// Counters collected while the engine runs.
#[derive(Debug, Clone, Default)]
pub struct LightStats {
    operations: FxHashMap<&'static str, OperationStats>,
    /// Column requests resolved as cancelled.
    pub cancelled_jobs: u64,
    /// Voxels popped from propagation queues.
    pub voxels_visited: u64,
}

impl LightStats {
    /// Adds one call of `operation` that took `elapsed`.
    pub fn record(&mut self, operation: &'static str, elapsed: Duration) {
        let entry = self.operations.entry(operation).or_default();
        entry.calls += 1;
        entry.total += elapsed;
    }

    /// Counters of one operation.
    #[must_use]
    pub fn operation(&self, operation: &str) -> Option<OperationStats> {
        self.operations.get(operation).copied()
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Display for LightStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.operations.keys().copied().collect();
        names.sort_unstable();
        writeln!(f, "Light engine statistics:")?;
        for name in names {
            let stats = self.operations[name];
            writeln!(
                f,
                "  {name:<14} {:>8} calls {:>12.3?} total {:>10.3?} avg",
                stats.calls,
                stats.total,
                stats.average()
            )?;
        }
        writeln!(f, "  cancelled jobs {:>8}", self.cancelled_jobs)?;
        write!(f, "  voxels visited {:>8}", self.voxels_visited)
    }
}
