// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-time statistics and the clock seam they are sampled through.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::Cell;

/// Maximum number of per-frame samples kept in each rolling window.
///
/// Bounds statistics memory for a long-running session; once full, the
/// oldest sample is evicted for each new one.
pub const MAX_STAT_SAMPLES: usize = 100;

/// Monotonic time source used to instrument the draw pass.
///
/// The scene never reads a clock directly; `Tree::draw` takes one as a
/// parameter, in keeping with the rest of the workspace's
/// explicit-context style. Hosts supply [`StdClock`]; tests supply
/// [`ManualClock`] for deterministic timings.
pub trait Clock {
    /// Current time in microseconds from an arbitrary fixed origin.
    ///
    /// Must be monotonically non-decreasing across calls.
    fn now_micros(&self) -> u64;
}

/// Monotonic clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Clone, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Creates a clock whose origin is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_micros(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Deterministic clock that advances by a fixed step per reading.
///
/// Every call to [`Clock::now_micros`] returns the current value and then
/// advances it, so successive readings are strictly increasing and
/// timing-derived assertions become exact.
#[derive(Debug)]
pub struct ManualClock {
    micros: Cell<u64>,
    step: u64,
}

impl ManualClock {
    /// Creates a clock starting at zero that advances `step` microseconds
    /// per reading.
    #[must_use]
    pub fn new(step: u64) -> Self {
        Self {
            micros: Cell::new(0),
            step,
        }
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        let now = self.micros.get();
        self.micros.set(now + self.step);
        now
    }
}

/// Integer mean of a sample slice; zero when empty.
fn average(samples: impl Iterator<Item = u64>) -> u64 {
    let mut sum: u128 = 0;
    let mut count: u128 = 0;
    for sample in samples {
        sum += u128::from(sample);
        count += 1;
    }
    if count == 0 {
        0
    } else {
        u64::try_from(sum / count).unwrap_or(u64::MAX)
    }
}

/// Per-frame branch timing, accumulated by the recursive draw.
///
/// Each recursive branch invocation contributes exactly one sample of its
/// *own* render time — the elapsed time minus time spent inside its
/// recursive sub-call — so a frame drawn with depth budget N yields
/// exactly N samples.
#[derive(Clone, Debug, Default)]
pub struct BranchStatistics {
    /// Own render time of the outermost branch instance (depth 0).
    pub first_branch_micros: u64,
    /// Own render time of the deepest branch instance drawn (depth N−1).
    pub last_branch_micros: u64,
    /// Own render time of every branch instance, in draw order.
    pub branch_micros: Vec<u64>,
    /// Number of branch instances drawn.
    pub num_branches: u32,
}

impl BranchStatistics {
    /// Creates an empty accumulator for one frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer mean of the per-instance own times; zero for an empty frame.
    #[must_use]
    pub fn average_branch_micros(&self) -> u64 {
        average(self.branch_micros.iter().copied())
    }
}

/// Rolling render statistics across frames.
///
/// Four windows, one sample per frame each, capped at
/// [`MAX_STAT_SAMPLES`] with oldest-first eviction: whole-tree render
/// time, first-branch own time, last-branch own time, and the frame's
/// average branch own time.
#[derive(Clone, Debug, Default)]
pub struct TreeStatistics {
    render_micros: VecDeque<u64>,
    first_branch_micros: VecDeque<u64>,
    last_branch_micros: VecDeque<u64>,
    avg_branch_micros: VecDeque<u64>,
}

impl TreeStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame's timings into the rolling windows.
    pub fn record(&mut self, render_micros: u64, frame: &BranchStatistics) {
        push_capped(&mut self.render_micros, render_micros);
        push_capped(&mut self.first_branch_micros, frame.first_branch_micros);
        push_capped(&mut self.last_branch_micros, frame.last_branch_micros);
        push_capped(&mut self.avg_branch_micros, frame.average_branch_micros());
    }

    /// Number of frames currently in the windows.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.render_micros.len()
    }

    /// Averaged view of the current windows.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples: self.samples(),
            avg_render_micros: average(self.render_micros.iter().copied()),
            avg_first_branch_micros: average(self.first_branch_micros.iter().copied()),
            avg_last_branch_micros: average(self.last_branch_micros.iter().copied()),
            avg_branch_micros: average(self.avg_branch_micros.iter().copied()),
        }
    }

    /// Drops all recorded samples.
    pub fn clear(&mut self) {
        self.render_micros.clear();
        self.first_branch_micros.clear();
        self.last_branch_micros.clear();
        self.avg_branch_micros.clear();
    }
}

fn push_capped(window: &mut VecDeque<u64>, sample: u64) {
    if window.len() == MAX_STAT_SAMPLES {
        window.pop_front();
    }
    window.push_back(sample);
}

/// Averaged statistics snapshot, as surfaced to the status display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Number of frames the averages cover.
    pub samples: usize,
    /// Average whole-tree render time.
    pub avg_render_micros: u64,
    /// Average own time of the outermost branch instance.
    pub avg_first_branch_micros: u64,
    /// Average own time of the deepest branch instance.
    pub avg_last_branch_micros: u64,
    /// Average of per-frame average branch own times.
    pub avg_branch_micros: u64,
}
