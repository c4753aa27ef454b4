/// Instrumentation for the occlusion pipeline.
/// Counts hot-path calls so culling effectiveness can be inspected offline.
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for the occlusion hot path.
pub struct OcclusionCounters {
    // Orchestrator counters
    pub boxes_tested: AtomicU64,
    pub boxes_drawn: AtomicU64,

    // Rasterizer counters
    pub quads_tested: AtomicU64,
    pub quads_drawn: AtomicU64,
    pub spans_filled: AtomicU64,
    pub raster_clears: AtomicU64,
}

impl OcclusionCounters {
    pub const fn new() -> Self {
        Self {
            boxes_tested: AtomicU64::new(0),
            boxes_drawn: AtomicU64::new(0),
            quads_tested: AtomicU64::new(0),
            quads_drawn: AtomicU64::new(0),
            spans_filled: AtomicU64::new(0),
            raster_clears: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.boxes_tested.store(0, Ordering::Relaxed);
        self.boxes_drawn.store(0, Ordering::Relaxed);
        self.quads_tested.store(0, Ordering::Relaxed);
        self.quads_drawn.store(0, Ordering::Relaxed);
        self.spans_filled.store(0, Ordering::Relaxed);
        self.raster_clears.store(0, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            boxes_tested: self.boxes_tested.load(Ordering::Relaxed),
            boxes_drawn: self.boxes_drawn.load(Ordering::Relaxed),
            quads_tested: self.quads_tested.load(Ordering::Relaxed),
            quads_drawn: self.quads_drawn.load(Ordering::Relaxed),
            spans_filled: self.spans_filled.load(Ordering::Relaxed),
            raster_clears: self.raster_clears.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy)]
pub struct CounterSnapshot {
    pub boxes_tested: u64,
    pub boxes_drawn: u64,
    pub quads_tested: u64,
    pub quads_drawn: u64,
    pub spans_filled: u64,
    pub raster_clears: u64,
}

impl CounterSnapshot {
    /// Print formatted report
    pub fn print_report(&self) {
        println!("\n=== Occlusion Counters Report ===");
        println!("\nBox Operations:");
        println!("  boxes tested:    {:12}", self.boxes_tested);
        println!("  boxes drawn:     {:12}", self.boxes_drawn);

        println!("\nRaster Operations:");
        println!("  quads tested:    {:12}", self.quads_tested);
        println!("  quads drawn:     {:12}", self.quads_drawn);
        println!("  spans filled:    {:12}", self.spans_filled);
        println!("  raster clears:   {:12}", self.raster_clears);

        if self.boxes_tested > 0 {
            let quads_per_box = self.quads_tested as f64 / self.boxes_tested as f64;
            println!("\n  quads per box test: {:9.2}", quads_per_box);
        }

        println!();
    }
}

/// Global occlusion counters instance
pub static COUNTERS: OcclusionCounters = OcclusionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
