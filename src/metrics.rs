//! Opt-in timing hooks for a generation run.
//!
//! Timing is only collected when the `generation_metrics` feature is enabled.
//! Otherwise every call is a pass-through and [`GenerationMetrics::end`]
//! returns `None`.
//!
//! ```ignore
//! let mut metrics = GenerationMetrics::default();
//! metrics.begin();
//! let quotas = metrics.time(Phase::Distribution, || distribute(&areas, total));
//! if let Some(report) = metrics.end() {
//!     log::info!("distribution took {} ns", report.distribution_ns);
//! }
//! ```

/// Phases of point generation and analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Area-proportional quota split across meshes.
    Distribution,
    /// Round-robin face allocation, validator ray casts included.
    Allocation,
    /// Closest-point projection onto the true surface.
    Projection,
    /// Dependency extraction, ordering and triple grouping.
    Analysis,
}

/// Cumulative nanoseconds per phase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimingReport {
    pub distribution_ns: u64,
    pub allocation_ns: u64,
    pub projection_ns: u64,
    pub analysis_ns: u64,
}

impl TimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.distribution_ns
            .saturating_add(self.allocation_ns)
            .saturating_add(self.projection_ns)
            .saturating_add(self.analysis_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg(feature = "generation_metrics")]
    fn bucket_mut(&mut self, phase: Phase) -> &mut u64 {
        match phase {
            Phase::Distribution => &mut self.distribution_ns,
            Phase::Allocation => &mut self.allocation_ns,
            Phase::Projection => &mut self.projection_ns,
            Phase::Analysis => &mut self.analysis_ns,
        }
    }
}

/// Accumulator threaded through a generation run.
#[derive(Debug, Default)]
pub struct GenerationMetrics {
    #[cfg(feature = "generation_metrics")]
    report: TimingReport,
}

impl GenerationMetrics {
    pub fn begin(&mut self) {
        #[cfg(feature = "generation_metrics")]
        {
            self.report = TimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<TimingReport> {
        #[cfg(feature = "generation_metrics")]
        {
            Some(self.report.clone())
        }
        #[cfg(not(feature = "generation_metrics"))]
        {
            None
        }
    }

    /// Runs `f`, adding its wall time to `phase`.
    pub fn time<R>(&mut self, phase: Phase, f: impl FnOnce() -> R) -> R {
        #[cfg(feature = "generation_metrics")]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let bucket = self.report.bucket_mut(phase);
            *bucket = bucket.saturating_add(nanos);
            result
        }
        #[cfg(not(feature = "generation_metrics"))]
        {
            let _ = phase;
            f()
        }
    }
}
