//! Wall-clock timing of a run: step time, throughput and remaining time.

use std::time::{Duration, Instant};

use tracing::info;

/// Tracks progress through a run of `total_steps` steps over `cells` cells.
#[derive(Debug, Clone)]
pub struct Timer {
    total_steps: usize,
    cells: u64,
    start: Option<Instant>,
    last: Option<(usize, Instant)>,
}

/// Progress at one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerReport {
    pub step: usize,
    pub total_steps: usize,

    /// Time since the timer started.
    pub elapsed: Duration,

    /// Mean wall time of the steps since the previous update.
    pub step_time: Duration,

    /// Million lattice cell updates per second since the previous update.
    pub mlups: f64,

    /// Estimated time to finish, once at least one step has run.
    pub eta: Option<Duration>,
}

/// Totals reported when the timer stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSummary {
    pub steps: usize,
    pub elapsed: Duration,
    pub mlups: f64,
}

impl Timer {
    #[must_use]
    pub fn new(total_steps: usize, cells: u64) -> Self {
        Self {
            total_steps,
            cells,
            start: None,
            last: None,
        }
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    #[must_use]
    pub fn cells(&self) -> u64 {
        self.cells
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Starts the timer at `now`, before step 0.
    pub fn start_at(&mut self, now: Instant) {
        self.start = Some(now);
        self.last = Some((0, now));
    }

    /// Records that steps up to and including `step` are done.
    ///
    /// An update on a stopped timer starts it.
    pub fn update(&mut self, step: usize) -> TimerReport {
        self.update_at(step, Instant::now())
    }

    pub fn update_at(&mut self, step: usize, now: Instant) -> TimerReport {
        let start = *self.start.get_or_insert(now);
        let (last_step, last_time) = self.last.unwrap_or((0, start));
        self.last = Some((step + 1, now));

        let done = step + 1;
        let elapsed = now.saturating_duration_since(start);
        let interval = now.saturating_duration_since(last_time);
        let stepped = done.saturating_sub(last_step);

        let step_time = u32::try_from(stepped)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| interval / n);
        let eta = u32::try_from(done).ok().filter(|&n| n > 0).map(|n| {
            let remaining = self.total_steps.saturating_sub(done);
            (elapsed / n).saturating_mul(u32::try_from(remaining).unwrap_or(u32::MAX))
        });

        TimerReport {
            step,
            total_steps: self.total_steps,
            elapsed,
            step_time,
            mlups: mlups(self.cells, stepped, interval),
            eta,
        }
    }

    /// Stops the timer after `steps` steps and returns the totals.
    ///
    /// Returns `None` if the timer never started.
    pub fn stop(&mut self, steps: usize) -> Option<TimerSummary> {
        self.stop_at(steps, Instant::now())
    }

    pub fn stop_at(&mut self, steps: usize, now: Instant) -> Option<TimerSummary> {
        let start = self.start.take()?;
        self.last = None;
        let elapsed = now.saturating_duration_since(start);
        Some(TimerSummary {
            steps,
            elapsed,
            mlups: mlups(self.cells, steps, elapsed),
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn mlups(cells: u64, steps: usize, interval: Duration) -> f64 {
    let seconds = interval.as_secs_f64();
    if seconds > 0.0 {
        cells as f64 * steps as f64 / seconds / 1e6
    } else {
        0.0
    }
}

impl TimerReport {
    /// Logs the report as one console line.
    pub fn log(&self) {
        let eta = self
            .eta
            .map_or_else(|| "-".to_owned(), |eta| format!("{:.1}s", eta.as_secs_f64()));
        info!(
            "step={}/{}; elapsed={:.3}s; step time={:.3e}s; MLUPs={:.3}; eta={eta}",
            self.step,
            self.total_steps,
            self.elapsed.as_secs_f64(),
            self.step_time.as_secs_f64(),
            self.mlups,
        );
    }
}

impl TimerSummary {
    pub fn log(&self) {
        info!("----------------- timer summary -----------------");
        info!("{:<24}= {}", "steps", self.steps);
        info!("{:<24}= {:.3}s", "elapsed", self.elapsed.as_secs_f64());
        info!("{:<24}= {:.3}", "average MLUPs", self.mlups);
        info!("-------------------------------------------------");
    }
}
