use std::time::{Duration, Instant};

/// Observational progress state for a long-running batch call. Purely
/// advisory: ticks recompute the estimate, but `completed` only moves on
/// confirmed step completion. The tracker never cancels or retries anything.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    pub completed: usize,
    pub total: usize,
    pub current_label: String,
    pub estimated_secs_remaining: u64,
    started_at: Instant,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            completed: 0,
            total: 0,
            current_label: String::new(),
            estimated_secs_remaining: 0,
            started_at: Instant::now(),
        }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the tracker for a fresh run of `total` units.
    pub fn begin(&mut self, total: usize, label: &str) {
        self.completed = 0;
        self.total = total;
        self.current_label = label.to_string();
        self.estimated_secs_remaining = 0;
        self.started_at = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn set_label(&mut self, label: &str) {
        self.current_label = label.to_string();
    }

    /// Timer tick: refresh the label and the remaining-time estimate from the
    /// elapsed wall time. Never advances `completed`.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.total == 0 || self.completed >= self.total {
            self.estimated_secs_remaining = 0;
            return;
        }
        let per_unit = elapsed.as_secs_f64() / self.completed.max(1) as f64;
        let remaining = (self.total - self.completed) as f64;
        self.estimated_secs_remaining = (remaining * per_unit).round() as u64;
        self.current_label = format!(
            "Processing chunk {} of {}...",
            self.completed + 1,
            self.total
        );
    }

    /// Confirmed completion of `completed` units, clamped to the total.
    pub fn finish(&mut self, completed: usize, label: &str) {
        self.completed = completed.min(self.total);
        self.current_label = label.to_string();
        self.estimated_secs_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_estimate_stays_in_bounds() {
        let mut tracker = ProgressTracker::new();
        tracker.begin(10, "start");
        tracker.tick(Duration::from_secs(4));
        // nothing completed yet: elapsed counts as the per-unit estimate
        assert_eq!(tracker.estimated_secs_remaining, 40);
        assert_eq!(tracker.completed, 0);

        tracker.completed = 5;
        tracker.tick(Duration::from_secs(10));
        assert_eq!(tracker.estimated_secs_remaining, 10);
    }

    #[test]
    fn estimate_is_zero_once_done() {
        let mut tracker = ProgressTracker::new();
        tracker.begin(3, "start");
        tracker.finish(3, "done");
        tracker.tick(Duration::from_secs(100));
        assert_eq!(tracker.estimated_secs_remaining, 0);
        assert_eq!(tracker.completed, 3);
    }

    #[test]
    fn ticks_never_advance_completion() {
        let mut tracker = ProgressTracker::new();
        tracker.begin(5, "start");
        for s in 1..20 {
            tracker.tick(Duration::from_secs(s));
            assert_eq!(tracker.completed, 0);
        }
        assert_eq!(tracker.current_label, "Processing chunk 1 of 5...");
    }

    #[test]
    fn finish_clamps_to_total() {
        let mut tracker = ProgressTracker::new();
        tracker.begin(4, "start");
        tracker.finish(9, "done");
        assert_eq!(tracker.completed, 4);
    }

    #[test]
    fn zero_total_never_divides() {
        let mut tracker = ProgressTracker::new();
        tracker.begin(0, "idle");
        tracker.tick(Duration::from_secs(3));
        assert_eq!(tracker.estimated_secs_remaining, 0);
    }
}
