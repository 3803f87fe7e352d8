/// Share of `total` covered by `elapsed`, as a percentage in `[0, 100]`.
///
/// `total` must be positive; callers skip presentation entirely when there
/// is nothing to wait for.
pub fn percent_of(elapsed: f64, total: f64) -> f64 {
    debug_assert!(total > 0.0, "percent_of called without any wait time");
    (elapsed / total * 100.0).clamp(0.0, 100.0)
}

/// Frame of a non-looping sequence that matches `percent`.
pub fn frame_index_of(percent: f64, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let last = (frame_count - 1) as f64;
    (percent / 100.0 * last).round().clamp(0.0, last) as usize
}

/// Elapsed wait time of one run.
///
/// Time is counted in whole ticks so repeated additions never drift below
/// the configured total.
#[derive(Debug, Clone)]
pub struct ProgressState {
    total_seconds: f64,
    tick_seconds: f64,
    ticks: u64,
}

impl ProgressState {
    pub fn new(total_seconds: f64, tick_seconds: f64) -> Self {
        Self { total_seconds, tick_seconds, ticks: 0 }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.ticks as f64 * self.tick_seconds
    }

    pub fn percent(&self) -> f64 {
        if self.total_seconds > 0.0 {
            percent_of(self.elapsed_seconds(), self.total_seconds)
        } else {
            0.0
        }
    }

    /// Count one more tick and return the new percentage.
    pub fn advance(&mut self) -> f64 {
        self.ticks += 1;
        self.percent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(5.0, 10.0), 50.0);
        assert_eq!(percent_of(0.0, 10.0), 0.0);
        assert_eq!(percent_of(10.0, 10.0), 100.0);
        assert_eq!(percent_of(15.0, 10.0), 100.0);
    }

    #[test]
    fn test_frame_index_of() {
        assert_eq!(frame_index_of(0.0, 5), 0);
        assert_eq!(frame_index_of(100.0, 5), 4);
        assert_eq!(frame_index_of(50.0, 5), 2);
        assert_eq!(frame_index_of(150.0, 5), 4);
        assert_eq!(frame_index_of(-10.0, 5), 0);
        assert_eq!(frame_index_of(42.0, 1), 0);
        assert_eq!(frame_index_of(42.0, 0), 0);
    }

    #[test]
    fn test_progress_state_reaches_total_exactly() {
        let mut state = ProgressState::new(2.0, 0.1);
        let mut last = 0.0;
        for _ in 0..20 {
            let percent = state.advance();
            assert!(percent >= last);
            assert!(percent <= 100.0);
            last = percent;
        }
        assert_eq!(last, 100.0);
        assert_eq!(state.elapsed_seconds(), 2.0);
    }

    #[test]
    fn test_progress_state_clamps_overshoot() {
        let mut state = ProgressState::new(0.25, 0.1);
        state.advance();
        state.advance();
        assert_eq!(state.advance(), 100.0);
    }
}
